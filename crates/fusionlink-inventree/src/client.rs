//! HTTP client for the InvenTree REST API
//!
//! Token-authenticated JSON client over `reqwest`. All endpoints live under
//! the server's `/api/` prefix and use trailing slashes, matching the
//! server's router.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use fusionlink_core::ApiError;

use crate::model::{
    BomItem, NewBomItem, NewParameter, NewPart, Parameter, ParameterTemplate, Part,
    PartCategory, PartFields, PartPk,
};
use crate::registry::PartRegistry;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one InvenTree server
pub struct InvenTreeClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl std::fmt::Debug for InvenTreeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token must not leak into logs.
        f.debug_struct("InvenTreeClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl InvenTreeClient {
    /// Create a client for `address` authenticating with `token`
    ///
    /// `address` is the server root, e.g. `http://inventree.local:8000`.
    pub fn new(address: &str, token: &str) -> Result<Self, ApiError> {
        Self::with_timeout(address, token, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout
    pub fn with_timeout(
        address: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base = Url::parse(address)
            .and_then(|url| url.join("api/"))
            .map_err(|_| ApiError::InvalidUrl {
                url: address.to_string(),
            })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                reason: e.to_string(),
            })?;
        Ok(Self {
            http,
            base,
            token: token.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base.join(path).map_err(|_| ApiError::InvalidUrl {
            url: format!("{}{}", self.base, path),
        })
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&impl Serialize>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", format!("Token {}", self.token))
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| ApiError::Transport {
            reason: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(map_error(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            reason: e.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, query, None::<&()>).await
    }
}

/// Map a non-success response to an [`ApiError`]
fn map_error(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
        StatusCode::NOT_FOUND => ApiError::NotFound {
            what: body_summary(body),
        },
        StatusCode::BAD_REQUEST => {
            // The server reports validation rejects as {"field": ["msg", ...]}
            if let Ok(fields) =
                serde_json::from_str::<BTreeMap<String, Vec<String>>>(body)
            {
                return ApiError::Validation { fields };
            }
            ApiError::Status {
                status: status.as_u16(),
                body: body_summary(body),
            }
        }
        _ => ApiError::Status {
            status: status.as_u16(),
            body: body_summary(body),
        },
    }
}

fn body_summary(body: &str) -> String {
    const LIMIT: usize = 512;
    if body.len() > LIMIT {
        let mut end = LIMIT;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[async_trait]
impl PartRegistry for InvenTreeClient {
    async fn find_by_parameter(
        &self,
        template: i64,
        value: &str,
    ) -> Result<Vec<PartPk>, ApiError> {
        // The parameter list endpoint cannot filter by value, so fetch every
        // row for the template and scan.
        let rows: Vec<Parameter> = self
            .get("part/parameter/", &[("template", template.to_string())])
            .await?;
        Ok(rows
            .into_iter()
            .filter(|p| p.data == value)
            .map(|p| p.part)
            .collect())
    }

    async fn find_by_ipn(&self, ipn: &str) -> Result<Vec<Part>, ApiError> {
        self.get("part/", &[("IPN", ipn.to_string())]).await
    }

    async fn create_part(&self, part: &NewPart) -> Result<Part, ApiError> {
        self.request(Method::POST, "part/", &[], Some(part)).await
    }

    async fn update_part(&self, pk: PartPk, fields: &PartFields) -> Result<Part, ApiError> {
        self.request(Method::PATCH, &format!("part/{}/", pk), &[], Some(fields))
            .await
    }

    async fn get_part(&self, pk: PartPk) -> Result<Part, ApiError> {
        self.get(&format!("part/{}/", pk), &[]).await
    }

    async fn list_bom_items(&self, part: PartPk) -> Result<Vec<BomItem>, ApiError> {
        self.get("bom/", &[("part", part.to_string())]).await
    }

    async fn delete_bom_item(&self, pk: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("bom/{}/", pk))?;
        let response = self
            .http
            .delete(url)
            .header("Authorization", format!("Token {}", self.token))
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                reason: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(map_error(status, &text));
        }
        Ok(())
    }

    async fn create_bom_item(
        &self,
        part: PartPk,
        sub_part: PartPk,
        quantity: f64,
    ) -> Result<BomItem, ApiError> {
        let payload = NewBomItem {
            part,
            sub_part,
            quantity,
        };
        self.request(Method::POST, "bom/", &[], Some(&payload)).await
    }

    async fn list_parameters(&self, part: PartPk) -> Result<Vec<Parameter>, ApiError> {
        self.get("part/parameter/", &[("part", part.to_string())])
            .await
    }

    async fn create_parameter(
        &self,
        part: PartPk,
        template: i64,
        data: &str,
    ) -> Result<Parameter, ApiError> {
        let payload = NewParameter {
            part,
            template,
            data: data.to_string(),
        };
        self.request(Method::POST, "part/parameter/", &[], Some(&payload))
            .await
    }

    async fn update_parameter(&self, pk: i64, data: &str) -> Result<Parameter, ApiError> {
        let payload = serde_json::json!({ "data": data });
        self.request(
            Method::PATCH,
            &format!("part/parameter/{}/", pk),
            &[],
            Some(&payload),
        )
        .await
    }

    async fn list_templates(&self) -> Result<Vec<ParameterTemplate>, ApiError> {
        self.get("part/parameter/template/", &[]).await
    }

    async fn create_template(
        &self,
        name: &str,
        units: &str,
    ) -> Result<ParameterTemplate, ApiError> {
        let payload = serde_json::json!({ "name": name, "units": units });
        self.request(Method::POST, "part/parameter/template/", &[], Some(&payload))
            .await
    }

    async fn find_category(&self, name: &str) -> Result<Option<PartCategory>, ApiError> {
        let categories: Vec<PartCategory> = self
            .get("part/category/", &[("name", name.to_string())])
            .await?;
        Ok(categories.into_iter().find(|c| c.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_under_api() {
        let client = InvenTreeClient::new("http://inventree.local:8000", "t0k3n").unwrap();
        assert_eq!(
            client.endpoint("part/").unwrap().as_str(),
            "http://inventree.local:8000/api/part/"
        );
        assert_eq!(
            client.endpoint("part/parameter/template/").unwrap().as_str(),
            "http://inventree.local:8000/api/part/parameter/template/"
        );
    }

    #[test]
    fn test_debug_output_omits_token() {
        let client = InvenTreeClient::new("http://inventree.local:8000", "s3cret").unwrap();
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("inventree.local"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let err = InvenTreeClient::new("not a url", "t").expect_err("must reject");
        assert!(matches!(err, ApiError::InvalidUrl { .. }));
    }

    #[test]
    fn test_validation_body_mapped_to_fields() {
        let err = map_error(
            StatusCode::BAD_REQUEST,
            r#"{"IPN": ["Part with this IPN already exists."]}"#,
        );
        match err {
            ApiError::Validation { fields } => {
                assert_eq!(
                    fields["IPN"],
                    vec!["Part with this IPN already exists.".to_string()]
                );
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_auth_failure_mapped() {
        assert!(matches!(
            map_error(StatusCode::FORBIDDEN, "denied"),
            ApiError::Unauthorized
        ));
        match map_error(StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
