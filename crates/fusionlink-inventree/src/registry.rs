//! Part registry abstraction
//!
//! The synchronizer talks to the part registry only through this trait, so
//! the live HTTP client and the in-memory test double are interchangeable.

use async_trait::async_trait;

use fusionlink_core::ApiError;

use crate::model::{
    BomItem, NewPart, Parameter, ParameterTemplate, Part, PartCategory, PartFields, PartPk,
};

/// Operations FusionLink performs against a part registry
///
/// All lookups are exact-match. `find_by_ipn` must never be called with an
/// empty part number; callers decide what an empty IPN means.
#[async_trait]
pub trait PartRegistry: Send + Sync {
    /// Parts whose parameter under `template` stores exactly `value`
    async fn find_by_parameter(
        &self,
        template: i64,
        value: &str,
    ) -> Result<Vec<PartPk>, ApiError>;

    /// Parts whose internal part number is exactly `ipn`
    async fn find_by_ipn(&self, ipn: &str) -> Result<Vec<Part>, ApiError>;

    /// Create a part, returning the stored record
    async fn create_part(&self, part: &NewPart) -> Result<Part, ApiError>;

    /// Patch a part with the fields set in `fields`
    async fn update_part(&self, pk: PartPk, fields: &PartFields) -> Result<Part, ApiError>;

    /// Fetch one part by primary key
    async fn get_part(&self, pk: PartPk) -> Result<Part, ApiError>;

    /// BOM lines of the given assembly part
    async fn list_bom_items(&self, part: PartPk) -> Result<Vec<BomItem>, ApiError>;

    /// Delete one BOM line
    async fn delete_bom_item(&self, pk: i64) -> Result<(), ApiError>;

    /// Add a BOM line to an assembly
    async fn create_bom_item(
        &self,
        part: PartPk,
        sub_part: PartPk,
        quantity: f64,
    ) -> Result<BomItem, ApiError>;

    /// Parameter values attached to one part
    async fn list_parameters(&self, part: PartPk) -> Result<Vec<Parameter>, ApiError>;

    /// Attach a new parameter value to a part
    async fn create_parameter(
        &self,
        part: PartPk,
        template: i64,
        data: &str,
    ) -> Result<Parameter, ApiError>;

    /// Overwrite the value of an existing parameter row
    async fn update_parameter(&self, pk: i64, data: &str) -> Result<Parameter, ApiError>;

    /// All parameter templates defined on the server
    async fn list_templates(&self) -> Result<Vec<ParameterTemplate>, ApiError>;

    /// Define a new parameter template
    async fn create_template(
        &self,
        name: &str,
        units: &str,
    ) -> Result<ParameterTemplate, ApiError>;

    /// Look up a part category by name, if it exists
    async fn find_category(&self, name: &str) -> Result<Option<PartCategory>, ApiError>;

    /// Set a parameter on a part, creating or overwriting as needed
    ///
    /// Writes are independent: an existing row with the right value is left
    /// untouched.
    async fn set_parameter(
        &self,
        part: PartPk,
        template: i64,
        data: &str,
    ) -> Result<(), ApiError> {
        let existing = self.list_parameters(part).await?;
        match existing.iter().find(|p| p.template == template) {
            Some(row) if row.data == data => Ok(()),
            Some(row) => {
                self.update_parameter(row.pk, data).await?;
                Ok(())
            }
            None => {
                self.create_parameter(part, template, data).await?;
                Ok(())
            }
        }
    }
}
