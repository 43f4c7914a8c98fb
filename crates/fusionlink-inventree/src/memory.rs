//! In-memory registry double for tests
//!
//! Behaves like a small InvenTree server: parts, parameters, templates, and
//! BOM lines live in maps, primary keys are handed out sequentially, and
//! every mutating call is counted so tests can assert on traffic.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use fusionlink_core::ApiError;

use crate::model::{
    BomItem, NewPart, Parameter, ParameterTemplate, Part, PartCategory, PartFields, PartPk,
};
use crate::registry::PartRegistry;

#[derive(Default)]
struct State {
    next_pk: i64,
    parts: HashMap<PartPk, Part>,
    parameters: HashMap<i64, Parameter>,
    bom_items: HashMap<i64, BomItem>,
    templates: HashMap<i64, ParameterTemplate>,
    categories: Vec<PartCategory>,
}

impl State {
    fn next(&mut self) -> i64 {
        self.next_pk += 1;
        self.next_pk
    }
}

/// Call counters, snapshot via [`InMemoryRegistry::counters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub create_part: usize,
    pub update_part: usize,
    pub create_bom_item: usize,
    pub delete_bom_item: usize,
    pub create_parameter: usize,
    pub update_parameter: usize,
    pub create_template: usize,
}

/// In-memory [`PartRegistry`] implementation
#[derive(Default)]
pub struct InMemoryRegistry {
    state: Mutex<State>,
    counters: Mutex<CallCounters>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a part directly, returning its primary key
    pub fn insert_part(&self, name: &str, ipn: &str) -> PartPk {
        let mut state = self.state.lock();
        let pk = PartPk(state.next());
        state.parts.insert(
            pk,
            Part {
                pk,
                name: name.to_string(),
                ipn: ipn.to_string(),
                description: String::new(),
                assembly: false,
                active: true,
                category: None,
            },
        );
        pk
    }

    /// Seed a parameter value directly
    pub fn insert_parameter(&self, part: PartPk, template: i64, data: &str) {
        let mut state = self.state.lock();
        let pk = state.next();
        state.parameters.insert(
            pk,
            Parameter {
                pk,
                part,
                template,
                data: data.to_string(),
            },
        );
    }

    /// Seed a category directly
    pub fn insert_category(&self, name: &str) -> i64 {
        let mut state = self.state.lock();
        let pk = state.next();
        state.categories.push(PartCategory {
            pk,
            name: name.to_string(),
            pathstring: name.to_string(),
        });
        pk
    }

    /// Current state of one part
    pub fn part(&self, pk: PartPk) -> Option<Part> {
        self.state.lock().parts.get(&pk).cloned()
    }

    /// All parts, sorted by primary key
    pub fn all_parts(&self) -> Vec<Part> {
        let state = self.state.lock();
        let mut parts: Vec<Part> = state.parts.values().cloned().collect();
        parts.sort_by_key(|p| p.pk);
        parts
    }

    /// BOM lines of one part, sorted by sub-part
    pub fn bom_of(&self, part: PartPk) -> Vec<BomItem> {
        let state = self.state.lock();
        let mut items: Vec<BomItem> = state
            .bom_items
            .values()
            .filter(|b| b.part == part)
            .cloned()
            .collect();
        items.sort_by_key(|b| b.sub_part);
        items
    }

    /// Parameter value stored under one template for one part
    pub fn parameter_value(&self, part: PartPk, template: i64) -> Option<String> {
        self.state
            .lock()
            .parameters
            .values()
            .find(|p| p.part == part && p.template == template)
            .map(|p| p.data.clone())
    }

    /// Snapshot of the call counters
    pub fn counters(&self) -> CallCounters {
        *self.counters.lock()
    }
}

#[async_trait]
impl PartRegistry for InMemoryRegistry {
    async fn find_by_parameter(
        &self,
        template: i64,
        value: &str,
    ) -> Result<Vec<PartPk>, ApiError> {
        let state = self.state.lock();
        let mut pks: Vec<PartPk> = state
            .parameters
            .values()
            .filter(|p| p.template == template && p.data == value)
            .map(|p| p.part)
            .collect();
        pks.sort();
        Ok(pks)
    }

    async fn find_by_ipn(&self, ipn: &str) -> Result<Vec<Part>, ApiError> {
        let state = self.state.lock();
        let mut parts: Vec<Part> = state
            .parts
            .values()
            .filter(|p| p.ipn == ipn)
            .cloned()
            .collect();
        parts.sort_by_key(|p| p.pk);
        Ok(parts)
    }

    async fn create_part(&self, part: &NewPart) -> Result<Part, ApiError> {
        self.counters.lock().create_part += 1;
        let mut state = self.state.lock();
        let pk = PartPk(state.next());
        let stored = Part {
            pk,
            name: part.name.clone(),
            ipn: part.ipn.clone(),
            description: part.description.clone(),
            assembly: false,
            active: part.active,
            category: part.category,
        };
        state.parts.insert(pk, stored.clone());
        Ok(stored)
    }

    async fn update_part(&self, pk: PartPk, fields: &PartFields) -> Result<Part, ApiError> {
        self.counters.lock().update_part += 1;
        let mut state = self.state.lock();
        let part = state.parts.get_mut(&pk).ok_or_else(|| ApiError::NotFound {
            what: format!("part {}", pk),
        })?;
        if let Some(name) = &fields.name {
            part.name = name.clone();
        }
        if let Some(ipn) = &fields.ipn {
            part.ipn = ipn.clone();
        }
        if let Some(description) = &fields.description {
            part.description = description.clone();
        }
        if let Some(assembly) = fields.assembly {
            part.assembly = assembly;
        }
        if let Some(category) = fields.category {
            part.category = Some(category);
        }
        Ok(part.clone())
    }

    async fn get_part(&self, pk: PartPk) -> Result<Part, ApiError> {
        self.state
            .lock()
            .parts
            .get(&pk)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                what: format!("part {}", pk),
            })
    }

    async fn list_bom_items(&self, part: PartPk) -> Result<Vec<BomItem>, ApiError> {
        Ok(self.bom_of(part))
    }

    async fn delete_bom_item(&self, pk: i64) -> Result<(), ApiError> {
        self.counters.lock().delete_bom_item += 1;
        let mut state = self.state.lock();
        state
            .bom_items
            .remove(&pk)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound {
                what: format!("bom item {}", pk),
            })
    }

    async fn create_bom_item(
        &self,
        part: PartPk,
        sub_part: PartPk,
        quantity: f64,
    ) -> Result<BomItem, ApiError> {
        self.counters.lock().create_bom_item += 1;
        let mut state = self.state.lock();
        let pk = state.next();
        let item = BomItem {
            pk,
            part,
            sub_part,
            quantity,
        };
        state.bom_items.insert(pk, item.clone());
        Ok(item)
    }

    async fn list_parameters(&self, part: PartPk) -> Result<Vec<Parameter>, ApiError> {
        let state = self.state.lock();
        let mut rows: Vec<Parameter> = state
            .parameters
            .values()
            .filter(|p| p.part == part)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.pk);
        Ok(rows)
    }

    async fn create_parameter(
        &self,
        part: PartPk,
        template: i64,
        data: &str,
    ) -> Result<Parameter, ApiError> {
        self.counters.lock().create_parameter += 1;
        let mut state = self.state.lock();
        let pk = state.next();
        let row = Parameter {
            pk,
            part,
            template,
            data: data.to_string(),
        };
        state.parameters.insert(pk, row.clone());
        Ok(row)
    }

    async fn update_parameter(&self, pk: i64, data: &str) -> Result<Parameter, ApiError> {
        self.counters.lock().update_parameter += 1;
        let mut state = self.state.lock();
        let row = state
            .parameters
            .get_mut(&pk)
            .ok_or_else(|| ApiError::NotFound {
                what: format!("parameter {}", pk),
            })?;
        row.data = data.to_string();
        Ok(row.clone())
    }

    async fn list_templates(&self) -> Result<Vec<ParameterTemplate>, ApiError> {
        let state = self.state.lock();
        let mut templates: Vec<ParameterTemplate> =
            state.templates.values().cloned().collect();
        templates.sort_by_key(|t| t.pk);
        Ok(templates)
    }

    async fn create_template(
        &self,
        name: &str,
        units: &str,
    ) -> Result<ParameterTemplate, ApiError> {
        self.counters.lock().create_template += 1;
        let mut state = self.state.lock();
        let pk = state.next();
        let template = ParameterTemplate {
            pk,
            name: name.to_string(),
            units: units.to_string(),
        };
        state.templates.insert(pk, template.clone());
        Ok(template)
    }

    async fn find_category(&self, name: &str) -> Result<Option<PartCategory>, ApiError> {
        Ok(self
            .state
            .lock()
            .categories
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }
}
