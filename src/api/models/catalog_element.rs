use super::entity::Entity;
use super::fields::{CommonFields, insert_opt, null_as_default};
use crate::api::constants::Resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An element of a catalog (list). Addressed through its catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogElement {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub catalog_id: Option<u64>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    /// Elements use `custom_fields`, not `custom_fields_values`
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_fields: Vec<Value>,
}

impl CatalogElement {
    pub fn new(catalog_id: u64, name: impl Into<String>) -> Self {
        let mut element = Self {
            catalog_id: Some(catalog_id),
            ..Default::default()
        };
        element.common.name = Some(name.into());
        element
    }
}

impl Entity for CatalogElement {
    fn resource(&self) -> Resource {
        Resource::CatalogElements
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn container_id(&self) -> Option<u64> {
        self.catalog_id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        self.common.write_params(&mut params);
        insert_opt(&mut params, "catalog_id", &self.catalog_id);
        insert_opt(&mut params, "is_deleted", &self.is_deleted);
        if !self.custom_fields.is_empty() {
            params.insert(
                "custom_fields".to_string(),
                Value::Array(self.custom_fields.clone()),
            );
        }
        params
    }
}
