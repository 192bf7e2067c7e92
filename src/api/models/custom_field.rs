use super::entity::Entity;
use super::fields::{CommonFields, insert_opt, null_as_default};
use crate::api::constants::{EntityType, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Definition of a custom field of some entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub sort: Option<i64>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub enums: Vec<Value>,
}

impl CustomField {
    pub fn new(entity: EntityType, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let mut field = Self {
            field_type: Some(field_type.into()),
            entity_type: Some(entity.as_str().to_string()),
            ..Default::default()
        };
        field.common.name = Some(name.into());
        field
    }

    /// Owning entity type; leads when unknown
    pub fn entity(&self) -> EntityType {
        self.entity_type
            .as_deref()
            .and_then(EntityType::parse)
            .unwrap_or(EntityType::Leads)
    }

    /// Append a select option, sorted after the existing ones
    pub fn add_enum(&mut self, value: impl Into<String>) -> &mut Self {
        let sort = self.enums.len();
        self.enums.push(json!({ "value": value.into(), "sort": sort }));
        self
    }
}

impl Entity for CustomField {
    fn resource(&self) -> Resource {
        Resource::CustomFields(self.entity())
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        insert_opt(&mut params, "id", &self.common.id);
        insert_opt(&mut params, "name", &self.common.name);
        insert_opt(&mut params, "code", &self.code);
        insert_opt(&mut params, "type", &self.field_type);
        insert_opt(&mut params, "sort", &self.sort);
        if !self.enums.is_empty() {
            params.insert("enums".to_string(), Value::Array(self.enums.clone()));
        }
        params
    }

    fn stamps_updated_at(&self) -> bool {
        false
    }
}
