use super::entity::Entity;
use super::fields::{CommonFields, insert_opt};
use crate::api::constants::{EntityType, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Note types whose text travels in `params.text`
const TEXT_NOTE_TYPES: [&str; 3] = ["common", "sms_in", "sms_out"];

/// A note attached to a lead, contact, company or customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    pub common: CommonFields,
    /// Entity type owning the note; selects the endpoint
    #[serde(skip, default = "default_parent")]
    pub parent: EntityType,
    #[serde(default)]
    pub entity_id: Option<u64>,
    #[serde(default)]
    pub note_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_editable: Option<bool>,
}

fn default_parent() -> EntityType {
    EntityType::Leads
}

impl Default for Note {
    fn default() -> Self {
        Self {
            common: CommonFields::default(),
            parent: default_parent(),
            entity_id: None,
            note_type: None,
            text: None,
            is_editable: None,
        }
    }
}

impl Note {
    /// Plain text note on an entity
    pub fn common(parent: EntityType, entity_id: u64, text: impl Into<String>) -> Self {
        Self {
            parent,
            entity_id: Some(entity_id),
            note_type: Some("common".to_string()),
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

impl Entity for Note {
    fn resource(&self) -> Resource {
        Resource::Notes(self.parent)
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        self.common.write_params(&mut params);
        insert_opt(&mut params, "is_editable", &self.is_editable);
        insert_opt(&mut params, "entity_id", &self.entity_id);
        insert_opt(&mut params, "text", &self.text);
        insert_opt(&mut params, "note_type", &self.note_type);

        let carries_text = self
            .note_type
            .as_deref()
            .is_some_and(|kind| TEXT_NOTE_TYPES.contains(&kind));
        if carries_text {
            params.insert("params".to_string(), json!({ "text": self.text }));
        }
        params
    }
}
