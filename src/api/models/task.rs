use super::entity::Entity;
use super::fields::{CommonFields, insert_opt};
use crate::api::constants::Resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    pub common: CommonFields,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub complete_till: Option<i64>,
    #[serde(default)]
    pub entity_id: Option<u64>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub task_type_id: Option<u64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

impl Task {
    pub fn new(text: impl Into<String>, complete_till: i64) -> Self {
        Self {
            text: Some(text.into()),
            complete_till: Some(complete_till),
            ..Default::default()
        }
    }

    /// Attach the task to an entity
    pub fn for_entity(mut self, entity_type: impl Into<String>, entity_id: u64) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id);
        self
    }
}

impl Entity for Task {
    fn resource(&self) -> Resource {
        Resource::Tasks
    }

    fn id(&self) -> Option<u64> {
        self.common.id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        self.common.write_params(&mut params);
        insert_opt(&mut params, "text", &self.text);
        insert_opt(&mut params, "complete_till", &self.complete_till);
        insert_opt(&mut params, "entity_id", &self.entity_id);
        insert_opt(&mut params, "entity_type", &self.entity_type);
        insert_opt(&mut params, "task_type_id", &self.task_type_id);
        insert_opt(&mut params, "is_completed", &self.is_completed);
        params
    }
}
