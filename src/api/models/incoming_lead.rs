use super::entity::Entity;
use super::fields::insert_opt;
use crate::api::constants::Resource;
use crate::api::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An unsorted (incoming) lead submitted from a form. Always created, never updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomingLead {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub source_uid: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub pipeline_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub metadata: Option<Value>,
    /// Leads, contacts and companies to create with the request
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<Value>,
}

impl IncomingLead {
    /// A form submission with a fresh `source_uid`
    pub fn from_form(source_name: impl Into<String>, embedded: Value) -> Self {
        Self {
            source_uid: Some(Uuid::new_v4().to_string()),
            source_name: Some(source_name.into()),
            created_at: Some(chrono::Utc::now().timestamp()),
            embedded: Some(embedded),
            ..Default::default()
        }
    }

    pub fn in_pipeline(mut self, pipeline_id: u64) -> Self {
        self.pipeline_id = Some(pipeline_id);
        self
    }
}

impl Entity for IncomingLead {
    fn resource(&self) -> Resource {
        Resource::Unsorted
    }

    fn id(&self) -> Option<u64> {
        None
    }

    fn fields(&self) -> Map<String, Value> {
        let mut params = Map::new();
        insert_opt(&mut params, "source_uid", &self.source_uid);
        insert_opt(&mut params, "source_name", &self.source_name);
        insert_opt(&mut params, "pipeline_id", &self.pipeline_id);
        insert_opt(&mut params, "created_at", &self.created_at);
        insert_opt(&mut params, "metadata", &self.metadata);
        insert_opt(&mut params, "_embedded", &self.embedded);
        params
    }

    fn resolve_path(&self) -> Result<String, ApiError> {
        let base = self.resource().path(None).ok_or_else(|| {
            ApiError::validation("unsorted path could not be resolved")
        })?;
        Ok(format!("{}/forms", base))
    }
}
