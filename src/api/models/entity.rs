//! The `Entity` trait every writable model implements

use super::relation::{Relation, RelationDiff, write_relation};
use crate::api::constants::Resource;
use crate::api::error::ApiError;
use serde_json::{Map, Value};

/// A record the write engine can create, update or delete
pub trait Entity: Send + Sync {
    fn resource(&self) -> Resource;

    /// Server id; its presence makes a save an update
    fn id(&self) -> Option<u64>;

    /// Parent id for container-scoped resources
    fn container_id(&self) -> Option<u64> {
        None
    }

    /// Allow-listed plain fields, relations excluded
    fn fields(&self) -> Map<String, Value>;

    /// Relation fields in a stable order
    fn relations(&self) -> Vec<(&'static str, &Relation)> {
        Vec::new()
    }

    /// Same relations, same order, mutably
    fn relations_mut(&mut self) -> Vec<&mut Relation> {
        Vec::new()
    }

    /// Whether updates must carry a fresh `updated_at`
    fn stamps_updated_at(&self) -> bool {
        true
    }

    /// Collection path this entity is written to
    fn resolve_path(&self) -> Result<String, ApiError> {
        let resource = self.resource();
        resource.path(self.container_id()).ok_or_else(|| {
            ApiError::validation(format!(
                "{} requires a container id (e.g. catalog_id) to build its path",
                resource.name()
            ))
        })
    }

    /// Outgoing field map with relation diffs folded in
    fn to_params(&self) -> Map<String, Value> {
        let mut params = self.fields();
        for (name, relation) in self.relations() {
            write_relation(&mut params, name, &relation.serialize());
        }
        params
    }

    /// Snapshot of the relation diffs, in `relations()` order
    fn relation_diffs(&self) -> Vec<RelationDiff> {
        self.relations()
            .into_iter()
            .map(|(_, relation)| relation.serialize())
            .collect()
    }

    /// Mark diffs taken by `relation_diffs` as accepted by the server
    fn commit_relations(&mut self, sent: &[RelationDiff]) {
        for (relation, diff) in self.relations_mut().into_iter().zip(sent) {
            relation.commit(diff);
        }
    }
}

/// Untyped entity for resources without a dedicated model
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub resource: Resource,
    pub id: Option<u64>,
    pub container_id: Option<u64>,
    pub fields: Map<String, Value>,
}

impl RawEntity {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            id: None,
            container_id: None,
            fields: Map::new(),
        }
    }

    pub fn with_id(resource: Resource, id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::new(resource)
        }
    }

    pub fn in_container(mut self, container_id: u64) -> Self {
        self.container_id = Some(container_id);
        self
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl Entity for RawEntity {
    fn resource(&self) -> Resource {
        self.resource
    }

    fn id(&self) -> Option<u64> {
        self.id
    }

    fn container_id(&self) -> Option<u64> {
        self.container_id
    }

    fn fields(&self) -> Map<String, Value> {
        let mut fields = self.fields.clone();
        if let Some(id) = self.id {
            fields.insert("id".to_string(), Value::from(id));
        }
        fields
    }
}
