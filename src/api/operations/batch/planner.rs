//! Batched creates, updates and deletes
//!
//! A call runs in fixed phases: every entity is validated and serialized first, then the
//! writes are grouped by (path, verb) with creates ahead of updates, each group is split into
//! chunks of at most `limit` entities and the chunks are sent one after another. Updated
//! entities are locked for the duration of their chunk's request. Any failure aborts the call;
//! held locks are dropped on the way out.

use super::plan::{BatchGroup, BatchKey, group_by_key};
use crate::api::constants::{DEFAULT_BATCH_LIMIT, DEFAULT_UPDATED_AT_DELTA};
use crate::api::error::ApiError;
use crate::api::lock::{EntityKey, EntityLocks};
use crate::api::models::{Entity, RelationDiff};
use crate::api::operations::WriteKind;
use crate::api::response;
use crate::api::transport::{Account, Transport};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

/// How chunk responses are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Records extracted from every response, concatenated
    #[default]
    Normalized,
    /// Responses as received, one per request
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Maximum entities per request
    pub limit: usize,
    pub mode: ResponseMode,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_BATCH_LIMIT,
            mode: ResponseMode::Normalized,
        }
    }
}

impl WriteOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn raw(mut self) -> Self {
        self.mode = ResponseMode::Raw;
        self
    }
}

/// Result of a batched write
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutput {
    Items(Vec<Value>),
    /// `None` marks a request answered without content (deletes only)
    Raw(Vec<Option<Value>>),
}

impl BatchOutput {
    /// Extracted records; empty in raw mode
    pub fn items(&self) -> &[Value] {
        match self {
            Self::Items(items) => items,
            Self::Raw(_) => &[],
        }
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Items(items) => items,
            Self::Raw(_) => Vec::new(),
        }
    }

    /// Raw responses; empty in normalized mode
    pub fn responses(&self) -> &[Option<Value>] {
        match self {
            Self::Raw(responses) => responses,
            Self::Items(_) => &[],
        }
    }
}

/// One serialized save, addressed by its position in the caller's slice
struct PendingWrite {
    index: usize,
    kind: WriteKind,
    lock_key: Option<EntityKey>,
    params: Value,
    diffs: Vec<RelationDiff>,
}

/// Accumulates chunk responses according to the response mode
struct Collector {
    mode: ResponseMode,
    items: Vec<Value>,
    raw: Vec<Option<Value>>,
}

impl Collector {
    fn new(mode: ResponseMode) -> Self {
        Self {
            mode,
            items: Vec::new(),
            raw: Vec::new(),
        }
    }

    fn push(&mut self, response: Option<Value>) {
        match self.mode {
            ResponseMode::Normalized => self.items.extend(response::normalize(response.as_ref())),
            ResponseMode::Raw => self.raw.push(response),
        }
    }

    fn finish(self) -> BatchOutput {
        match self.mode {
            ResponseMode::Normalized => BatchOutput::Items(self.items),
            ResponseMode::Raw => BatchOutput::Raw(self.raw),
        }
    }
}

/// Write service sending entity changes in as few requests as the size limit allows
#[derive(Clone)]
pub struct BatchPlanner {
    transport: Arc<dyn Transport>,
    locks: EntityLocks,
    options: WriteOptions,
    updated_at_delta: i64,
}

impl BatchPlanner {
    /// Planner honoring the process-wide entity locks
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            locks: EntityLocks::shared(),
            options: WriteOptions::default(),
            updated_at_delta: DEFAULT_UPDATED_AT_DELTA,
        }
    }

    /// Use another lock registry instead of the process-wide one
    pub fn with_locks(mut self, locks: EntityLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Seconds added to the current time for `updated_at` on updates
    pub fn with_updated_at_delta(mut self, delta: i64) -> Self {
        self.updated_at_delta = delta;
        self
    }

    pub fn locks(&self) -> &EntityLocks {
        &self.locks
    }

    pub fn options(&self) -> WriteOptions {
        self.options
    }

    /// Save one entity and return the id the server reports for it
    pub async fn save(&self, account: &Account, entity: &mut dyn Entity) -> Result<u64, ApiError> {
        let resource = entity.resource();
        let kind = WriteKind::for_save(entity.id());
        let path = entity.resolve_path()?;

        let options = WriteOptions {
            mode: ResponseMode::Normalized,
            ..self.options
        };
        let output = self.save_many_with(account, &mut [entity], options).await?;

        output
            .items()
            .iter()
            .find_map(|record| record.get("id").and_then(Value::as_u64))
            .ok_or_else(|| {
                debug!("No id in {} response for {}", kind.operation_type(), resource.name());
                ApiError::EmptyResponse {
                    method: kind.http_method().to_string(),
                    path,
                    count: 1,
                }
            })
    }

    /// Create entities without an id and update the rest, using the planner's options
    pub async fn save_many(
        &self,
        account: &Account,
        entities: &mut [&mut dyn Entity],
    ) -> Result<BatchOutput, ApiError> {
        self.save_many_with(account, entities, self.options).await
    }

    pub async fn save_many_with(
        &self,
        account: &Account,
        entities: &mut [&mut dyn Entity],
        options: WriteOptions,
    ) -> Result<BatchOutput, ApiError> {
        let groups = self.plan_saves(entities)?;
        let total: usize = groups.iter().map(|group| group.items.len()).sum();
        let mut collector = Collector::new(options.mode);
        let mut requests = 0;

        for group in &groups {
            debug!(
                "{} {}: {} entities in {} chunk(s)",
                group.key.method,
                group.key.path,
                group.items.len(),
                group.chunk_count(options.limit)
            );

            for chunk in group.chunks(options.limit) {
                // Released when the chunk is done, also on the error paths below
                let _guards = self
                    .locks
                    .acquire_all(chunk.iter().filter_map(|write| write.lock_key))
                    .await;

                let params = Value::Array(chunk.iter().map(|write| write.params.clone()).collect());
                let response = self
                    .transport
                    .request(account, &group.key.path, group.key.method, params)
                    .await?;
                requests += 1;

                let kind = chunk.first().map_or(WriteKind::Create, |write| write.kind);
                check_response(kind, &group.key, chunk.len(), response.as_ref())?;

                for write in chunk {
                    entities[write.index].commit_relations(&write.diffs);
                }
                collector.push(response);
            }
        }

        info!("Saved {} entities in {} request(s)", total, requests);
        Ok(collector.finish())
    }

    /// Delete entities, one request per resolved path with the ids as body
    pub async fn delete_many(
        &self,
        account: &Account,
        entities: &[&dyn Entity],
    ) -> Result<BatchOutput, ApiError> {
        self.delete_many_with(account, entities, self.options.mode).await
    }

    pub async fn delete_many_with(
        &self,
        account: &Account,
        entities: &[&dyn Entity],
        mode: ResponseMode,
    ) -> Result<BatchOutput, ApiError> {
        let groups = plan_deletes(entities)?;
        let mut collector = Collector::new(mode);

        for group in &groups {
            debug!("DELETE {}: {} ids", group.key.path, group.items.len());

            let ids = Value::Array(group.items.iter().map(|id| Value::from(*id)).collect());
            let response = self
                .transport
                .request(account, &group.key.path, group.key.method, ids)
                .await?;

            check_response(WriteKind::Delete, &group.key, group.items.len(), response.as_ref())?;

            // No content is a successful delete with nothing to report
            if response.is_some() || mode == ResponseMode::Raw {
                collector.push(response);
            }
        }

        info!("Deleted {} entities in {} request(s)", entities.len(), groups.len());
        Ok(collector.finish())
    }

    /// Serialize every entity and group the writes, creates first
    fn plan_saves(&self, entities: &[&mut dyn Entity]) -> Result<Vec<BatchGroup<PendingWrite>>, ApiError> {
        let updated_at = chrono::Utc::now().timestamp() + self.updated_at_delta;
        let mut creates = Vec::new();
        let mut updates = Vec::new();

        for (index, entity) in entities.iter().enumerate() {
            let kind = WriteKind::for_save(entity.id());
            let key = BatchKey::new(entity.resolve_path()?, kind.http_method());

            let mut params = entity.to_params();
            if kind == WriteKind::Update && entity.stamps_updated_at() {
                params.insert("updated_at".to_string(), Value::from(updated_at));
            }

            let write = PendingWrite {
                index,
                kind,
                lock_key: entity.id().map(|id| EntityKey::new(entity.resource(), id)),
                params: Value::Object(params),
                diffs: entity.relation_diffs(),
            };

            match kind {
                WriteKind::Update => updates.push((key, write)),
                _ => creates.push((key, write)),
            }
        }

        let mut groups = group_by_key(creates);
        groups.extend(group_by_key(updates));
        Ok(groups)
    }
}

/// Fail when a write that must answer with records got none back.
///
/// Emptiness is judged on the extracted records, so an envelope like
/// `{"_embedded":{"leads":[]}}` counts as empty.
fn check_response(
    kind: WriteKind,
    key: &BatchKey,
    count: usize,
    response: Option<&Value>,
) -> Result<(), ApiError> {
    if kind.requires_response() && response::is_empty(response::extract_items(response)) {
        debug!("{} {} answered without records", key.method, key.path);
        return Err(ApiError::EmptyResponse {
            method: key.method.to_string(),
            path: key.path.clone(),
            count,
        });
    }
    Ok(())
}

/// Validate ids and container ids, then group ids by path
fn plan_deletes(entities: &[&dyn Entity]) -> Result<Vec<BatchGroup<u64>>, ApiError> {
    let mut keyed = Vec::with_capacity(entities.len());

    for entity in entities {
        let resource = entity.resource();
        let id = entity.id().ok_or_else(|| {
            ApiError::validation(format!("deleting {} requires an id", resource.name()))
        })?;
        let path = entity.resolve_path()?;
        keyed.push((BatchKey::new(path, WriteKind::Delete.http_method()), id));
    }

    Ok(group_by_key(keyed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::constants::Resource;
    use crate::api::models::RawEntity;
    use crate::api::transport::Method;

    #[test]
    fn test_plan_deletes_groups_by_path() {
        let a = RawEntity::with_id(Resource::Leads, 1);
        let b = RawEntity::with_id(Resource::CatalogElements, 2).in_container(7);
        let c = RawEntity::with_id(Resource::Leads, 3);

        let groups = plan_deletes(&[&a, &b, &c]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key.path, "/api/v4/leads");
        assert_eq!(groups[0].items, vec![1, 3]);
        assert_eq!(groups[1].key.path, "/api/v4/catalogs/7/elements");
    }

    #[test]
    fn test_plan_deletes_requires_container_id() {
        let element = RawEntity::with_id(Resource::CatalogElements, 2);
        assert!(plan_deletes(&[&element]).unwrap_err().is_validation());
    }

    #[test]
    fn test_check_response_judges_extracted_records() {
        let key = BatchKey::new("/api/v4/leads", Method::Post);
        let empty = serde_json::json!({"_embedded": {"leads": []}});
        let filled = serde_json::json!({"_embedded": {"leads": [{"id": 1}]}});

        assert!(check_response(WriteKind::Create, &key, 1, Some(&empty)).is_err());
        assert!(check_response(WriteKind::Update, &key, 1, None).is_err());
        assert!(check_response(WriteKind::Create, &key, 1, Some(&filled)).is_ok());
        assert!(check_response(WriteKind::Delete, &key, 1, None).is_ok());
        assert!(check_response(WriteKind::Delete, &key, 1, Some(&empty)).is_ok());
    }

    #[test]
    fn test_output_accessors() {
        let items = BatchOutput::Items(vec![serde_json::json!({"id": 1})]);
        assert_eq!(items.items().len(), 1);
        assert!(items.responses().is_empty());

        let raw = BatchOutput::Raw(vec![None]);
        assert!(raw.items().is_empty());
        assert_eq!(raw.responses(), &[None]);
    }
}
