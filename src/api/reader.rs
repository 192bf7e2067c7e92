//! Read service: lists and single records, plus the widget and custom field admin endpoints

use super::constants::{self, EntityType, Resource, envelope};
use super::error::ApiError;
use super::response;
use super::transport::{Account, Method, Transport};
use log::info;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Clone)]
pub struct EntityReader {
    transport: Arc<dyn Transport>,
}

impl EntityReader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// GET a path and return the response as received
    pub async fn get_raw(&self, account: &Account, path: &str, params: Value) -> Result<Option<Value>, ApiError> {
        Ok(self.transport.request(account, path, Method::Get, params).await?)
    }

    /// GET a path and return its records
    pub async fn list(&self, account: &Account, path: &str, params: Value) -> Result<Vec<Value>, ApiError> {
        let response = self.get_raw(account, path, params).await?;
        Ok(response::normalize(response.as_ref()))
    }

    /// List a resource that has a fixed collection path
    pub async fn list_resource(
        &self,
        account: &Account,
        resource: Resource,
        params: Value,
    ) -> Result<Vec<Value>, ApiError> {
        let path = collection_path(resource, None)?;
        self.list(account, &path, params).await
    }

    /// Fetch one record and check it is the one asked for
    pub async fn fetch_record(
        &self,
        account: &Account,
        resource: Resource,
        container_id: Option<u64>,
        id: u64,
        params: Value,
    ) -> Result<Value, ApiError> {
        let path = resource
            .record_path(id, container_id)
            .ok_or_else(|| missing_container(resource))?;
        let response = self.get_raw(account, &path, params).await?;

        let items = response::extract_items(response.as_ref());
        let record = response::first_record(items)
            .filter(|_| !response::is_empty(items))
            .ok_or_else(|| ApiError::NotFound {
                resource: resource.name().to_string(),
                id,
            })?;

        let returned = record.get("id").and_then(Value::as_u64);
        if returned != Some(id) {
            return Err(ApiError::IdentityMismatch {
                resource: resource.name().to_string(),
                requested: id,
                returned,
            });
        }

        Ok(record.clone())
    }

    /// Fetch one record into a typed model
    pub async fn fetch_by_id<E: DeserializeOwned>(
        &self,
        account: &Account,
        resource: Resource,
        id: u64,
    ) -> Result<E, ApiError> {
        let record = self.fetch_record(account, resource, None, id, json!({})).await?;
        decode(resource, record)
    }

    /// Fetch one element of a catalog
    pub async fn fetch_catalog_element<E: DeserializeOwned>(
        &self,
        account: &Account,
        catalog_id: u64,
        id: u64,
    ) -> Result<E, ApiError> {
        let resource = Resource::CatalogElements;
        let record = self
            .fetch_record(account, resource, Some(catalog_id), id, json!({}))
            .await?;
        decode(resource, record)
    }

    pub async fn pipelines(&self, account: &Account) -> Result<Vec<Value>, ApiError> {
        self.list_resource(account, Resource::Pipelines, json!({})).await
    }

    pub async fn statuses(&self, account: &Account, pipeline_id: u64) -> Result<Vec<Value>, ApiError> {
        self.list(account, &constants::pipeline_statuses_path(pipeline_id), json!({}))
            .await
    }

    pub async fn catalogs(&self, account: &Account) -> Result<Vec<Value>, ApiError> {
        self.list_resource(account, Resource::Catalogs, json!({})).await
    }

    pub async fn catalog_elements(
        &self,
        account: &Account,
        catalog_id: u64,
        params: Value,
    ) -> Result<Vec<Value>, ApiError> {
        let path = collection_path(Resource::CatalogElements, Some(catalog_id))?;
        self.list(account, &path, params).await
    }

    pub async fn users(&self, account: &Account) -> Result<Vec<Value>, ApiError> {
        self.list_resource(account, Resource::Users, json!({})).await
    }

    pub async fn widgets(&self, account: &Account) -> Result<Vec<Value>, ApiError> {
        self.list_resource(account, Resource::Widgets, json!({})).await
    }

    /// A single widget by code, as received
    pub async fn widget(&self, account: &Account, code: &str) -> Result<Option<Value>, ApiError> {
        self.get_raw(account, &constants::widget_path(code), json!({})).await
    }

    /// Install a widget on the account; `params` carries its settings
    pub async fn install_widget(
        &self,
        account: &Account,
        code: &str,
        params: Value,
    ) -> Result<Option<Value>, ApiError> {
        info!("Installing widget {}", code);
        let path = constants::widget_path(code);
        Ok(self.transport.request(account, &path, Method::Post, params).await?)
    }

    pub async fn uninstall_widget(&self, account: &Account, code: &str) -> Result<Option<Value>, ApiError> {
        info!("Uninstalling widget {}", code);
        let path = constants::widget_path(code);
        Ok(self.transport.request(account, &path, Method::Delete, json!({})).await?)
    }

    pub async fn custom_fields(&self, account: &Account, entity: EntityType) -> Result<Vec<Value>, ApiError> {
        self.list_resource(account, Resource::CustomFields(entity), json!({}))
            .await
    }

    /// Custom field groups of an entity type
    pub async fn custom_field_groups(
        &self,
        account: &Account,
        entity: EntityType,
        params: Value,
    ) -> Result<Vec<Value>, ApiError> {
        let path = constants::custom_field_groups_path(entity);
        let response = self.get_raw(account, &path, params).await?;

        let groups = response
            .as_ref()
            .and_then(|body| body.get(envelope::EMBEDDED))
            .and_then(|embedded| embedded.get(envelope::CUSTOM_FIELD_GROUPS));
        Ok(match groups {
            Some(groups) => response::records(Some(groups)),
            None => response::normalize(response.as_ref()),
        })
    }

    /// Delete one custom field. The batch delete sends ids in the body, this endpoint takes
    /// the id in the path.
    pub async fn delete_custom_field(
        &self,
        account: &Account,
        entity: EntityType,
        id: u64,
    ) -> Result<Option<Value>, ApiError> {
        let resource = Resource::CustomFields(entity);
        let path = resource
            .record_path(id, None)
            .ok_or_else(|| missing_container(resource))?;
        info!("Deleting custom field {} of {}", id, entity.as_str());
        Ok(self.transport.request(account, &path, Method::Delete, json!({})).await?)
    }
}

fn collection_path(resource: Resource, container_id: Option<u64>) -> Result<String, ApiError> {
    resource
        .path(container_id)
        .ok_or_else(|| missing_container(resource))
}

fn missing_container(resource: Resource) -> ApiError {
    ApiError::validation(format!("{} requires a container id", resource.name()))
}

fn decode<E: DeserializeOwned>(resource: Resource, record: Value) -> Result<E, ApiError> {
    serde_json::from_value(record).map_err(|source| ApiError::Serialization {
        resource: resource.name().to_string(),
        source,
    })
}
