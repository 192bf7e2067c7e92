//! SQLite token store keyed by (domain, integration code)

use super::TokenStore;
use crate::auth::StorageError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS amocrm_tokens (
    domain TEXT NOT NULL,
    integration_code TEXT NOT NULL,
    tokens TEXT NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (domain, integration_code)
)
"#;

/// Several integrations can share one database; each reads only its own rows
#[derive(Debug, Clone)]
pub struct DatabaseTokenStore {
    pool: SqlitePool,
    integration_code: String,
}

impl DatabaseTokenStore {
    /// Open (creating if needed) the database at `url`, e.g. `sqlite://tokens.db`
    pub async fn connect(url: &str, integration_code: impl Into<String>) -> Result<Self, StorageError> {
        let integration_code = integration_code.into();
        let database_error = |source| StorageError::Database {
            domain: url.to_string(),
            source,
        };

        let options = SqliteConnectOptions::from_str(url)
            .map_err(database_error)?
            .create_if_missing(true);

        // A single connection keeps `sqlite::memory:` databases alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(database_error)?;

        Self::from_pool(pool, integration_code).await
    }

    /// Use an existing pool; creates the token table if missing
    pub async fn from_pool(pool: SqlitePool, integration_code: impl Into<String>) -> Result<Self, StorageError> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|source| StorageError::Database {
                domain: String::new(),
                source,
            })?;

        Ok(Self {
            pool,
            integration_code: integration_code.into(),
        })
    }

    pub fn integration_code(&self) -> &str {
        &self.integration_code
    }

    async fn fetch(&self, domain: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT tokens FROM amocrm_tokens WHERE domain = ? AND integration_code = ?",
        )
        .bind(domain)
        .bind(&self.integration_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| StorageError::Database {
            domain: domain.to_string(),
            source,
        })?;

        Ok(row.map(|(tokens,)| tokens))
    }
}

#[async_trait]
impl TokenStore for DatabaseTokenStore {
    async fn save(&self, tokens: &Value, domain: &str) -> Result<(), StorageError> {
        let blob = serde_json::to_string_pretty(tokens).map_err(|source| StorageError::Json {
            domain: domain.to_string(),
            source,
        })?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO amocrm_tokens (domain, integration_code, tokens, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            "#,
        )
        .bind(domain)
        .bind(&self.integration_code)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(|source| StorageError::Database {
            domain: domain.to_string(),
            source,
        })?;

        log::debug!("Saved tokens for {} ({})", domain, self.integration_code);
        Ok(())
    }

    async fn load(&self, domain: &str) -> Result<Value, StorageError> {
        let blob = self
            .fetch(domain)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                domain: domain.to_string(),
            })?;

        serde_json::from_str(&blob).map_err(|source| StorageError::Json {
            domain: domain.to_string(),
            source,
        })
    }

    async fn has_tokens(&self, domain: &str) -> Result<bool, StorageError> {
        Ok(self.fetch(domain).await?.is_some())
    }
}
