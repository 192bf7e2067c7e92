//! CLI configuration: accounts and engine settings in a TOML file, with `.env` overrides

use crate::api::constants::{DEFAULT_BATCH_LIMIT, DEFAULT_DOMAIN, DEFAULT_UPDATED_AT_DELTA};
use crate::api::operations::WriteOptions;
use crate::api::resilience::{AMOCRM_REQUESTS_PER_SECOND, RateLimitConfig, ResilienceConfig};
use crate::api::transport::Account;
use crate::auth::OAuthCredentials;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SUBDOMAIN: &str = "AMOCRM_SUBDOMAIN";
pub const ENV_TOKEN: &str = "AMOCRM_TOKEN";
pub const ENV_DOMAIN: &str = "AMOCRM_DOMAIN";

/// Name the account built from environment variables is known by
pub const ENV_ACCOUNT_NAME: &str = "env";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub subdomain: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Permanent token; takes precedence over OAuth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl AccountConfig {
    /// Account described by `AMOCRM_SUBDOMAIN`, `AMOCRM_TOKEN` and `AMOCRM_DOMAIN`
    pub fn from_env() -> Option<Self> {
        let subdomain = std::env::var(ENV_SUBDOMAIN).ok()?;
        Some(Self {
            subdomain,
            domain: std::env::var(ENV_DOMAIN).unwrap_or_else(|_| default_domain()),
            token: std::env::var(ENV_TOKEN).ok(),
            oauth: None,
        })
    }

    pub fn account(&self) -> Account {
        Account::new(&self.subdomain).with_domain(&self.domain)
    }
}

impl From<&OAuthConfig> for OAuthCredentials {
    fn from(config: &OAuthConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }
}

/// Where OAuth tokens are persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum TokenStorageConfig {
    /// JSON files; defaults to `tokens/` next to the config file
    File {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<PathBuf>,
    },
    Database {
        url: String,
        integration_code: String,
    },
}

impl Default for TokenStorageConfig {
    fn default() -> Self {
        Self::File { dir: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
    #[serde(default = "default_updated_at_delta")]
    pub updated_at_delta: i64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default)]
    pub token_storage: TokenStorageConfig,
}

fn default_batch_limit() -> usize {
    DEFAULT_BATCH_LIMIT
}

fn default_updated_at_delta() -> i64 {
    DEFAULT_UPDATED_AT_DELTA
}

fn default_max_attempts() -> u32 {
    3
}

fn default_requests_per_second() -> u32 {
    AMOCRM_REQUESTS_PER_SECOND
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_limit: default_batch_limit(),
            updated_at_delta: default_updated_at_delta(),
            max_attempts: default_max_attempts(),
            requests_per_second: default_requests_per_second(),
            token_storage: TokenStorageConfig::default(),
        }
    }
}

impl Settings {
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions::default().with_limit(self.batch_limit)
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .max_attempts(self.max_attempts)
            .rate_limit_config(RateLimitConfig::per_second(self.requests_per_second))
            .build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub current_account: Option<String>,
    #[serde(default)]
    pub accounts: HashMap<String, AccountConfig>,
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("amocrm-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".amocrm-cli")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        if !path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        debug!("Loaded config with {} accounts", config.accounts.len());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", path);

        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Add or replace an account; the first one becomes current
    pub fn add_account(&mut self, name: String, account: AccountConfig) {
        info!("Adding account: {}", name);
        if self.current_account.is_none() {
            self.current_account = Some(name.clone());
        }
        self.accounts.insert(name, account);
    }

    pub fn set_current_account(&mut self, name: &str) -> Result<()> {
        if !self.accounts.contains_key(name) {
            anyhow::bail!("Account '{}' not found", name);
        }
        self.current_account = Some(name.to_string());
        Ok(())
    }

    pub fn remove_account(&mut self, name: &str) -> Result<()> {
        if self.accounts.remove(name).is_none() {
            anyhow::bail!("Account '{}' not found", name);
        }
        if self.current_account.as_deref() == Some(name) {
            self.current_account = None;
        }
        Ok(())
    }

    /// Pick the account to work with: an explicit name, then the environment, then the current one
    pub fn resolve_account(&self, name: Option<&str>) -> Result<(String, AccountConfig)> {
        if let Some(name) = name {
            let account = self
                .accounts
                .get(name)
                .with_context(|| format!("Account '{}' not found", name))?;
            return Ok((name.to_string(), account.clone()));
        }

        if let Some(account) = AccountConfig::from_env() {
            debug!("Using account from {}", ENV_SUBDOMAIN);
            return Ok((ENV_ACCOUNT_NAME.to_string(), account));
        }

        let name = self
            .current_account
            .as_deref()
            .context("No account configured; set AMOCRM_SUBDOMAIN or add an account to the config file")?;
        let account = self
            .accounts
            .get(name)
            .with_context(|| format!("Current account '{}' not found", name))?;
        Ok((name.to_string(), account.clone()))
    }

    /// Directory for file-backed tokens
    pub fn token_dir(&self) -> Result<PathBuf> {
        match &self.settings.token_storage {
            TokenStorageConfig::File { dir: Some(dir) } => Ok(dir.clone()),
            _ => Ok(Self::get_config_dir()?.join("tokens")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            current_account = "main"

            [accounts.main]
            subdomain = "acme"
            token = "secret"

            [accounts.kommo]
            subdomain = "acme"
            domain = "kommo.com"

            [accounts.kommo.oauth]
            client_id = "id"
            client_secret = "shh"
            redirect_uri = "https://example.com/oauth"

            [settings]
            batch_limit = 100

            [settings.token_storage]
            backend = "database"
            url = "sqlite://tokens.db"
            integration_code = "crm-sync"
            "#,
        )
        .unwrap();

        let main = &config.accounts["main"];
        assert_eq!(main.domain, "amocrm.ru");
        assert_eq!(main.token.as_deref(), Some("secret"));
        assert_eq!(main.account().full_domain(), "acme.amocrm.ru");
        assert!(config.accounts["kommo"].oauth.is_some());

        assert_eq!(config.settings.batch_limit, 100);
        assert_eq!(config.settings.updated_at_delta, 5);
        assert_eq!(config.settings.write_options().limit, 100);
        assert!(matches!(
            config.settings.token_storage,
            TokenStorageConfig::Database { ref integration_code, .. } if integration_code == "crm-sync"
        ));
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.accounts.is_empty());
        assert_eq!(config.settings, Settings::default());

        let resilience = config.settings.resilience();
        assert_eq!(resilience.rate_limit.requests_per_second, 7);
        assert_eq!(resilience.rate_limit.burst, 7);
        assert_eq!(resilience.retry.max_attempts, 3);
    }

    #[test]
    fn test_first_account_becomes_current() {
        let mut config = Config::default();
        let account = AccountConfig {
            subdomain: "acme".to_string(),
            domain: default_domain(),
            token: None,
            oauth: None,
        };

        config.add_account("a".to_string(), account.clone());
        config.add_account("b".to_string(), account);
        assert_eq!(config.current_account.as_deref(), Some("a"));

        config.remove_account("a").unwrap();
        assert_eq!(config.current_account, None);
        assert!(config.set_current_account("missing").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("amocrm-config-{}.toml", uuid::Uuid::new_v4()));
        let mut config = Config::default();
        config.add_account(
            "main".to_string(),
            AccountConfig {
                subdomain: "acme".to_string(),
                domain: default_domain(),
                token: Some("secret".to_string()),
                oauth: None,
            },
        );

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = fs::remove_file(&path);
    }
}
