//! Secret store access for catalog database credentials
//!
//! Secrets are resolved once at startup. The stored value is a JSON document
//! of the form `{"username": "...", "password": "..."}`.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::Result;
use crate::errors::ShopAssistError;

/// Database credentials held in the secret store
#[derive(Clone, Deserialize)]
pub struct DbCredentials {
    #[serde(default = "default_username")]
    pub username: String,
    pub password: Option<String>,
}

fn default_username() -> String {
    "postgres".to_string()
}

impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DbCredentials {
    /// Parse a JSON secret string
    pub fn from_secret_string(secret: &str) -> Result<Self> {
        let credentials: Self = serde_json::from_str(secret).map_err(|e| {
            ShopAssistError::StartupConfiguration(format!("secret is not valid JSON: {e}"))
        })?;
        if credentials.password.as_deref().map_or(true, str::is_empty) {
            return Err(ShopAssistError::StartupConfiguration(
                "secret has no password".to_string(),
            ));
        }
        Ok(credentials)
    }

    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }
}

/// Source of named secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<DbCredentials>;
}

/// Resolves secrets from environment variables, falling back to JSON files in a directory.
///
/// The secret `catalog-db` is looked up as `SECRET_CATALOG_DB`, then as `<dir>/catalog-db.json`.
pub struct EnvSecretStore {
    secrets_dir: Option<PathBuf>,
}

impl EnvSecretStore {
    #[must_use]
    pub fn new(secrets_dir: Option<PathBuf>) -> Self {
        Self { secrets_dir }
    }

    /// Environment variable name for a secret
    #[must_use]
    pub fn env_key(name: &str) -> String {
        let sanitized: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("SECRET_{sanitized}")
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<DbCredentials> {
        let key = Self::env_key(name);
        if let Ok(value) = std::env::var(&key) {
            debug!("Resolved secret {} from environment", name);
            return DbCredentials::from_secret_string(&value);
        }

        if let Some(dir) = &self.secrets_dir {
            let path = dir.join(format!("{name}.json"));
            if path.exists() {
                debug!("Resolved secret {} from {}", name, path.display());
                let value = tokio::fs::read_to_string(&path).await?;
                return DbCredentials::from_secret_string(&value);
            }
        }

        Err(ShopAssistError::StartupConfiguration(format!(
            "secret '{name}' not found (set {key})"
        )))
    }
}
