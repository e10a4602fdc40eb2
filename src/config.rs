use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::ShopAssistError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

/// Catalog database settings. Credentials come from the secret store, never from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: Option<String>,
    /// Name of the embedding collection holding the catalog
    pub table_name: Option<String>,
    pub secret_name: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
}

fn default_db_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_db_port(),
            name: None,
            table_name: None,
            secret_name: None,
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub vision_model: String,
    #[serde(default = "default_llm_model")]
    pub text_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_model() -> String {
    "anthropic.claude-3-sonnet-20240229-v1:0".to_string()
}

fn default_max_tokens() -> usize {
    2000
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: "https://api.anthropic.com/v1".to_string(),
            llm_key: None,
            vision_model: default_llm_model(),
            text_model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// `openai` or `ollama`
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

fn default_embedding_provider() -> String {
    "ollama".to_string()
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            model: "nomic-embed-text".to_string(),
            dimension: 768,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Fixed number of catalog items fetched per request
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Upper bound on the serialized candidate block in the generation prompt
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_top_k() -> usize {
    4
}

fn default_max_context_chars() -> usize {
    8000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_stage_timeout")]
    pub vision_secs: u64,
    #[serde(default = "default_stage_timeout")]
    pub retrieval_secs: u64,
    #[serde(default = "default_stage_timeout")]
    pub generation_secs: u64,
    /// Overall deadline for one request at the HTTP boundary
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: u64,
}

fn default_stage_timeout() -> u64 {
    60
}

fn default_request_deadline() -> u64 {
    180
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            vision_secs: default_stage_timeout(),
            retrieval_secs: default_stage_timeout(),
            generation_secs: default_stage_timeout(),
            request_deadline_secs: default_request_deadline(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build configuration from defaults and process environment only
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default file path, then apply environment overrides
    pub fn load() -> crate::Result<Self> {
        let mut config = if Path::new("config.toml").exists() {
            Self::from_file("config.toml")?
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment-style settings using the given lookup.
    ///
    /// Blank values are ignored. A value that cannot be parsed is a startup error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(region) = non_empty("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(host) = non_empty("DB_HOST") {
            self.database.host = Some(host);
        }
        if let Some(port) = non_empty("DB_PORT") {
            self.database.port = port.trim().parse().map_err(|_| {
                ShopAssistError::StartupConfiguration(format!(
                    "DB_PORT must be a port number, got '{port}'"
                ))
            })?;
        }
        if let Some(name) = non_empty("DB_NAME") {
            self.database.name = Some(name);
        }
        if let Some(table) = non_empty("DB_TABLE_NAME") {
            self.database.table_name = Some(table);
        }
        if let Some(secret) = non_empty("DB_SECRET_NAME") {
            self.database.secret_name = Some(secret);
        }
        if let Some(endpoint) = non_empty("LLM_ENDPOINT") {
            self.llm.llm_endpoint = endpoint;
        }
        if let Some(key) = non_empty("LLM_API_KEY") {
            self.llm.llm_key = Some(key);
        }
        if let Some(endpoint) = non_empty("EMBEDDING_ENDPOINT") {
            self.embeddings.endpoint = endpoint;
        }
        if let Some(key) = non_empty("EMBEDDING_API_KEY") {
            self.embeddings.api_key = Some(key);
        }

        Ok(())
    }

    /// Check that every value needed to serve requests is present
    pub fn validate(&self) -> crate::Result<()> {
        let missing: Vec<&str> = [
            ("DB_HOST", self.database.host.as_deref()),
            ("DB_NAME", self.database.name.as_deref()),
            ("DB_TABLE_NAME", self.database.table_name.as_deref()),
            ("DB_SECRET_NAME", self.database.secret_name.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(key, _)| key)
        .collect();

        if !missing.is_empty() {
            return Err(ShopAssistError::StartupConfiguration(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(ShopAssistError::StartupConfiguration(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }

        if self.llm.llm_endpoint.trim().is_empty() {
            return Err(ShopAssistError::StartupConfiguration(
                "llm.llm_endpoint must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Get database host (only valid after `validate`)
    pub fn database_host(&self) -> &str {
        self.database.host.as_deref().unwrap_or_default()
    }

    /// Get database name
    pub fn database_name(&self) -> &str {
        self.database.name.as_deref().unwrap_or_default()
    }

    /// Get catalog collection name
    pub fn collection_name(&self) -> &str {
        self.database.table_name.as_deref().unwrap_or_default()
    }

    /// Get the secret holding database credentials
    pub fn secret_name(&self) -> &str {
        self.database.secret_name.as_deref().unwrap_or_default()
    }

    pub fn vision_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.vision_secs)
    }

    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.retrieval_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.generation_secs)
    }

    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_deadline_secs)
    }
}

