use std::env;
use std::fs;
use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::PricingConfig;
use crate::resolver::ResolverConfig;

/// Engine configuration. The database location is always an explicit value
/// handed in here; nothing in the engine falls back to a per-OS default path.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub resolver: ResolverConfig,
    pub pricing: PricingConfig,
    pub orders: OrderTimingConfig,
    pub embedding: EmbeddingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTimingConfig {
    pub base_minutes: u32,
    pub per_line_minutes: u32,
}

impl OrderTimingConfig {
    pub fn estimate(&self, line_count: usize) -> u32 {
        let lines = u32::try_from(line_count).unwrap_or(u32::MAX);
        self.base_minutes.saturating_add(self.per_line_minutes.saturating_mul(lines))
    }
}

#[derive(Clone, Debug)]
pub struct EmbeddingConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub embedding_api_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://burgeria.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            resolver: ResolverConfig::default(),
            pricing: PricingConfig::default(),
            orders: OrderTimingConfig { base_minutes: 10, per_line_minutes: 3 },
            embedding: EmbeddingConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "text-embedding-3-small".to_string(),
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<FileDatabase>,
    resolver: Option<FileResolver>,
    pricing: Option<FilePricing>,
    orders: Option<FileOrders>,
    embedding: Option<FileEmbedding>,
    logging: Option<FileLogging>,
}

#[derive(Debug, Default, Deserialize)]
struct FileDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileResolver {
    similarity_threshold: Option<f32>,
    ambiguity_gap: Option<f32>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FilePricing {
    size_upgrade_delta: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileOrders {
    base_minutes: Option<u32>,
    per_line_minutes: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FileEmbedding {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLogging {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = resolve_config_path(&options)? {
            let raw = fs::read_to_string(&path)
                .map_err(|source| ConfigError::ReadFile { path: path.clone(), source })?;
            let file: FileConfig = toml::from_str(&raw)
                .map_err(|source| ConfigError::ParseFile { path: path.clone(), source })?;
            config.apply_file(file);
        }

        config.apply_env();
        config.apply_overrides(&options.overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(database) = file.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }
        if let Some(resolver) = file.resolver {
            if let Some(threshold) = resolver.similarity_threshold {
                self.resolver.similarity_threshold = threshold;
            }
            if let Some(gap) = resolver.ambiguity_gap {
                self.resolver.ambiguity_gap = gap;
            }
            if let Some(limit) = resolver.limit {
                self.resolver.limit = limit;
            }
        }
        if let Some(pricing) = file.pricing {
            if let Some(delta) = pricing.size_upgrade_delta {
                self.pricing.size_upgrade_delta = delta;
            }
        }
        if let Some(orders) = file.orders {
            if let Some(base) = orders.base_minutes {
                self.orders.base_minutes = base;
            }
            if let Some(per_line) = orders.per_line_minutes {
                self.orders.per_line_minutes = per_line;
            }
        }
        if let Some(embedding) = file.embedding {
            if let Some(api_key) = embedding.api_key {
                self.embedding.api_key = Some(api_key.into());
            }
            if let Some(base_url) = embedding.base_url {
                self.embedding.base_url = base_url;
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(timeout_secs) = embedding.timeout_secs {
                self.embedding.timeout_secs = timeout_secs;
            }
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var("BURGERIA_DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
        if let Ok(level) = env::var("BURGERIA_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(api_key) = env::var("BURGERIA_EMBEDDING_API_KEY") {
            if !api_key.is_empty() {
                self.embedding.api_key = Some(api_key.into());
            }
        }
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.database_url {
            self.database.url = url.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if let Some(api_key) = &overrides.embedding_api_key {
            self.embedding.api_key = Some(api_key.clone().into());
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.resolver.similarity_threshold) {
            return Err(ConfigError::Validation(
                "resolver.similarity_threshold must be within [0, 1]".to_string(),
            ));
        }
        if self.resolver.ambiguity_gap < 0.0 {
            return Err(ConfigError::Validation(
                "resolver.ambiguity_gap must not be negative".to_string(),
            ));
        }
        if self.resolver.limit == 0 {
            return Err(ConfigError::Validation("resolver.limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn resolve_config_path(options: &LoadOptions) -> Result<Option<PathBuf>, ConfigError> {
    match &options.config_path {
        Some(path) if path.exists() => Ok(Some(path.clone())),
        Some(path) if options.require_file => Err(ConfigError::MissingConfigFile(path.clone())),
        Some(_) => Ok(None),
        None => {
            let default_path = PathBuf::from("burgeria.toml");
            if default_path.exists() {
                Ok(Some(default_path))
            } else {
                Ok(None)
            }
        }
    }
}
