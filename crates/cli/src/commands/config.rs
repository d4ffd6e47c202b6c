use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use burgeria_core::config::{EngineConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match EngineConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: Option<&str>| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", Some("BURGERIA_DATABASE_URL")),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", None),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", None),
    ));

    lines.push(render_line(
        "resolver.similarity_threshold",
        &config.resolver.similarity_threshold.to_string(),
        source("resolver.similarity_threshold", None),
    ));
    lines.push(render_line(
        "resolver.ambiguity_gap",
        &config.resolver.ambiguity_gap.to_string(),
        source("resolver.ambiguity_gap", None),
    ));
    lines.push(render_line(
        "resolver.limit",
        &config.resolver.limit.to_string(),
        source("resolver.limit", None),
    ));

    lines.push(render_line(
        "pricing.size_upgrade_delta",
        &config.pricing.size_upgrade_delta.to_string(),
        source("pricing.size_upgrade_delta", None),
    ));
    lines.push(render_line(
        "orders.base_minutes",
        &config.orders.base_minutes.to_string(),
        source("orders.base_minutes", None),
    ));
    lines.push(render_line(
        "orders.per_line_minutes",
        &config.orders.per_line_minutes.to_string(),
        source("orders.per_line_minutes", None),
    ));

    lines.push(render_line(
        "embedding.base_url",
        &config.embedding.base_url,
        source("embedding.base_url", None),
    ));
    lines.push(render_line(
        "embedding.model",
        &config.embedding.model,
        source("embedding.model", None),
    ));
    let api_key = if config.embedding.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "embedding.api_key",
        api_key,
        source("embedding.api_key", Some("BURGERIA_EMBEDDING_API_KEY")),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", Some("BURGERIA_LOG_LEVEL")),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", None),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("burgeria.toml");
    if root.exists() {
        return Some(root);
    }
    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
