use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use showroom_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};
use toml::Value;

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config, detect_config_path().as_deref()),
        Err(error) => format!("config validation failed: {error}"),
    }
}

/// Effective values with the layer each one came from. Secrets are never
/// printed.
pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };

    let fields: Vec<(&str, String)> = vec![
        ("database.url", config.database.url.clone()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.timeout_secs", config.database.timeout_secs.to_string()),
        ("llm.provider", format!("{:?}", config.llm.provider)),
        ("llm.model", config.llm.model.clone()),
        ("llm.base_url", config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string())),
        ("llm.api_key", llm_api_key.to_string()),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string()),
        ("llm.temperature", config.llm.temperature.to_string()),
        ("llm.repeat_penalty", config.llm.repeat_penalty.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("dialogue.brand", config.dialogue.brand.clone()),
        ("dialogue.transcript_limit", config.dialogue.transcript_limit.to_string()),
        ("dialogue.recommendation_limit", config.dialogue.recommendation_limit.to_string()),
        ("dialogue.budget_flex_pct", config.dialogue.budget_flex_pct.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value) in fields {
        let source = field_source(key, config_file_doc.as_ref(), config_file_path);
        lines.push(render_line(key, &value, source));
    }
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from(DEFAULT_CONFIG_FILE);
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config").join(DEFAULT_CONFIG_FILE);
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

/// `SHOWROOM_<SECTION>_<FIELD>`, plus the short logging aliases.
fn env_keys(key_path: &str) -> Vec<String> {
    let mut keys = vec![format!("SHOWROOM_{}", key_path.replace('.', "_").to_uppercase())];
    if let Some(field) = key_path.strip_prefix("logging.") {
        keys.push(format!("SHOWROOM_LOG_{}", field.to_uppercase()));
    }
    keys
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys(key_path).into_iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
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
