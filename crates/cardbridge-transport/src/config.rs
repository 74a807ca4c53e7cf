use std::collections::HashMap;

use anyhow::Result;
use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::file::FileTransport;
use crate::http::{HttpConfig, HttpTransport};
use crate::{Transport, TransportError};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct TransportSection {
    /// Transport backend: "file" (default), "http".
    #[serde(default)]
    pub mode: Option<String>,
    /// Run transport I/O on a background worker thread.
    #[serde(default)]
    pub threaded: Option<bool>,
    /// Mailbox directory for the file transport.
    #[serde(default)]
    pub base_path: Option<String>,
    /// Endpoint receiving game and deck state, e.g. <http://127.0.0.1:8080/state>
    #[serde(default)]
    pub game_data_endpoint: Option<String>,
    /// Endpoint polled for pending action commands.
    #[serde(default)]
    pub actions_endpoint: Option<String>,
    /// Endpoint probed for availability.
    #[serde(default)]
    pub health_endpoint: Option<String>,
    /// Per-request timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Extra headers sent with every HTTP request.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportSection,
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema = schemars::schema_for!(Config);
    let schema_value = serde_json::to_value(&schema).expect("schema value");
    validator_for(&schema_value).expect("valid schema")
});

/// Returns the JSON schema describing the configuration structure.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(Config);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn load_config(path: &str) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let raw: toml::Value = toml::from_str(&content)?;
    let json_value = serde_json::to_value(&raw)?;
    let validation_errors: Vec<_> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !validation_errors.is_empty() {
        return Err(anyhow::anyhow!(validation_errors.join(", ")));
    }
    let cfg: Config = toml::from_str(&content)?;
    Ok(cfg)
}

/// Instantiate the transport named by `config`, defaulting to a file mailbox
/// in the current directory.
pub fn build_transport(config: &Config) -> Result<Box<dyn Transport>, TransportError> {
    let section = &config.transport;
    match section.mode.as_deref().unwrap_or("file") {
        "file" => {
            let base = section.base_path.as_deref().unwrap_or(".");
            Ok(Box::new(FileTransport::new(base)?))
        }
        "http" => {
            let game_data_endpoint = require(section.game_data_endpoint.as_ref(), "game_data_endpoint")?;
            let actions_endpoint = require(section.actions_endpoint.as_ref(), "actions_endpoint")?;
            let health_endpoint = require(section.health_endpoint.as_ref(), "health_endpoint")?;
            let http = HttpConfig {
                game_data_endpoint,
                actions_endpoint,
                health_endpoint,
                headers: section.headers.clone().unwrap_or_default(),
                timeout_ms: section.timeout_ms,
            };
            Ok(Box::new(HttpTransport::new(http)?))
        }
        other => Err(TransportError::Config(format!(
            "unknown transport mode: {other}"
        ))),
    }
}

fn require(value: Option<&String>, field: &str) -> Result<String, TransportError> {
    value.cloned().ok_or_else(|| {
        TransportError::Config(format!("http transport requires {field}"))
    })
}
