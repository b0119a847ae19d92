use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sherpa_core::MetaValue;

use crate::paths::SherpaPaths;

/// Settings stored in `.sherpa/config.json`. Every field has a default, so a
/// partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SherpaConfig {
    pub bind: String,
    pub port: u16,
    /// Event log location; relative paths resolve against the site root.
    pub log_path: Option<PathBuf>,
    /// Ingest URL used by `sherpa track`.
    pub endpoint: String,
    pub prefs_ttl_hours: u64,
    pub report_top: usize,
    pub report_recent: usize,
}

impl Default for SherpaConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            log_path: None,
            endpoint: "http://127.0.0.1:3000/api/track".to_string(),
            prefs_ttl_hours: 24,
            report_top: 10,
            report_recent: 20,
        }
    }
}

impl SherpaConfig {
    /// Load from `.sherpa/config.json`.
    /// Returns defaults if the file is missing or unparseable.
    pub fn load(paths: &SherpaPaths) -> Self {
        let content = match std::fs::read_to_string(&paths.config_json) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unparseable config.json");
                Self::default()
            }
        }
    }

    /// Effective event log path.
    pub fn log_path(&self, paths: &SherpaPaths) -> PathBuf {
        match &self.log_path {
            Some(p) => paths.resolve(p),
            None => paths.events_jsonl.clone(),
        }
    }
}

/// Read config as a raw JSON map. Returns empty map if file doesn't exist.
pub fn read_config_map(path: &Path) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Write config map atomically.
pub fn write_config_map(
    path: &Path,
    config: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&config)?;
    sherpa_store::write_atomic(path, json.as_bytes())
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
pub fn parse_value(s: &str) -> serde_json::Value {
    MetaValue::parse_loose(s).into()
}
