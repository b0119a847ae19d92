use clap::Subcommand;
use std::path::Path;

use sherpa_ledger::config::{parse_value, read_config_map, write_config_map};
use sherpa_ledger::{SherpaConfig, SherpaPaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. port, log_path, endpoint)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List effective config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(root, &key, &value),
        ConfigCmd::Get { key } => get(root, &key),
        ConfigCmd::List => list(root),
    }
}

// ── Command Implementations ──

/// Keys `SherpaConfig` understands.
fn known_keys() -> anyhow::Result<Vec<String>> {
    let defaults = serde_json::to_value(SherpaConfig::default())?;
    Ok(defaults
        .as_object()
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_default())
}

/// `sherpa config set <key> <value>`
pub fn set(root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let keys = known_keys()?;
    if !keys.iter().any(|k| k == key) {
        anyhow::bail!("unknown config key '{key}' (known: {})", keys.join(", "));
    }
    let paths = SherpaPaths::discover(root);
    let mut config = read_config_map(&paths.config_json)?;
    config.insert(key.to_string(), parse_value(value));
    // Reject values the typed config cannot load.
    serde_json::from_value::<SherpaConfig>(serde_json::Value::Object(config.clone()))
        .map_err(|e| anyhow::anyhow!("invalid value for '{key}': {e}"))?;
    write_config_map(&paths.config_json, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `sherpa config get <key>`
pub fn get(root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = SherpaPaths::discover(root);
    let config = read_config_map(&paths.config_json)?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `sherpa config list`
pub fn list(root: &Path) -> anyhow::Result<()> {
    let paths = SherpaPaths::discover(root);
    let effective = serde_json::to_value(SherpaConfig::load(&paths))?;
    let explicit = read_config_map(&paths.config_json)?;
    if let Some(map) = effective.as_object() {
        for (k, v) in map {
            let marker = if explicit.contains_key(k) { "" } else { "  (default)" };
            println!("{k} = {v}{marker}");
        }
    }
    Ok(())
}
