use std::path::Path;

use sherpa_core::{Meta, MetaValue};
use sherpa_emit::{Emitter, TrackPayload};
use sherpa_ledger::{SherpaConfig, SherpaPaths};

pub struct TrackParams<'a> {
    pub root: &'a Path,
    pub event: &'a str,
    pub from: &'a str,
    pub to: Option<&'a str>,
    pub meta: &'a [String],
    pub endpoint: Option<&'a str>,
}

pub fn execute(params: &TrackParams<'_>) -> anyhow::Result<()> {
    let endpoint = match params.endpoint {
        Some(e) => e.to_string(),
        None => SherpaConfig::load(&SherpaPaths::discover(params.root)).endpoint,
    };
    let payload = build_payload(params)?;
    let emitter = Emitter::new(endpoint);
    emitter
        .deliver(&payload)
        .map_err(|e| anyhow::anyhow!("{} not accepted by {}: {e}", payload.event, emitter.endpoint()))?;
    println!("sent {} from {}", payload.event, payload.from);
    Ok(())
}

/// Turn `--meta key=value` pairs into a payload. Values are typed loosely
/// (`75` is a number, `true` a boolean).
fn build_payload(params: &TrackParams<'_>) -> anyhow::Result<TrackPayload> {
    let mut meta = Meta::new();
    for pair in params.meta {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--meta must be key=value (got \"{pair}\")"))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("--meta key is empty in \"{pair}\"");
        }
        meta.insert(key.to_string(), MetaValue::parse_loose(value.trim()));
    }
    Ok(TrackPayload {
        event: params.event.to_string(),
        from: params.from.to_string(),
        to: params.to.map(str::to_string),
        meta: if meta.is_empty() { None } else { Some(meta) },
    })
}
