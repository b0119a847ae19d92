//! Append-only JSONL event sink.
//!
//! Each accepted event becomes one line `{event, from, to?, meta?, ts}`.
//! Writes are best-effort: a failed append loses the event and nothing else.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use sherpa_core::{LoggedEvent, TrackEvent};

/// Destination for validated events. Never fails from the caller's side.
pub trait EventSink: Send + Sync {
    fn record(&self, event: TrackEvent);
}

/// Writes events to a `.jsonl` file, one per line.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlSink {
    fn record(&self, event: TrackEvent) {
        let logged = event.stamp(now_rfc3339());
        if let Err(e) = append_event(&self.path, &logged) {
            tracing::warn!(error = %e, kind = %logged.event, "dropped telemetry event");
        }
    }
}

/// Serialize and append one event, creating parent dirs if needed.
/// The line goes out in a single `write_all` so concurrent appenders do not
/// interleave partial lines.
fn append_event(path: &Path, event: &LoggedEvent) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
