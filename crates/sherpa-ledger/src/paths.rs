use std::path::{Path, PathBuf};

/// All well-known paths under `.sherpa/`.
#[derive(Debug, Clone)]
pub struct SherpaPaths {
    pub root: PathBuf,
    pub sherpa_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub events_jsonl: PathBuf,
    pub config_json: PathBuf,
}

impl SherpaPaths {
    /// Derive all paths from a site root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let sherpa_dir = root.join(".sherpa");
        let logs_dir = sherpa_dir.join("logs");
        Self {
            events_jsonl: logs_dir.join("events.jsonl"),
            config_json: sherpa_dir.join("config.json"),
            logs_dir,
            sherpa_dir,
            root,
        }
    }

    /// Create `.sherpa/logs/`. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.logs_dir)?;
        Ok(())
    }

    /// Check whether `.sherpa/` exists.
    pub fn is_initialized(&self) -> bool {
        self.sherpa_dir.is_dir()
    }

    /// Resolve a configured log path: absolute paths pass through,
    /// relative ones are taken from the site root.
    pub fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}
