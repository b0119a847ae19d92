use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Return the per-user data root: `<data_dir>/sherpa/`.
/// Falls back to `~/.sherpa/`, then to a relative `.sherpa-data/`.
pub fn data_root() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("sherpa")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".sherpa")
    } else {
        PathBuf::from(".sherpa-data")
    }
}

/// Directory for client-held session state (`data_root/session/`).
pub fn session_dir() -> PathBuf {
    data_root().join("session")
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

/// Remove a file, treating "already gone" as success.
pub fn remove_if_exists(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
