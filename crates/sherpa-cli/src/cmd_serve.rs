use std::path::{Path, PathBuf};

use sherpa_ledger::{SherpaConfig, SherpaPaths};
use sherpa_serve::ServeConfig;

/// Merge CLI flags over `.sherpa/config.json`.
fn resolve(
    paths: &SherpaPaths,
    config: &SherpaConfig,
    bind: Option<String>,
    port: Option<u16>,
    log: Option<PathBuf>,
) -> ServeConfig {
    ServeConfig {
        bind: bind.unwrap_or_else(|| config.bind.clone()),
        port: port.unwrap_or(config.port),
        log_path: match log {
            Some(p) => paths.resolve(&p),
            None => config.log_path(paths),
        },
    }
}

pub fn execute(
    root: &Path,
    bind: Option<String>,
    port: Option<u16>,
    log: Option<PathBuf>,
) -> anyhow::Result<()> {
    let paths = SherpaPaths::discover(root);
    let config = SherpaConfig::load(&paths);
    let serve_config = resolve(&paths, &config, bind, port, log);
    println!(
        "sherpa ingest on http://{}:{}/api/track -> {}",
        serve_config.bind,
        serve_config.port,
        serve_config.log_path.display()
    );
    tokio::runtime::Runtime::new()?.block_on(sherpa_serve::serve(serve_config))
}
