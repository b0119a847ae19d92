use std::path::Path;

use sherpa_ledger::{SherpaConfig, SherpaPaths};
use sherpa_report::{Report, ReportOptions};

pub struct ReportParams<'a> {
    pub root: &'a Path,
    pub log: Option<&'a Path>,
    pub top: Option<usize>,
    pub recent: Option<usize>,
    pub json: bool,
}

pub fn execute(params: &ReportParams<'_>) -> anyhow::Result<()> {
    let report = build(params)?;
    if params.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn build(params: &ReportParams<'_>) -> anyhow::Result<Report> {
    let paths = SherpaPaths::discover(params.root);
    let config = SherpaConfig::load(&paths);
    let log_path = match params.log {
        Some(p) => paths.resolve(p),
        None => config.log_path(&paths),
    };
    let opts = ReportOptions {
        top: params.top.unwrap_or(config.report_top),
        recent: params.recent.unwrap_or(config.report_recent),
    };
    Report::load(&log_path, opts)
}
