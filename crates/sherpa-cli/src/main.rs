mod cmd_config;
mod cmd_prefs;
mod cmd_report;
mod cmd_serve;
mod cmd_track;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sherpa",
    version,
    about = "Site telemetry ingest, session preferences, and log reports"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the ingest endpoint (POST /api/track)
    Serve {
        /// Address to bind (defaults to config `bind`)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (defaults to config `port`)
        #[arg(long)]
        port: Option<u16>,
        /// Event log path (defaults to config `log_path` or .sherpa/logs/events.jsonl)
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Summarize the event log
    Report {
        /// Event log path
        #[arg(long)]
        log: Option<PathBuf>,
        /// Length of ranked lists (0 = unlimited)
        #[arg(long)]
        top: Option<usize>,
        /// Number of recent events to show
        #[arg(long)]
        recent: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Send one event to an ingest endpoint and wait for the answer
    Track {
        /// Event kind (e.g. scroll_depth, blog_to_journey)
        event: String,
        /// Source page path
        #[arg(long)]
        from: String,
        /// Destination page path (navigation kinds)
        #[arg(long)]
        to: Option<String>,
        /// Auxiliary data as key=value (repeatable)
        #[arg(long = "meta")]
        meta: Vec<String>,
        /// Ingest URL (defaults to config `endpoint`)
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Read or change .sherpa/config.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Inspect or change local session preferences
    Prefs {
        /// Storage directory (defaults to the per-user session directory)
        #[arg(long, global = true)]
        dir: Option<PathBuf>,
        #[command(subcommand)]
        cmd: cmd_prefs::PrefsCmd,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SHERPA_LOG").unwrap_or_else(|_| {
        EnvFilter::new("warn,sherpa_serve=info,sherpa_ledger=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let root = std::env::current_dir()?;

    match cli.cmd {
        Command::Serve { bind, port, log } => cmd_serve::execute(&root, bind, port, log),
        Command::Report {
            log,
            top,
            recent,
            json,
        } => cmd_report::execute(&cmd_report::ReportParams {
            root: &root,
            log: log.as_deref(),
            top,
            recent,
            json,
        }),
        Command::Track {
            event,
            from,
            to,
            meta,
            endpoint,
        } => cmd_track::execute(&cmd_track::TrackParams {
            root: &root,
            event: &event,
            from: &from,
            to: to.as_deref(),
            meta: &meta,
            endpoint: endpoint.as_deref(),
        }),
        Command::Config { cmd } => cmd_config::run(cmd, &root),
        Command::Prefs { dir, cmd } => cmd_prefs::run(cmd, &root, dir),
    }
}
