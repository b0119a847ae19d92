use clap::Subcommand;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sherpa_ledger::{SherpaConfig, SherpaPaths};
use sherpa_prefs::{
    ExpiryPolicy, FileStore, Intensity, PreferenceStore, PreferencesUpdate, SessionPreferences,
    TripLength,
};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum PrefsCmd {
    /// Show the current (unexpired) preferences
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget all preferences
    Clear,
    /// Record a deep view of an item
    View {
        /// Item slug
        slug: String,
    },
    /// Record a finder result
    Finder {
        /// Item slug
        slug: String,
    },
    /// Set preferred intensity and/or duration
    Set {
        /// low, medium, or high
        #[arg(long)]
        intensity: Option<Intensity>,
        /// short, long, or flexible
        #[arg(long)]
        duration: Option<TripLength>,
    },
    /// Rank candidate slugs by the current preferences
    Rank {
        /// Candidate slugs, in default order
        #[arg(required = true)]
        candidates: Vec<String>,
        /// Item labels as slug:intensity:duration (either label may be empty)
        #[arg(long = "item")]
        items: Vec<String>,
    },
}

// ── Dispatch ──

pub fn run(cmd: PrefsCmd, root: &Path, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let ttl_hours = SherpaConfig::load(&SherpaPaths::discover(root)).prefs_ttl_hours;
    let dir = dir.unwrap_or_else(sherpa_store::session_dir);
    let store =
        PreferenceStore::new(FileStore::new(dir)).with_policy(ExpiryPolicy::hours(ttl_hours));

    match cmd {
        PrefsCmd::Show { json } => {
            let prefs = store.read();
            if json {
                println!("{}", serde_json::to_string_pretty(&prefs)?);
            } else {
                print_prefs(&prefs);
            }
        }
        PrefsCmd::Clear => {
            store.clear();
            println!("preferences cleared");
        }
        PrefsCmd::View { slug } => print_prefs(&store.record_deep_view(&slug)),
        PrefsCmd::Finder { slug } => print_prefs(&store.record_finder_match(&slug)),
        PrefsCmd::Set {
            intensity,
            duration,
        } => {
            if intensity.is_none() && duration.is_none() {
                anyhow::bail!("nothing to set (use --intensity and/or --duration)");
            }
            print_prefs(&store.write(PreferencesUpdate {
                preferred_intensity: intensity,
                preferred_duration: duration,
                ..Default::default()
            }));
        }
        PrefsCmd::Rank { candidates, items } => {
            let prefs = store.read();
            let (intensity_of, duration_of) = parse_items(&items)?;
            let ranked = sherpa_prefs::rank(&candidates, &prefs, &intensity_of, &duration_of);
            for (i, slug) in ranked.iter().enumerate() {
                let score = sherpa_prefs::score(slug, &prefs, &intensity_of, &duration_of);
                println!("{:>2}. {slug}  (score {score})", i + 1);
            }
        }
    }
    Ok(())
}

// ── Helpers ──

type Labels = (HashMap<String, Intensity>, HashMap<String, TripLength>);

/// Parse `slug:intensity:duration` labels.
fn parse_items(items: &[String]) -> anyhow::Result<Labels> {
    let mut intensity_of = HashMap::new();
    let mut duration_of = HashMap::new();
    for item in items {
        let mut parts = item.split(':');
        let slug = parts.next().unwrap_or_default().trim();
        if slug.is_empty() {
            anyhow::bail!("--item needs a slug (got \"{item}\")");
        }
        if let Some(i) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
            intensity_of.insert(slug.to_string(), i.parse::<Intensity>()?);
        }
        if let Some(d) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
            duration_of.insert(slug.to_string(), d.parse::<TripLength>()?);
        }
        if parts.next().is_some() {
            anyhow::bail!("--item has too many fields: \"{item}\"");
        }
    }
    Ok((intensity_of, duration_of))
}

fn print_prefs(prefs: &SessionPreferences) {
    if prefs.is_empty() {
        println!("(no preferences)");
        return;
    }
    let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    println!(
        "intensity:    {}",
        show(prefs.preferred_intensity.map(|i| i.to_string()))
    );
    println!(
        "duration:     {}",
        show(prefs.preferred_duration.map(|d| d.to_string()))
    );
    println!("finder match: {}", show(prefs.finder_match.clone()));
    if prefs.deeply_viewed_slugs.is_empty() {
        println!("deep views:   -");
    } else {
        println!("deep views:   {}", prefs.deeply_viewed_slugs.join(", "));
    }
    if let Some(ts) = &prefs.last_updated {
        println!("updated:      {ts}");
    }
}
