//! Session preferences held on the client.
//!
//! The whole record lives under one key and is rewritten on every change.
//! A record older than the TTL reads as empty and is cleared. Storage
//! failures degrade to "no preference"; nothing here returns an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::kv::KvStore;

pub const PREFS_KEY: &str = "sherpa_session_prefs";
pub const MAX_DEEP_VIEWS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {what}: {value}")]
pub struct UnknownLabel {
    what: &'static str,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Medium => "medium",
            Intensity::High => "high",
        }
    }
}

impl FromStr for Intensity {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            _ => Err(UnknownLabel {
                what: "intensity",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preferred trip length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripLength {
    Short,
    Long,
    Flexible,
}

impl TripLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripLength::Short => "short",
            TripLength::Long => "long",
            TripLength::Flexible => "flexible",
        }
    }
}

impl FromStr for TripLength {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(TripLength::Short),
            "long" => Ok(TripLength::Long),
            "flexible" => Ok(TripLength::Flexible),
            _ => Err(UnknownLabel {
                what: "duration",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TripLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inferred affinities for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_intensity: Option<Intensity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_duration: Option<TripLength>,
    /// Most recent first, deduplicated, at most [`MAX_DEEP_VIEWS`].
    #[serde(default)]
    pub deeply_viewed_slugs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finder_match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl SessionPreferences {
    /// True when there is no signal to rank by.
    pub fn is_empty(&self) -> bool {
        self.preferred_intensity.is_none()
            && self.preferred_duration.is_none()
            && self.deeply_viewed_slugs.is_empty()
            && self.finder_match.is_none()
    }
}

/// Partial update merged by [`PreferenceStore::write`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub preferred_intensity: Option<Intensity>,
    pub preferred_duration: Option<TripLength>,
    pub deeply_viewed_slugs: Option<Vec<String>>,
    pub finder_match: Option<String>,
}

/// Age limit for a stored record, evaluated on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: time::Duration,
}

impl ExpiryPolicy {
    pub fn new(ttl: time::Duration) -> Self {
        Self { ttl }
    }

    pub fn hours(h: u64) -> Self {
        Self::new(time::Duration::hours(i64::try_from(h).unwrap_or(i64::MAX / 3600)))
    }

    pub fn ttl(&self) -> time::Duration {
        self.ttl
    }

    pub fn is_expired(&self, last_updated: OffsetDateTime, now: OffsetDateTime) -> bool {
        now - last_updated > self.ttl
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::hours(24)
    }
}

/// Read-modify-write access to the stored [`SessionPreferences`].
///
/// Not atomic across writers; one client context is assumed.
pub struct PreferenceStore<S> {
    backend: S,
    policy: ExpiryPolicy,
}

impl<S: KvStore> PreferenceStore<S> {
    pub fn new(backend: S) -> Self {
        Self {
            backend,
            policy: ExpiryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn read(&self) -> SessionPreferences {
        self.read_at(OffsetDateTime::now_utc())
    }

    /// Current record as of `now`. Missing, unparseable, undated, or expired
    /// records read as the empty default; the last three are also cleared.
    pub fn read_at(&self, now: OffsetDateTime) -> SessionPreferences {
        let Some(raw) = self.backend.get(PREFS_KEY) else {
            return SessionPreferences::default();
        };
        let prefs: SessionPreferences = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(error = %e, "discarding unparseable preferences");
                self.backend.clear(PREFS_KEY);
                return SessionPreferences::default();
            }
        };
        let last_updated = prefs
            .last_updated
            .as_deref()
            .and_then(|ts| OffsetDateTime::parse(ts, &Rfc3339).ok());
        match last_updated {
            Some(ts) if !self.policy.is_expired(ts, now) => prefs,
            _ => {
                self.backend.clear(PREFS_KEY);
                SessionPreferences::default()
            }
        }
    }

    pub fn write(&self, update: PreferencesUpdate) -> SessionPreferences {
        self.write_at(update, OffsetDateTime::now_utc())
    }

    /// Merge `update` into the current record and persist it stamped with
    /// `now`. Returns the merged record even if persisting failed.
    pub fn write_at(&self, update: PreferencesUpdate, now: OffsetDateTime) -> SessionPreferences {
        let mut prefs = self.read_at(now);
        if let Some(i) = update.preferred_intensity {
            prefs.preferred_intensity = Some(i);
        }
        if let Some(d) = update.preferred_duration {
            prefs.preferred_duration = Some(d);
        }
        if let Some(slugs) = update.deeply_viewed_slugs {
            prefs.deeply_viewed_slugs = slugs;
        }
        if let Some(m) = update.finder_match {
            prefs.finder_match = Some(m);
        }
        prefs.last_updated = now.format(&Rfc3339).ok();

        match serde_json::to_string(&prefs) {
            Ok(json) => {
                if let Err(e) = self.backend.set(PREFS_KEY, &json) {
                    tracing::debug!(error = %e, "preferences not persisted");
                }
            }
            Err(e) => tracing::debug!(error = %e, "cannot encode preferences"),
        }
        prefs
    }

    /// Move `slug` to the front of the deep-view list.
    pub fn record_deep_view(&self, slug: &str) -> SessionPreferences {
        self.record_deep_view_at(slug, OffsetDateTime::now_utc())
    }

    pub fn record_deep_view_at(&self, slug: &str, now: OffsetDateTime) -> SessionPreferences {
        let mut slugs = self.read_at(now).deeply_viewed_slugs;
        slugs.retain(|s| s != slug);
        slugs.insert(0, slug.to_string());
        slugs.truncate(MAX_DEEP_VIEWS);
        self.write_at(
            PreferencesUpdate {
                deeply_viewed_slugs: Some(slugs),
                ..Default::default()
            },
            now,
        )
    }

    pub fn record_finder_match(&self, slug: &str) -> SessionPreferences {
        self.write(PreferencesUpdate {
            finder_match: Some(slug.to_string()),
            ..Default::default()
        })
    }

    pub fn clear(&self) {
        self.backend.clear(PREFS_KEY);
    }
}
