use std::collections::HashMap;

use crate::store::{Intensity, SessionPreferences, TripLength};

const FINDER_MATCH: u32 = 4;
const DEEP_VIEW: u32 = 3;
const MAX_RECENCY_PENALTY: u32 = 2;
const INTENSITY_MATCH: u32 = 2;
const DURATION_MATCH: u32 = 1;

/// Preference score for one candidate.
pub fn score(
    candidate: &str,
    prefs: &SessionPreferences,
    intensity_of: &HashMap<String, Intensity>,
    duration_of: &HashMap<String, TripLength>,
) -> u32 {
    let mut total = 0;
    if prefs.finder_match.as_deref() == Some(candidate) {
        total += FINDER_MATCH;
    }
    if let Some(idx) = prefs.deeply_viewed_slugs.iter().position(|s| s == candidate) {
        let penalty = u32::try_from(idx)
            .unwrap_or(MAX_RECENCY_PENALTY)
            .min(MAX_RECENCY_PENALTY);
        total += DEEP_VIEW - penalty;
    }
    if prefs.preferred_intensity.is_some()
        && intensity_of.get(candidate).copied() == prefs.preferred_intensity
    {
        total += INTENSITY_MATCH;
    }
    if prefs.preferred_duration.is_some()
        && duration_of.get(candidate).copied() == prefs.preferred_duration
    {
        total += DURATION_MATCH;
    }
    total
}

/// Reorder `candidates` by preference score, highest first.
///
/// With no preference signal the input order comes back untouched. Ties keep
/// their input order.
pub fn rank<S: AsRef<str>>(
    candidates: &[S],
    prefs: &SessionPreferences,
    intensity_of: &HashMap<String, Intensity>,
    duration_of: &HashMap<String, TripLength>,
) -> Vec<String> {
    if prefs.is_empty() {
        return candidates.iter().map(|c| c.as_ref().to_string()).collect();
    }
    let mut scored: Vec<(u32, &str)> = candidates
        .iter()
        .map(|c| {
            let c = c.as_ref();
            (score(c, prefs, intensity_of, duration_of), c)
        })
        .collect();
    // `sort_by` is stable.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, c)| c.to_string()).collect()
}
