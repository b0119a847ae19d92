//! Payload builders for in-page instrumentation.
//!
//! These mirror what the page scripts observe: scroll milestones crossed,
//! an FAQ entry opened, a comparison table sorted or filtered, the finder
//! finishing, and a click from one page category to another.

use sherpa_core::{EventKind, Meta, MetaValue};
use sherpa_prefs::{KvStore, PreferenceStore};

use crate::emitter::TrackPayload;

/// Scroll-depth milestones, in percent.
pub const SCROLL_MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Depth at which a detail-page view counts as a deep view.
pub const DEEP_VIEW_DEPTH: u8 = 75;

/// Tracks which scroll milestones a page has already reported.
#[derive(Debug, Clone)]
pub struct ScrollMilestones {
    path: String,
    fired: Vec<u8>,
}

impl ScrollMilestones {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fired: Vec::new(),
        }
    }

    /// Feed the current scroll depth. Returns one `scroll_depth` payload per
    /// milestone crossed for the first time, shallowest first.
    pub fn observe(&mut self, depth_pct: u8) -> Vec<TrackPayload> {
        let mut out = Vec::new();
        for milestone in SCROLL_MILESTONES {
            if depth_pct >= milestone && !self.fired.contains(&milestone) {
                self.fired.push(milestone);
                out.push(behavioral(
                    EventKind::ScrollDepth,
                    &self.path,
                    [("depth", MetaValue::from(u32::from(milestone)))],
                ));
            }
        }
        out
    }

    pub fn reached_deep_view(&self) -> bool {
        self.fired.iter().any(|m| *m >= DEEP_VIEW_DEPTH)
    }

    /// [`observe`](Self::observe) for a detail page: the first time the
    /// deep-view depth is crossed, `slug` is recorded in `prefs`.
    pub fn observe_detail<S: KvStore>(
        &mut self,
        depth_pct: u8,
        slug: &str,
        prefs: &PreferenceStore<S>,
    ) -> Vec<TrackPayload> {
        let was_deep = self.reached_deep_view();
        let out = self.observe(depth_pct);
        if !was_deep && self.reached_deep_view() {
            prefs.record_deep_view(slug);
        }
        out
    }
}

pub fn faq_expanded(path: &str, question: &str) -> TrackPayload {
    behavioral(EventKind::FaqExpand, path, [("question", question.into())])
}

pub fn compare_sorted(path: &str, column: &str, direction: &str) -> TrackPayload {
    behavioral(
        EventKind::CompareSort,
        path,
        [("column", column.into()), ("direction", direction.into())],
    )
}

pub fn compare_filtered(path: &str, key: &str, value: &str) -> TrackPayload {
    behavioral(
        EventKind::CompareFilter,
        path,
        [("key", key.into()), ("value", value.into())],
    )
}

pub fn finder_completed(path: &str, slug: &str) -> TrackPayload {
    behavioral(EventKind::FinderComplete, path, [("match", slug.into())])
}

/// A click from one page to another. Non-navigation kinds are still built;
/// the server will reject them.
pub fn navigation(kind: EventKind, from: &str, to: &str) -> TrackPayload {
    TrackPayload {
        event: kind.as_str().to_string(),
        from: from.to_string(),
        to: Some(to.to_string()),
        meta: None,
    }
}

fn behavioral<const N: usize>(
    kind: EventKind,
    path: &str,
    entries: [(&str, MetaValue); N],
) -> TrackPayload {
    let meta: Meta = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    TrackPayload {
        event: kind.as_str().to_string(),
        from: path.to_string(),
        to: None,
        meta: Some(meta),
    }
}
