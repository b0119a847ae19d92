use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page categories a visitor can move between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCategory {
    Topic,
    Pillar,
    Blog,
    Journey,
    Comparison,
}

impl PageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageCategory::Topic => "topic",
            PageCategory::Pillar => "pillar",
            PageCategory::Blog => "blog",
            PageCategory::Journey => "journey",
            PageCategory::Comparison => "comparison",
        }
    }
}

/// Recognized telemetry event kinds.
///
/// Navigation kinds record a page-to-page transition and always carry a
/// destination path. Behavioral kinds record an in-page interaction and carry
/// auxiliary `meta` data instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // ── navigation ──
    TopicToPillar,
    TopicToJourney,
    PillarToJourney,
    BlogToJourney,
    BlogToPillar,
    ComparisonToJourney,
    // ── behavioral ──
    ScrollDepth,
    FaqExpand,
    CompareSort,
    CompareFilter,
    FinderComplete,
}

impl EventKind {
    pub const ALL: [EventKind; 11] = [
        EventKind::TopicToPillar,
        EventKind::TopicToJourney,
        EventKind::PillarToJourney,
        EventKind::BlogToJourney,
        EventKind::BlogToPillar,
        EventKind::ComparisonToJourney,
        EventKind::ScrollDepth,
        EventKind::FaqExpand,
        EventKind::CompareSort,
        EventKind::CompareFilter,
        EventKind::FinderComplete,
    ];

    /// Wire name, as written to the log and accepted by the ingest endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TopicToPillar => "topic_to_pillar",
            EventKind::TopicToJourney => "topic_to_journey",
            EventKind::PillarToJourney => "pillar_to_journey",
            EventKind::BlogToJourney => "blog_to_journey",
            EventKind::BlogToPillar => "blog_to_pillar",
            EventKind::ComparisonToJourney => "comparison_to_journey",
            EventKind::ScrollDepth => "scroll_depth",
            EventKind::FaqExpand => "faq_expand",
            EventKind::CompareSort => "compare_sort",
            EventKind::CompareFilter => "compare_filter",
            EventKind::FinderComplete => "finder_complete",
        }
    }

    /// `(source, destination)` categories for navigation kinds, `None` for behavioral ones.
    pub fn transition(&self) -> Option<(PageCategory, PageCategory)> {
        use PageCategory::*;
        match self {
            EventKind::TopicToPillar => Some((Topic, Pillar)),
            EventKind::TopicToJourney => Some((Topic, Journey)),
            EventKind::PillarToJourney => Some((Pillar, Journey)),
            EventKind::BlogToJourney => Some((Blog, Journey)),
            EventKind::BlogToPillar => Some((Blog, Pillar)),
            EventKind::ComparisonToJourney => Some((Comparison, Journey)),
            _ => None,
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.transition().is_some()
    }

    pub fn is_behavioral(&self) -> bool {
        !self.is_navigation()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a string that names no recognized kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized event kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
