//! Offline summary of the event log.
//!
//! Reads `events.jsonl` line by line. A missing file is an empty report; a
//! line that does not parse is counted as skipped and otherwise ignored.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use sherpa_core::{EventKind, LoggedEvent, MetaValue};

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Length limit for ranked lists (FAQ questions, paths, ...).
    pub top: usize,
    /// Number of most recent events to keep.
    pub recent: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top: 10,
            recent: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub total: usize,
    pub skipped: usize,
    pub by_kind: Vec<Count>,
    /// Ordered by depth, shallowest first.
    pub scroll_depth: Vec<Count>,
    pub faq_questions: Vec<Count>,
    pub compare_sorts: Vec<Count>,
    pub compare_filters: Vec<Count>,
    pub finder_matches: Vec<Count>,
    pub top_navigation: Vec<Count>,
    pub top_destinations: Vec<Count>,
    pub top_sources: Vec<Count>,
    /// Newest first.
    pub recent: Vec<LoggedEvent>,
}

impl Report {
    /// Build a report from the log at `path`.
    pub fn load(path: &Path, opts: ReportOptions) -> anyhow::Result<Self> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let mut builder = Builder::new(opts);
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            match std::str::from_utf8(&buf) {
                Ok(line) => builder.push_line(line),
                Err(_) => builder.skipped += 1,
            }
        }
        Ok(builder.finish())
    }

    pub fn from_lines<I, L>(lines: I, opts: ReportOptions) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut builder = Builder::new(opts);
        for line in lines {
            builder.push_line(line.as_ref());
        }
        builder.finish()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

// ── Aggregation ──

#[derive(Default)]
struct Tally(HashMap<String, usize>);

impl Tally {
    fn add(&mut self, key: impl Into<String>) {
        *self.0.entry(key.into()).or_insert(0) += 1;
    }

    /// Count descending, then key ascending; `limit == 0` keeps everything.
    fn ranked(self, limit: usize) -> Vec<Count> {
        let mut out: Vec<Count> = self
            .0
            .into_iter()
            .map(|(key, count)| Count { key, count })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        if limit > 0 {
            out.truncate(limit);
        }
        out
    }
}

struct Builder {
    opts: ReportOptions,
    total: usize,
    skipped: usize,
    by_kind: Tally,
    depths: HashMap<u64, (f64, usize)>,
    faq_questions: Tally,
    compare_sorts: Tally,
    compare_filters: Tally,
    finder_matches: Tally,
    navigation: Tally,
    destinations: Tally,
    sources: Tally,
    recent: VecDeque<LoggedEvent>,
}

impl Builder {
    fn new(opts: ReportOptions) -> Self {
        Self {
            opts,
            total: 0,
            skipped: 0,
            by_kind: Tally::default(),
            depths: HashMap::new(),
            faq_questions: Tally::default(),
            compare_sorts: Tally::default(),
            compare_filters: Tally::default(),
            finder_matches: Tally::default(),
            navigation: Tally::default(),
            destinations: Tally::default(),
            sources: Tally::default(),
            recent: VecDeque::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match serde_json::from_str::<LoggedEvent>(line) {
            Ok(event) => self.push(event),
            Err(_) => self.skipped += 1,
        }
    }

    fn push(&mut self, event: LoggedEvent) {
        self.total += 1;
        self.by_kind.add(event.event.as_str());
        self.sources.add(event.from.as_str());
        if let Some(to) = &event.to {
            self.destinations.add(to.as_str());
        }

        match event.kind() {
            Some(kind) if kind.is_navigation() => {
                if let Some(to) = &event.to {
                    self.navigation.add(format!("{} → {}", event.from, to));
                }
            }
            Some(EventKind::ScrollDepth) => {
                if let Some(depth) = event.meta_value("depth").and_then(depth_value) {
                    let slot = self.depths.entry(depth.to_bits()).or_insert((depth, 0));
                    slot.1 += 1;
                }
            }
            Some(EventKind::FaqExpand) => {
                if let Some(q) = event.meta_value("question") {
                    self.faq_questions.add(q.to_string());
                }
            }
            Some(EventKind::CompareSort) => {
                if let Some(col) = event.meta_value("column") {
                    self.compare_sorts.add(col.to_string());
                }
            }
            Some(EventKind::CompareFilter) => {
                if let (Some(k), Some(v)) = (event.meta_value("key"), event.meta_value("value")) {
                    self.compare_filters.add(format!("{k}={v}"));
                }
            }
            Some(EventKind::FinderComplete) => {
                if let Some(m) = event.meta_value("match") {
                    self.finder_matches.add(m.to_string());
                }
            }
            _ => {}
        }

        if self.opts.recent > 0 {
            if self.recent.len() == self.opts.recent {
                self.recent.pop_front();
            }
            self.recent.push_back(event);
        }
    }

    fn finish(self) -> Report {
        let top = self.opts.top;
        let mut depths: Vec<(f64, usize)> = self.depths.into_values().collect();
        depths.sort_by(|a, b| a.0.total_cmp(&b.0));
        Report {
            total: self.total,
            skipped: self.skipped,
            by_kind: self.by_kind.ranked(0),
            scroll_depth: depths
                .into_iter()
                .map(|(d, count)| Count {
                    key: format!("{}%", format_depth(d)),
                    count,
                })
                .collect(),
            faq_questions: self.faq_questions.ranked(top),
            compare_sorts: self.compare_sorts.ranked(top),
            compare_filters: self.compare_filters.ranked(top),
            finder_matches: self.finder_matches.ranked(top),
            top_navigation: self.navigation.ranked(top),
            top_destinations: self.destinations.ranked(top),
            top_sources: self.sources.ranked(top),
            recent: self.recent.into_iter().rev().collect(),
        }
    }
}

/// Depth as a number, accepting numeric strings from hand-edited logs.
fn depth_value(v: &MetaValue) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim_end_matches('%').parse().ok()))
        .filter(|d: &f64| d.is_finite())
}

fn format_depth(d: f64) -> String {
    if d.fract() == 0.0 {
        format!("{}", d as i64)
    } else {
        format!("{d}")
    }
}

// ── Rendering ──

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, counts: &[Count]) -> fmt::Result {
    if counts.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "{title}")?;
    let width = counts
        .iter()
        .map(|c| c.key.chars().count())
        .max()
        .unwrap_or(0)
        .min(60);
    for c in counts {
        writeln!(f, "  {:<width$}  {:>6}", c.key, c.count)?;
    }
    Ok(())
}

fn short_ts(ts: &str) -> String {
    // "2026-10-16T08:42:00Z" -> "2026-10-16 08:42"
    match (ts.get(..10), ts.get(11..16)) {
        (Some(date), Some(time)) => format!("{date} {time}"),
        _ => ts.to_string(),
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Telemetry report")?;
        writeln!(f, "================")?;
        if self.skipped > 0 {
            writeln!(
                f,
                "events: {} ({} malformed line{} skipped)",
                self.total,
                self.skipped,
                if self.skipped == 1 { "" } else { "s" }
            )?;
        } else {
            writeln!(f, "events: {}", self.total)?;
        }
        if self.is_empty() {
            return writeln!(f, "No events recorded.");
        }

        write_section(f, "By kind", &self.by_kind)?;
        write_section(f, "Scroll depth", &self.scroll_depth)?;
        write_section(f, "FAQ questions opened", &self.faq_questions)?;
        write_section(f, "Comparison sorts", &self.compare_sorts)?;
        write_section(f, "Comparison filters", &self.compare_filters)?;
        write_section(f, "Finder matches", &self.finder_matches)?;
        write_section(f, "Top navigation paths", &self.top_navigation)?;
        write_section(f, "Top destinations", &self.top_destinations)?;
        write_section(f, "Top sources", &self.top_sources)?;

        if !self.recent.is_empty() {
            writeln!(f)?;
            writeln!(f, "Recent (newest first)")?;
            for e in &self.recent {
                match &e.to {
                    Some(to) => writeln!(
                        f,
                        "  [{}] {:<22} {} → {}",
                        short_ts(&e.ts),
                        e.event,
                        e.from,
                        to
                    )?,
                    None => writeln!(f, "  [{}] {:<22} {}", short_ts(&e.ts), e.event, e.from)?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCROLL_50: &str =
        r#"{"event":"scroll_depth","from":"/x","meta":{"depth":50},"ts":"2026-10-16T08:00:00Z"}"#;

    fn line(event: &str, from: &str, to: Option<&str>, meta: serde_json::Value, ts: &str) -> String {
        let mut v = serde_json::json!({"event": event, "from": from, "ts": ts});
        if let Some(to) = to {
            v["to"] = serde_json::json!(to);
        }
        if !meta.is_null() {
            v["meta"] = meta;
        }
        v.to_string()
    }

    #[test]
    fn malformed_line_is_skipped() {
        let lines = [SCROLL_50, SCROLL_50, "{\"event\":", SCROLL_50];
        let report = Report::from_lines(lines, ReportOptions::default());
        assert_eq!(report.total, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            report.scroll_depth,
            vec![Count {
                key: "50%".into(),
                count: 3
            }]
        );
        assert!(report.to_string().contains("50%"));
    }

    #[test]
    fn missing_file_is_empty_report() {
        let tmp = tempfile::tempdir().unwrap();
        let report = Report::load(&tmp.path().join("absent.jsonl"), ReportOptions::default())
            .unwrap();
        assert!(report.is_empty());
        assert!(report.to_string().contains("No events recorded."));
    }

    #[test]
    fn load_reads_file_and_tolerates_bad_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("events.jsonl");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(SCROLL_50.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.push(b'\n');
        bytes.extend_from_slice(SCROLL_50.as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let report = Report::load(&path, ReportOptions::default()).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn histogram_orders_by_depth() {
        let lines: Vec<String> = [100, 25, 75, 25, 50]
            .iter()
            .map(|d| line("scroll_depth", "/j", None, serde_json::json!({"depth": d}), "2026-10-16T08:00:00Z"))
            .collect();
        let report = Report::from_lines(&lines, ReportOptions::default());
        let keys: Vec<&str> = report.scroll_depth.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["25%", "50%", "75%", "100%"]);
        assert_eq!(report.scroll_depth[0].count, 2);
    }

    #[test]
    fn navigation_and_page_rankings() {
        let ts = "2026-10-16T08:00:00Z";
        let lines = vec![
            line("blog_to_journey", "/blog/a", Some("/journeys/x"), serde_json::Value::Null, ts),
            line("blog_to_journey", "/blog/a", Some("/journeys/x"), serde_json::Value::Null, ts),
            line("topic_to_pillar", "/topics/t", Some("/retreats"), serde_json::Value::Null, ts),
            line("faq_expand", "/journeys/x", None, serde_json::json!({"question": "Permits?"}), ts),
        ];
        let report = Report::from_lines(&lines, ReportOptions::default());

        assert_eq!(report.top_navigation[0].key, "/blog/a → /journeys/x");
        assert_eq!(report.top_navigation[0].count, 2);
        assert_eq!(report.top_navigation.len(), 2);
        assert_eq!(report.top_destinations[0].key, "/journeys/x");
        assert_eq!(report.top_sources[0].key, "/blog/a");
        assert_eq!(report.faq_questions[0].key, "Permits?");
        assert_eq!(
            report.by_kind[0],
            Count {
                key: "blog_to_journey".into(),
                count: 2
            }
        );
    }

    #[test]
    fn behavioral_breakdowns() {
        let ts = "2026-10-16T08:00:00Z";
        let lines = vec![
            line("compare_sort", "/compare", None, serde_json::json!({"column": "price"}), ts),
            line("compare_sort", "/compare", None, serde_json::json!({"column": "altitude"}), ts),
            line("compare_sort", "/compare", None, serde_json::json!({"column": "price"}), ts),
            line("compare_filter", "/compare", None, serde_json::json!({"key": "intensity", "value": "low"}), ts),
            line("finder_complete", "/finder", None, serde_json::json!({"match": "langtang-valley"}), ts),
        ];
        let report = Report::from_lines(&lines, ReportOptions::default());
        assert_eq!(report.compare_sorts[0], Count { key: "price".into(), count: 2 });
        assert_eq!(report.compare_sorts[1].key, "altitude");
        assert_eq!(report.compare_filters[0].key, "intensity=low");
        assert_eq!(report.finder_matches[0].key, "langtang-valley");
    }

    #[test]
    fn recent_is_newest_first_and_bounded() {
        let lines: Vec<String> = (0..5)
            .map(|i| {
                line(
                    "scroll_depth",
                    &format!("/p{i}"),
                    None,
                    serde_json::json!({"depth": 25}),
                    &format!("2026-10-16T08:0{i}:00Z"),
                )
            })
            .collect();
        let report = Report::from_lines(&lines, ReportOptions { top: 10, recent: 3 });
        let froms: Vec<&str> = report.recent.iter().map(|e| e.from.as_str()).collect();
        assert_eq!(froms, vec!["/p4", "/p3", "/p2"]);
        assert!(report.to_string().contains("[2026-10-16 08:04] scroll_depth"));
    }

    #[test]
    fn top_limit_truncates_with_stable_tie_break() {
        let ts = "2026-10-16T08:00:00Z";
        let lines: Vec<String> = ["/c", "/a", "/b", "/a"]
            .iter()
            .map(|p| line("faq_expand", p, None, serde_json::Value::Null, ts))
            .collect();
        let report = Report::from_lines(&lines, ReportOptions { top: 2, recent: 0 });
        let keys: Vec<&str> = report.top_sources.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["/a", "/b"]);
        assert!(report.recent.is_empty());
    }

    #[test]
    fn unknown_kinds_still_count() {
        let lines = [r#"{"event":"legacy_click","from":"/old","ts":"2026-01-01T00:00:00Z"}"#];
        let report = Report::from_lines(lines, ReportOptions::default());
        assert_eq!(report.total, 1);
        assert_eq!(report.by_kind[0].key, "legacy_click");
    }

    #[test]
    fn report_serializes_to_json() {
        let report = Report::from_lines([SCROLL_50], ReportOptions::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["scroll_depth"][0]["key"], "50%");
        assert_eq!(json["recent"][0]["meta"]["depth"], 50);
    }
}
