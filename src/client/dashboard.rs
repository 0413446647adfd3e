//! Dashboard aggregator: filtered, sorted and summarised saved analyses.
//!
//! The base collection is loaded once and never changes. Every change to
//! the search term or sort key reruns [`compute_view`] from scratch:
//!
//! 1. filter on title, summary or id (case-insensitive substring)
//! 2. stable sort by date or risk score
//! 3. High/Medium/Low statistics
//! 4. per-date activity counts

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{Backend, TransportError};
use crate::protocol::SummaryRecord;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One saved analysis as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Categorical label as stored; may disagree with `risk_score`.
    #[serde(default)]
    pub risk: String,
    /// 0 to 10, read from a display string such as `"6/10"`; 0 when unreadable.
    #[serde(default, deserialize_with = "deserialize_risk_score")]
    pub risk_score: u8,
    #[serde(default)]
    pub date: String,
}

impl From<SummaryRecord> for AnalysisSummary {
    fn from(record: SummaryRecord) -> Self {
        Self {
            risk_score: parse_risk_score(&record.risk_score),
            id: record.id,
            title: record.title,
            summary: record.summary,
            risk: record.risk,
            date: record.date,
        }
    }
}

/// Leading integer of a score display string, clamped to 10. Anything
/// without one reads as 0.
pub fn parse_risk_score(text: &str) -> u8 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    // Too many digits for u64 still means "more than 10".
    digits.parse::<u64>().map_or(10, |n| n.min(10) as u8)
}

fn deserialize_risk_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().map_or(0, |n| n.min(10) as u8),
        Value::String(s) => parse_risk_score(&s),
        _ => 0,
    })
}

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    RiskDesc,
    RiskAsc,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DateDesc => "date-desc",
            Self::DateAsc => "date-asc",
            Self::RiskDesc => "risk-desc",
            Self::RiskAsc => "risk-asc",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "date-desc" => Ok(Self::DateDesc),
            "date-asc" => Ok(Self::DateAsc),
            "risk-desc" => Ok(Self::RiskDesc),
            "risk-asc" => Ok(Self::RiskAsc),
            other => Err(format!(
                "unknown sort key '{other}' (expected date-desc, date-asc, risk-desc or risk-asc)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_term: String,
    pub sort_key: SortKey,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBucket {
    High,
    Medium,
    Low,
}

impl RiskBucket {
    /// Bucket for a record. An exact `High`/`Medium`/`Low` label decides;
    /// any other label falls back to the score (7+ High, 4+ Medium).
    pub fn of(record: &AnalysisSummary) -> Self {
        match record.risk.as_str() {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            _ if record.risk_score >= 7 => Self::High,
            _ if record.risk_score >= 4 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskStats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Chart-ready `{ labels, values }` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

/// Result of one full recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub records: Vec<AnalysisSummary>,
    pub stats: RiskStats,
    pub risk_distribution: ChartSeries,
    pub activity: ChartSeries,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Filter, sort and aggregate `base` under `filter`.
pub fn compute_view(base: &[AnalysisSummary], filter: &FilterState) -> DashboardView {
    let mut records = filter_records(base, &filter.search_term);
    sort_records(&mut records, filter.sort_key);

    let stats = risk_stats(&records);
    let risk_distribution = ChartSeries {
        labels: vec!["High".into(), "Medium".into(), "Low".into()],
        values: vec![stats.high, stats.medium, stats.low],
    };
    let activity = activity_series(&records);

    DashboardView {
        records,
        stats,
        risk_distribution,
        activity,
    }
}

fn filter_records(base: &[AnalysisSummary], search_term: &str) -> Vec<AnalysisSummary> {
    let needle = search_term.to_lowercase();
    base.iter()
        .filter(|r| {
            needle.is_empty()
                || r.title.to_lowercase().contains(&needle)
                || r.summary.to_lowercase().contains(&needle)
                || r.id.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Stable in every key; equal keys keep filter order.
fn sort_records(records: &mut [AnalysisSummary], key: SortKey) {
    match key {
        SortKey::DateDesc => records.sort_by_cached_key(|r| std::cmp::Reverse(parse_date(&r.date))),
        SortKey::DateAsc => records.sort_by_cached_key(|r| parse_date(&r.date)),
        SortKey::RiskDesc => records.sort_by(|a, b| b.risk_score.cmp(&a.risk_score)),
        SortKey::RiskAsc => records.sort_by(|a, b| a.risk_score.cmp(&b.risk_score)),
    }
}

/// Parse a record date. `None` orders before every real date, so
/// unparseable dates sort as the oldest.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y%m%d_%H%M%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn risk_stats(records: &[AnalysisSummary]) -> RiskStats {
    records.iter().fold(
        RiskStats {
            total: records.len(),
            ..RiskStats::default()
        },
        |mut stats, record| {
            match RiskBucket::of(record) {
                RiskBucket::High => stats.high += 1,
                RiskBucket::Medium => stats.medium += 1,
                RiskBucket::Low => stats.low += 1,
            }
            stats
        },
    )
}

/// Count per literal date string, in ascending string order.
fn activity_series(records: &[AnalysisSummary]) -> ChartSeries {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.date.as_str()).or_default() += 1;
    }
    let (labels, values) = counts
        .into_iter()
        .map(|(date, count)| (date.to_string(), count))
        .unzip();
    ChartSeries { labels, values }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// An immutable base collection plus the current filter.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    base: Vec<AnalysisSummary>,
    filter: FilterState,
}

impl Dashboard {
    pub fn new(base: Vec<AnalysisSummary>) -> Self {
        Self {
            base,
            filter: FilterState::default(),
        }
    }

    /// Load the base collection from a backend.
    pub fn load<B: Backend + ?Sized>(backend: &B) -> Result<Self, TransportError> {
        Ok(Self::new(backend.list()?))
    }

    pub fn base(&self) -> &[AnalysisSummary] {
        &self.base
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_search(&mut self, term: &str) -> DashboardView {
        self.filter.search_term = term.to_string();
        self.view()
    }

    pub fn set_sort(&mut self, key: SortKey) -> DashboardView {
        self.filter.sort_key = key;
        self.view()
    }

    pub fn view(&self) -> DashboardView {
        compute_view(&self.base, &self.filter)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
