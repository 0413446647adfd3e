//! Activity log: one JSON line per backend event.
//!
//! Records analyses, saves, record fetches, AI calls and errors to
//! `~/.clausescope/activity.jsonl` for later inspection with
//! `clausescope activity`.
//!
//! Logging is off until [`set_enabled`] turns it on (the binary does so
//! from `[logging] enabled`), and every write is best-effort: an unwritable
//! log never fails the operation being logged.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn activity logging on or off for this process.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// Event entry
// ---------------------------------------------------------------------------

/// A single activity log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: String,
    /// `"analyze"`, `"save"`, `"fetch"`, `"ai"` or `"error"`.
    pub kind: String,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub analysis_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl ActivityEvent {
    fn new(kind: &str, success: bool) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind: kind.to_string(),
            success,
            analysis_id: None,
            detail: None,
            latency_ms: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Log a completed clause analysis.
pub fn record_analyze(latency_ms: u64, clause_type: &str, ai_failed: bool) {
    let mut event = ActivityEvent::new("analyze", true);
    event.latency_ms = Some(latency_ms);
    event.detail = Some(if ai_failed {
        format!("{clause_type} (AI unavailable)")
    } else {
        clause_type.to_string()
    });
    record(&event);
}

/// Log a saved analysis.
pub fn record_save(analysis_id: &str) {
    let mut event = ActivityEvent::new("save", true);
    event.analysis_id = Some(analysis_id.to_string());
    record(&event);
}

/// Log a record fetch by id.
pub fn record_fetch(analysis_id: &str, success: bool) {
    let mut event = ActivityEvent::new("fetch", success);
    event.analysis_id = Some(analysis_id.to_string());
    record(&event);
}

/// Log one AI engine round trip.
pub fn record_ai_call(model: &str, latency_ms: u64, error: Option<&str>) {
    let mut event = ActivityEvent::new("ai", error.is_none());
    event.latency_ms = Some(latency_ms);
    event.detail = Some(match error {
        Some(e) => format!("{model}: {e}"),
        None => model.to_string(),
    });
    record(&event);
}

/// Log a failed operation.
pub fn record_error(context: &str, message: &str) {
    let mut event = ActivityEvent::new("error", false);
    event.detail = Some(format!("{context}: {message}"));
    record(&event);
}

fn record(event: &ActivityEvent) {
    if !is_enabled() {
        return;
    }
    if let Some(path) = activity_log_path() {
        let _ = append_event(&path, event);
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// The most recent `limit` events, oldest first. Malformed lines are skipped.
pub fn read_recent(limit: usize) -> Vec<ActivityEvent> {
    activity_log_path()
        .map(|path| read_events(&path, limit))
        .unwrap_or_default()
}

fn read_events(path: &Path, limit: usize) -> Vec<ActivityEvent> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    let events: Vec<ActivityEvent> = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect();

    let skip = events.len().saturating_sub(limit);
    events.into_iter().skip(skip).collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_event(path: &Path, event: &ActivityEvent) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Path of the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    crate::config::home_dir().map(|dir| dir.join("activity.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
