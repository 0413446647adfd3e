//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `clausescope analyze`: analyze one clause, optionally save it
//! - `clausescope dashboard`: search, sort and summarise saved analyses
//! - `clausescope show ID`: one saved analysis in full
//! - `clausescope serve`: run the HTTP backend
//! - `clausescope activity`: recent backend events
//! - `clausescope health`: configuration and service status
//! - `clausescope config show|init|set|reset`: configuration management
//!
//! Every command goes through the same client core the web page mirrors:
//! a [`Backend`] chosen from `[client] backend_url`, driven by the
//! submission controller, dashboard aggregator or detail viewer.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::activity::{self, ActivityEvent};
use crate::client::dashboard::{DashboardView, RiskBucket};
use crate::client::detail::DetailContent;
use crate::client::render::{AiPanel, DetailView, ResultsPanel};
use crate::client::submission::{SubmissionState, SubmitError};
use crate::client::{
    Backend, Dashboard, DetailViewer, HttpBackend, LocalBackend, SortKey, SubmissionController,
};
use crate::config::{self, ClauseScopeConfig};
use crate::protocol::HealthReport;
use crate::web;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// The backend named by `[client] backend_url`, or the in-process one.
fn open_backend(cfg: &ClauseScopeConfig) -> Result<Box<dyn Backend>> {
    if cfg.client.backend_url.trim().is_empty() {
        let backend = LocalBackend::from_config(cfg).context("failed to open record store")?;
        Ok(Box::new(backend))
    } else {
        Ok(Box::new(HttpBackend::from_config(cfg)))
    }
}

// ---------------------------------------------------------------------------
// clausescope analyze
// ---------------------------------------------------------------------------

/// Where the clause text comes from.
pub enum ClauseSource<'a> {
    Text(&'a str),
    File(&'a Path),
    Stdin,
}

fn read_clause(source: ClauseSource<'_>) -> Result<String> {
    match source {
        ClauseSource::Text(text) => Ok(text.to_string()),
        ClauseSource::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        ClauseSource::Stdin => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read clause from stdin")?;
            Ok(buf)
        }
    }
}

/// Analyze one clause and print both results.
pub fn run_analyze(source: ClauseSource<'_>, save: bool, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let backend = open_backend(&cfg)?;
    let text = read_clause(source)?;

    let controller = submit_clause(backend.as_ref(), &text, save)?;
    let view = controller.view(Instant::now());
    let Some(results) = view.results else {
        bail!("the backend returned no analysis");
    };

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "analysis": controller.state().result(),
                "analysisId": view.saved_id,
                "elapsedMs": view.elapsed.map(|d| d.as_millis() as u64),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_results_csv(&results),
        OutputFormat::Table => {
            print_results_table(&results, view.elapsed);
            if let Some(id) = &view.saved_id {
                println!();
                println!("{} Saved as {}", "✓".green().bold(), id.bold());
            }
        }
    }
    Ok(())
}

/// Analyze `text`, then save it when asked and the analysis succeeded.
///
/// Fails with the classified message of whichever request went wrong.
fn submit_clause<B: Backend + ?Sized>(
    backend: &B,
    text: &str,
    save: bool,
) -> Result<SubmissionController> {
    let mut controller = SubmissionController::new();
    match controller.run_submit(backend, text) {
        Ok(()) => {}
        Err(SubmitError::Invalid(e)) => bail!("{e}"),
        Err(e) => return Err(e.into()),
    }
    if save && matches!(controller.state(), SubmissionState::Displaying { .. }) {
        controller.run_save(backend)?;
    }

    if let Some(error) = controller.view(Instant::now()).error {
        match &error.detail {
            Some(detail) => bail!("{}\n  {}", error.message, detail.dimmed()),
            None => bail!("{}", error.message),
        }
    }
    Ok(controller)
}

fn print_results_table(results: &ResultsPanel, elapsed: Option<Duration>) {
    println!("{}", "Clause Analysis".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {}", truncate(&results.clause_text, 200).dimmed());
    println!();

    let rule = &results.rule;
    println!("{}", "Rule-Based".bold().cyan());
    println!("  {} {}", "Clause type:".bold(), rule.clause_type);
    println!("  {} {}", "Risk score: ".bold(), rule.risk_score);
    println!("  {}", "Flags:".bold());
    for flag in &rule.flags {
        println!("    - {flag}");
    }
    println!("  {} {}", "Summary:    ".bold(), rule.summary);
    println!();

    println!("{}", "AI-Based".bold().cyan());
    print_ai_panel(&results.ai);

    if let Some(elapsed) = elapsed {
        println!();
        println!("  {}", format!("Completed in {:.1}s", elapsed.as_secs_f64()).dimmed());
    }
}

fn print_ai_panel(ai: &AiPanel) {
    match ai {
        AiPanel::Error { message } => println!("  {} {}", "Unavailable:".yellow().bold(), message),
        AiPanel::Analysis {
            clause_type,
            risk_level,
            key_terms,
            summary,
            recommendations,
        } => {
            println!("  {} {}", "Clause type:".bold(), clause_type);
            println!("  {} {}", "Risk level: ".bold(), colorize_risk(risk_level));
            println!("  {} {}", "Key terms:  ".bold(), key_terms);
            println!("  {} {}", "Summary:    ".bold(), summary);
            println!("  {}", "Recommendations:".bold());
            for rec in recommendations {
                println!("    - {rec}");
            }
        }
    }
}

fn print_results_csv(results: &ResultsPanel) {
    println!("clause_type,risk_score,flags,ai_risk_level");
    let ai_risk = match &results.ai {
        AiPanel::Analysis { risk_level, .. } => risk_level.as_str(),
        AiPanel::Error { .. } => "",
    };
    println!(
        "{},{},{},{}",
        csv_field(&results.rule.clause_type),
        csv_field(&results.rule.risk_score),
        csv_field(&results.rule.flags.join("; ")),
        csv_field(ai_risk),
    );
}

// ---------------------------------------------------------------------------
// clausescope dashboard
// ---------------------------------------------------------------------------

/// List saved analyses with statistics.
pub fn run_dashboard(search: Option<&str>, sort: &str, format: OutputFormat) -> Result<()> {
    let sort_key: SortKey = sort.parse().map_err(anyhow::Error::msg)?;
    let cfg = config::load();
    let backend = open_backend(&cfg)?;

    let mut dashboard = Dashboard::load(backend.as_ref()).context("failed to load analyses")?;
    dashboard.set_search(search.unwrap_or(""));
    let view = dashboard.set_sort(sort_key);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Csv => print_dashboard_csv(&view),
        OutputFormat::Table => print_dashboard_table(&view, dashboard.base().len()),
    }
    Ok(())
}

fn print_dashboard_table(view: &DashboardView, base_len: usize) {
    println!("{}", "Saved Analyses".bold().cyan());
    println!("{}", "=".repeat(72));

    if view.records.is_empty() {
        let hint = if base_len == 0 {
            "No analyses saved yet. Run `clausescope analyze --save` to add one."
        } else {
            "No analyses match the search."
        };
        println!("{}", hint.yellow());
        return;
    }

    let stats = &view.stats;
    println!(
        "  {} {}   {} {}   {} {}   {} {}",
        "Total:".bold(),
        stats.total,
        "High:".red().bold(),
        stats.high,
        "Medium:".yellow().bold(),
        stats.medium,
        "Low:".green().bold(),
        stats.low,
    );
    println!();

    println!(
        "  {:<18} {:<28} {:<8} {:>5}  Date",
        "ID", "Title", "Risk", "Score"
    );
    println!("  {}", "-".repeat(70));
    for (i, record) in view.records.iter().enumerate() {
        let bucket = match RiskBucket::of(record) {
            RiskBucket::High => "High".red(),
            RiskBucket::Medium => "Medium".yellow(),
            RiskBucket::Low => "Low".green(),
        };
        let line = format!(
            "  {:<18} {:<28} {:<8} {:>5}  {}",
            truncate(&record.id, 18),
            truncate(&record.title, 28),
            bucket,
            format!("{}/10", record.risk_score),
            record.date,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    if !view.activity.labels.is_empty() {
        println!();
        println!("{}", "Activity".bold().cyan());
        let max = view.activity.values.iter().copied().max().unwrap_or(1).max(1);
        for (label, count) in view.activity.labels.iter().zip(&view.activity.values) {
            let width = (count * 30).div_ceil(max);
            println!("  {:<26} {} {}", truncate(label, 26), "█".repeat(width).cyan(), count);
        }
    }
}

fn print_dashboard_csv(view: &DashboardView) {
    println!("id,title,risk,risk_score,date,summary");
    for r in &view.records {
        println!(
            "{},{},{},{},{},{}",
            csv_field(&r.id),
            csv_field(&r.title),
            csv_field(&r.risk),
            r.risk_score,
            csv_field(&r.date),
            csv_field(&r.summary),
        );
    }
}

// ---------------------------------------------------------------------------
// clausescope show
// ---------------------------------------------------------------------------

/// Show one saved analysis.
pub fn run_show(id: &str, format: OutputFormat, report: bool) -> Result<()> {
    let cfg = config::load();
    let backend = open_backend(&cfg)?;
    let mut viewer = DetailViewer::new();

    let view = match viewer.run_open(backend.as_ref(), id) {
        DetailContent::Loaded(view) => view.clone(),
        DetailContent::Failed { message } => bail!("{message}"),
        DetailContent::Closed | DetailContent::Loading { .. } => {
            bail!("no response for analysis {id}")
        }
    };

    if report {
        print!("{}", view.to_report());
        return Ok(());
    }
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        _ => print_detail(&view),
    }
    if let Some(url) = backend.export_url(id) {
        println!();
        println!("  {} {}", "Export:".dimmed(), url.dimmed());
    }
    Ok(())
}

fn print_detail(view: &DetailView) {
    println!("{}", format!("Analysis {}", view.id).bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Date:".bold(), view.timestamp);
    println!("  {}", truncate(&view.clause_text, 400).dimmed());
    println!();
    print_results_table(
        &ResultsPanel {
            clause_text: String::new(),
            rule: view.rule.clone(),
            ai: view.ai.clone(),
        },
        None,
    );
}

// ---------------------------------------------------------------------------
// clausescope serve
// ---------------------------------------------------------------------------

pub fn run_serve(addr: Option<&str>) -> Result<()> {
    let cfg = config::load();
    let backend = LocalBackend::from_config(&cfg).context("failed to open record store")?;
    let health = backend.health();
    if !health.ai_configured {
        println!("{} {}", "!".yellow().bold(), crate::ai::NOT_CONFIGURED.yellow());
    }
    if !health.storage_configured {
        println!("{} {}", "!".yellow().bold(), crate::store::github::NOT_CONFIGURED.yellow());
    }
    web::serve(addr.unwrap_or(&cfg.server.addr), &backend)
}

// ---------------------------------------------------------------------------
// clausescope activity
// ---------------------------------------------------------------------------

pub fn run_activity(limit: usize, format: OutputFormat) -> Result<()> {
    let events = activity::read_recent(limit);
    if events.is_empty() {
        println!("{}", "No activity logged yet.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Csv => {
            println!("timestamp,kind,success,analysis_id,latency_ms,detail");
            for e in &events {
                println!(
                    "{},{},{},{},{},{}",
                    e.timestamp,
                    e.kind,
                    e.success,
                    e.analysis_id.as_deref().unwrap_or(""),
                    e.latency_ms.map(|ms| ms.to_string()).unwrap_or_default(),
                    csv_field(e.detail.as_deref().unwrap_or("")),
                );
            }
        }
        OutputFormat::Table => print_activity_table(&events),
    }
    Ok(())
}

fn print_activity_table(events: &[ActivityEvent]) {
    println!("{}", "Recent Activity".bold().cyan());
    println!("{}", "=".repeat(72));
    for e in events {
        let status = if e.success { "✓".green() } else { "✗".red() };
        let time = chrono::DateTime::parse_from_rfc3339(&e.timestamp)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| e.timestamp.clone());
        let latency = e.latency_ms.map(|ms| format!("{ms}ms")).unwrap_or_default();
        let subject = e
            .analysis_id
            .as_deref()
            .or(e.detail.as_deref())
            .unwrap_or("");
        println!(
            "  {} {} {:<8} {:>7}  {}",
            status,
            time.dimmed(),
            e.kind,
            latency,
            truncate(subject, 40)
        );
    }
}

// ---------------------------------------------------------------------------
// clausescope health
// ---------------------------------------------------------------------------

pub fn run_health() -> Result<()> {
    println!("{}", "clausescope Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.clausescope/config.toml found"
        } else {
            "not found (run `clausescope config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".clausescope.toml found"
        } else {
            "none (optional)"
        },
    );

    let remote = !cfg.client.backend_url.trim().is_empty();
    let report: Result<HealthReport> = if remote {
        HttpBackend::from_config(&cfg)
            .health()
            .map_err(|e| anyhow::anyhow!("{e}"))
    } else {
        LocalBackend::from_config(&cfg)
            .map(|b| b.health())
            .map_err(|e| anyhow::anyhow!("{e}"))
    };

    let backend_label = if remote {
        format!("remote at {}", cfg.client.backend_url.trim())
    } else {
        "in-process".to_string()
    };

    match report {
        Ok(report) => {
            print_health_item("Backend", true, &format!("{backend_label} (v{})", report.version));
            print_health_item(
                "AI engine",
                report.ai_configured,
                &if report.ai_configured {
                    format!("configured ({})", cfg.ai.model)
                } else {
                    "not configured (set CLAUSESCOPE_AI_API_KEY)".to_string()
                },
            );
            print_health_item(
                "Storage",
                report.storage_configured,
                &format!(
                    "{}{}",
                    report.storage,
                    if report.storage_configured { "" } else { " (not configured)" }
                ),
            );
        }
        Err(e) => print_health_item("Backend", false, &format!("{backend_label}: {e}")),
    }

    let log_exists = activity::activity_log_path().is_some_and(|p| p.exists());
    print_health_item(
        "Activity log",
        log_exists,
        if !cfg.logging.enabled {
            "disabled"
        } else if log_exists {
            "writing to ~/.clausescope/activity.jsonl"
        } else {
            "no log file yet"
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// clausescope config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML, secrets masked.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective clausescope Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    for (exists, name) in [
        (global_exists, "~/.clausescope/config.toml"),
        (project_exists, ".clausescope.toml"),
    ] {
        if exists {
            println!("  {} {}", "✓".green(), name.dimmed());
        } else {
            println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
        }
    }
    println!("  {} {}", "·".dimmed(), "CLAUSESCOPE_* environment variables".dimmed());
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate to `max_chars` characters, appending "…" if truncated.
fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Quote a CSV field when it contains a delimiter, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn colorize_risk(level: &str) -> colored::ColoredString {
    match level {
        "High" => level.red().bold(),
        "Medium" => level.yellow(),
        "Low" => level.green(),
        _ => level.normal(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::record::StoredRecord;
    use crate::client::TransportError;
    use crate::protocol::{AnalyzeRequest, SaveRequest, SaveResponse};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("éééé", 3), "éé…");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a, b"), "\"a, b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    /// Answers every analyze call with a fixed outcome and counts saves.
    struct FixedBackend {
        analysis: Result<crate::analysis::AnalysisResult, TransportError>,
        saves: std::cell::Cell<usize>,
    }

    impl Backend for FixedBackend {
        fn analyze(
            &self,
            _request: &AnalyzeRequest,
        ) -> Result<crate::analysis::AnalysisResult, TransportError> {
            self.analysis.clone()
        }

        fn save(&self, _request: &SaveRequest) -> Result<SaveResponse, TransportError> {
            self.saves.set(self.saves.get() + 1);
            Ok(SaveResponse {
                analysis_id: "20250115_100000".to_string(),
            })
        }

        fn fetch(&self, _id: &str) -> Result<StoredRecord, TransportError> {
            Ok(StoredRecord::default())
        }

        fn list(&self) -> Result<Vec<crate::client::AnalysisSummary>, TransportError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_analysis_with_save_reports_the_analysis_error() {
        let backend = FixedBackend {
            analysis: Err(TransportError::Network("Failed to fetch".to_string())),
            saves: std::cell::Cell::new(0),
        };
        let err = submit_clause(&backend, "This clause limits liability.", true)
            .err()
            .expect("analysis failure is reported");
        let message = err.to_string();
        assert!(message.starts_with("Network error. Check your internet connection."));
        assert!(!message.contains("No analysis to save"));
        assert_eq!(backend.saves.get(), 0);
    }

    #[test]
    fn successful_analysis_with_save_saves_once() {
        let result = crate::analysis::analyze_clause(
            "This clause limits liability to $100.",
            &crate::ai::Unavailable(crate::ai::NOT_CONFIGURED.to_string()),
        )
        .unwrap();
        let backend = FixedBackend {
            analysis: Ok(result),
            saves: std::cell::Cell::new(0),
        };
        let controller = submit_clause(&backend, "This clause limits liability to $100.", true)
            .expect("analysis and save succeed");
        assert_eq!(backend.saves.get(), 1);
        assert_eq!(
            controller.view(Instant::now()).saved_id.as_deref(),
            Some("20250115_100000")
        );
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str_opt(Some("xml")), OutputFormat::Table);
    }
}
