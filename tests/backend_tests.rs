/// End-to-end tests of the client core against the in-process backend.
///
/// Each test gets its own scratch store under the system temp dir. The AI
/// engine is either a canned stand-in or the unconfigured engine, so no
/// network access is needed.
use std::path::PathBuf;
use std::time::Instant;

use clausescope::ai::{AiEngine, NOT_CONFIGURED, Unavailable};
use clausescope::analysis::{AiAnalysis, AiOutcome, RiskLevel};
use clausescope::client::detail::DetailContent;
use clausescope::client::render::AiPanel;
use clausescope::client::{
    Backend, Dashboard, DetailViewer, LocalBackend, SortKey, SubmissionController,
    TransportError,
};
use clausescope::protocol::AnalyzeRequest;
use clausescope::store::LocalStore;

struct CannedEngine(RiskLevel);

impl AiEngine for CannedEngine {
    fn analyze(&self, _clause: &str) -> AiOutcome {
        AiOutcome::Analysis(AiAnalysis {
            clause_type: "Liability Cap".to_string(),
            risk_level: self.0,
            key_terms: vec!["liability".to_string()],
            summary: "Caps damages.".to_string(),
            recommendations: vec!["Raise the cap".to_string()],
        })
    }
}

fn scratch(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!(
        "clausescope-backend-{}-{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&root);
    root
}

fn backend_with(name: &str, ai: Box<dyn AiEngine>) -> LocalBackend {
    LocalBackend::new(ai, Box::new(LocalStore::new(scratch(name))))
}

#[test]
fn analyze_save_list_and_open() {
    let backend = backend_with("flow", Box::new(CannedEngine(RiskLevel::High)));
    let mut controller = SubmissionController::new();

    controller
        .run_submit(&backend, "This clause limits liability to $100.")
        .unwrap();
    controller.run_save(&backend).unwrap();

    let view = controller.view(Instant::now());
    let id = view.saved_id.expect("record saved");
    assert_eq!(view.save_button.map(|b| b.enabled), Some(false));

    let mut dashboard = Dashboard::load(&backend).unwrap();
    let listing = dashboard.set_search("liability");
    assert_eq!(listing.records.len(), 1);
    assert_eq!(listing.records[0].id, id);
    assert_eq!(listing.records[0].title, "Liability Cap");
    assert_eq!(listing.stats.high, 1);

    let mut viewer = DetailViewer::new();
    let DetailContent::Loaded(detail) = viewer.run_open(&backend, &id) else {
        panic!("saved record should open");
    };
    assert_eq!(detail.clause_text, "This clause limits liability to $100.");
    assert_eq!(detail.rule.risk_score, "2/10");
    assert!(matches!(detail.ai, AiPanel::Analysis { .. }));
}

#[test]
fn unconfigured_ai_still_yields_rule_result() {
    let backend = backend_with(
        "no-ai",
        Box::new(Unavailable(NOT_CONFIGURED.to_string())),
    );
    let mut controller = SubmissionController::new();
    controller
        .run_submit(&backend, "Either party may terminate on notice.")
        .unwrap();

    let results = controller.view(Instant::now()).results.unwrap();
    assert_eq!(results.rule.clause_type, "Termination");
    assert_eq!(
        results.ai,
        AiPanel::Error {
            message: NOT_CONFIGURED.to_string()
        }
    );

    let health = backend.health();
    assert!(!health.ai_configured);
    assert_eq!(health.storage, "local");
    assert!(health.storage_configured);
}

#[test]
fn oversized_clause_is_rejected_by_backend() {
    let backend = backend_with("oversize", Box::new(CannedEngine(RiskLevel::Low)));
    let err = backend
        .analyze(&AnalyzeRequest {
            clause_text: "a".repeat(10_001),
        })
        .unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 400, .. }));
}

#[test]
fn unknown_id_is_not_found() {
    let backend = backend_with("missing", Box::new(CannedEngine(RiskLevel::Low)));
    let err = backend.fetch("20990101_000000").unwrap_err();
    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}

#[test]
fn dashboard_sorts_saved_records_by_score() {
    let backend = backend_with("sorted", Box::new(CannedEngine(RiskLevel::Medium)));
    let mut controller = SubmissionController::new();
    for clause in [
        "Liability is limited to fees under a mutual cap.",
        "Customer shall and must accept unlimited, full liability and agrees to cover gross negligence.",
    ] {
        controller.run_submit(&backend, clause).unwrap();
        controller.run_save(&backend).unwrap();
    }

    let mut dashboard = Dashboard::load(&backend).unwrap();
    let view = dashboard.set_sort(SortKey::RiskDesc);
    let scores: Vec<u8> = view.records.iter().map(|r| r.risk_score).collect();
    assert_eq!(scores, vec![10, 0]);
    assert_eq!(view.stats.medium, 2);
}
