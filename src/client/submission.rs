//! Submission controller: one clause through analyze, display and save.
//!
//! ```text
//! Idle ─submit─▶ Validating ─ok─▶ Requesting ─▶ Displaying ─save─▶ SavePending ─▶ Saved
//!                    │                 └──────▶ Failed                    └──────▶ SaveFailed
//!                    └─invalid─▶ Idle
//! ```
//!
//! Network calls are split in two: `submit`/`save` hand back the request to
//! send and `complete_analysis`/`complete_save` take the outcome. Between
//! the two halves the triggering control is disabled: a second `submit` is
//! rejected as busy and a second `save` is a no-op.

use std::mem;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::errors::{BannerSlot, ClassifiedError};
use super::render::ResultsPanel;
use super::{Backend, TransportError};
use crate::analysis::{AnalysisResult, ValidationError, validate_clause_text};
use crate::protocol::{AnalyzeRequest, SaveRequest, SaveResponse};

pub const SAVE_LABEL: &str = "Save Analysis";
pub const SAVING_LABEL: &str = "Saving...";
pub const SAVED_LABEL: &str = "Saved";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("An analysis request is already in progress.")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("No analysis to save. Analyze a clause first.")]
    NoActiveAnalysis,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Requesting {
        started: Instant,
    },
    Displaying {
        result: AnalysisResult,
        elapsed: Duration,
    },
    Failed {
        error: ClassifiedError,
    },
    SavePending {
        result: AnalysisResult,
        elapsed: Duration,
    },
    Saved {
        result: AnalysisResult,
        elapsed: Duration,
        analysis_id: String,
    },
    SaveFailed {
        result: AnalysisResult,
        elapsed: Duration,
    },
}

impl SubmissionState {
    /// Whether a request is outstanding.
    pub fn in_flight(&self) -> bool {
        matches!(self, Self::Requesting { .. } | Self::SavePending { .. })
    }

    /// The analysis on display, if any.
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Displaying { result, .. }
            | Self::SavePending { result, .. }
            | Self::Saved { result, .. }
            | Self::SaveFailed { result, .. } => Some(result),
            _ => None,
        }
    }

    fn elapsed(&self) -> Option<Duration> {
        match self {
            Self::Displaying { elapsed, .. }
            | Self::SavePending { elapsed, .. }
            | Self::Saved { elapsed, .. }
            | Self::SaveFailed { elapsed, .. } => Some(*elapsed),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveButton {
    pub label: &'static str,
    pub enabled: bool,
}

/// Everything visible for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionView {
    pub loading: bool,
    /// The error banner, while inside its display window.
    pub error: Option<ClassifiedError>,
    pub results: Option<ResultsPanel>,
    /// Informational; how long the analyze request took.
    pub elapsed: Option<Duration>,
    /// Absent until there is something to save.
    pub save_button: Option<SaveButton>,
    pub saved_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SubmissionController {
    state: SubmissionState,
    banner: BannerSlot,
}

impl Default for SubmissionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionController {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Idle,
            banner: BannerSlot::default(),
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Start a new analysis, discarding whatever was on display.
    ///
    /// Returns the one request to send. Invalid text leaves the controller
    /// in `Idle` with a validation banner and produces no request.
    pub fn submit(&mut self, text: &str) -> Result<AnalyzeRequest, SubmitError> {
        if self.state.in_flight() {
            return Err(SubmitError::Busy);
        }

        self.state = SubmissionState::Validating;
        self.banner.clear();

        match validate_clause_text(text) {
            Ok(clause) => {
                self.state = SubmissionState::Requesting {
                    started: Instant::now(),
                };
                Ok(AnalyzeRequest {
                    clause_text: clause.to_string(),
                })
            }
            Err(e) => {
                self.state = SubmissionState::Idle;
                self.raise(ClassifiedError::validation(&e));
                Err(e.into())
            }
        }
    }

    /// Apply the analyze outcome. Returns `false` (and changes nothing) when
    /// no analyze request is outstanding.
    pub fn complete_analysis(&mut self, outcome: Result<AnalysisResult, TransportError>) -> bool {
        let SubmissionState::Requesting { started } = self.state else {
            return false;
        };

        self.state = match outcome {
            Ok(result) => SubmissionState::Displaying {
                result,
                elapsed: started.elapsed(),
            },
            Err(e) => {
                let error = ClassifiedError::from_message(&e.message());
                self.raise(error.clone());
                SubmissionState::Failed { error }
            }
        };
        true
    }

    /// Start saving the analysis on display.
    ///
    /// `Ok(None)` while a save is already in flight; only the first call
    /// produces a request.
    pub fn save(&mut self) -> Result<Option<SaveRequest>, SaveError> {
        match mem::replace(&mut self.state, SubmissionState::Idle) {
            SubmissionState::Displaying { result, elapsed }
            | SubmissionState::SaveFailed { result, elapsed } => {
                let request = SaveRequest {
                    analysis_data: result.clone(),
                };
                self.state = SubmissionState::SavePending { result, elapsed };
                Ok(Some(request))
            }
            pending @ SubmissionState::SavePending { .. } => {
                self.state = pending;
                Ok(None)
            }
            other => {
                self.state = other;
                Err(SaveError::NoActiveAnalysis)
            }
        }
    }

    /// Apply the save outcome. Returns `false` when no save is outstanding.
    pub fn complete_save(&mut self, outcome: Result<SaveResponse, TransportError>) -> bool {
        let SubmissionState::SavePending { result, elapsed } =
            mem::replace(&mut self.state, SubmissionState::Idle)
        else {
            return false;
        };

        self.state = match outcome {
            Ok(response) => SubmissionState::Saved {
                result,
                elapsed,
                analysis_id: response.analysis_id,
            },
            Err(e) => {
                self.raise(ClassifiedError::from_message(&e.message()));
                SubmissionState::SaveFailed { result, elapsed }
            }
        };
        true
    }

    /// The connection dropped. Shows a network banner whatever the state.
    pub fn on_offline(&mut self) {
        self.raise(ClassifiedError::offline());
    }

    /// Submit and wait for the backend.
    pub fn run_submit<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Result<(), SubmitError> {
        let request = self.submit(text)?;
        let outcome = backend.analyze(&request);
        self.complete_analysis(outcome);
        Ok(())
    }

    /// Save and wait for the backend.
    pub fn run_save<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<(), SaveError> {
        if let Some(request) = self.save()? {
            let outcome = backend.save(&request);
            self.complete_save(outcome);
        }
        Ok(())
    }

    /// Project the current state onto the visible surfaces.
    pub fn view(&self, now: Instant) -> SubmissionView {
        let save_button = match &self.state {
            SubmissionState::Displaying { .. } | SubmissionState::SaveFailed { .. } => {
                Some(SaveButton {
                    label: SAVE_LABEL,
                    enabled: true,
                })
            }
            SubmissionState::SavePending { .. } => Some(SaveButton {
                label: SAVING_LABEL,
                enabled: false,
            }),
            SubmissionState::Saved { .. } => Some(SaveButton {
                label: SAVED_LABEL,
                enabled: false,
            }),
            _ => None,
        };

        let saved_id = match &self.state {
            SubmissionState::Saved { analysis_id, .. } => Some(analysis_id.clone()),
            _ => None,
        };

        SubmissionView {
            loading: matches!(self.state, SubmissionState::Requesting { .. }),
            error: self.banner.visible(now).cloned(),
            results: self.state.result().map(ResultsPanel::from_result),
            elapsed: self.state.elapsed(),
            save_button,
            saved_id,
        }
    }

    fn raise(&mut self, error: ClassifiedError) {
        self.banner.raise(error, Instant::now());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AiOutcome, RuleAnalysis};
    use crate::client::errors::{ERROR_DISPLAY_WINDOW, ErrorKind};

    fn result() -> AnalysisResult {
        AnalysisResult {
            clause_text: "Either party may terminate.".into(),
            rule_based: RuleAnalysis {
                clause_type: "Termination".into(),
                risk_score: 2,
                flags: vec![],
                summary: "s".into(),
            },
            ai_based: AiOutcome::failed("AI service not configured"),
            analysis_id: None,
            timestamp: "2025-01-15T10:00:00+00:00".into(),
        }
    }

    fn displaying() -> SubmissionController {
        let mut controller = SubmissionController::new();
        controller.submit("Either party may terminate.").unwrap();
        assert!(controller.complete_analysis(Ok(result())));
        controller
    }

    #[test]
    fn submit_trims_and_enters_requesting() {
        let mut controller = SubmissionController::new();
        let request = controller.submit("  Either party may terminate.  ").unwrap();
        assert_eq!(request.clause_text, "Either party may terminate.");
        assert!(matches!(controller.state(), SubmissionState::Requesting { .. }));
        assert!(controller.view(Instant::now()).loading);
    }

    #[test]
    fn invalid_text_stays_idle_with_banner() {
        let mut controller = SubmissionController::new();
        assert_eq!(
            controller.submit("   "),
            Err(SubmitError::Invalid(ValidationError::Empty))
        );
        assert_eq!(controller.state(), &SubmissionState::Idle);

        let view = controller.view(Instant::now());
        assert_eq!(view.error.map(|e| e.kind), Some(ErrorKind::Validation));
        assert!(!view.loading);
    }

    #[test]
    fn submit_while_requesting_is_busy() {
        let mut controller = SubmissionController::new();
        controller.submit("clause").unwrap();
        assert_eq!(controller.submit("other"), Err(SubmitError::Busy));
    }

    #[test]
    fn save_outside_displaying_has_no_analysis() {
        let mut controller = SubmissionController::new();
        assert_eq!(controller.save(), Err(SaveError::NoActiveAnalysis));

        controller.submit("clause").unwrap();
        assert_eq!(controller.save(), Err(SaveError::NoActiveAnalysis));
    }

    #[test]
    fn save_is_not_reentrant() {
        let mut controller = displaying();
        assert!(controller.save().unwrap().is_some());
        assert_eq!(controller.save(), Ok(None));

        let view = controller.view(Instant::now());
        assert_eq!(
            view.save_button,
            Some(SaveButton {
                label: SAVING_LABEL,
                enabled: false
            })
        );
    }

    #[test]
    fn save_failure_keeps_result_and_allows_retry() {
        let mut controller = displaying();
        controller.save().unwrap();
        controller.complete_save(Err(TransportError::Status {
            status: 500,
            message: "disk full".into(),
        }));

        assert!(matches!(controller.state(), SubmissionState::SaveFailed { .. }));
        let view = controller.view(Instant::now());
        assert!(view.results.is_some());
        assert_eq!(view.error.unwrap().message, "disk full");
        assert!(view.save_button.unwrap().enabled);
        assert!(controller.save().unwrap().is_some());
    }

    #[test]
    fn saved_records_id_and_disables_button() {
        let mut controller = displaying();
        controller.save().unwrap();
        controller.complete_save(Ok(SaveResponse {
            analysis_id: "20250115_100000".into(),
        }));

        let view = controller.view(Instant::now());
        assert_eq!(view.saved_id.as_deref(), Some("20250115_100000"));
        assert_eq!(
            view.save_button,
            Some(SaveButton {
                label: SAVED_LABEL,
                enabled: false
            })
        );
        assert_eq!(controller.save(), Err(SaveError::NoActiveAnalysis));
    }

    #[test]
    fn new_submit_discards_previous_result() {
        let mut controller = displaying();
        controller.submit("").unwrap_err();
        assert_eq!(controller.state(), &SubmissionState::Idle);
        assert!(controller.view(Instant::now()).results.is_none());
    }

    #[test]
    fn late_outcomes_are_ignored() {
        let mut controller = SubmissionController::new();
        assert!(!controller.complete_analysis(Ok(result())));
        assert!(!controller.complete_save(Ok(SaveResponse {
            analysis_id: "x".into()
        })));
        assert_eq!(controller.state(), &SubmissionState::Idle);
    }

    #[test]
    fn failed_analysis_classifies_message() {
        let mut controller = SubmissionController::new();
        controller.submit("clause").unwrap();
        controller.complete_analysis(Err(TransportError::Status {
            status: 429,
            message: "Rate limit exceeded".into(),
        }));

        match controller.state() {
            SubmissionState::Failed { error } => {
                assert_eq!(error.kind, ErrorKind::RateLimited);
                assert_eq!(error.detail.as_deref(), Some("Rate limit exceeded"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn offline_raises_banner_without_request() {
        let mut controller = SubmissionController::new();
        controller.on_offline();
        let now = Instant::now();
        assert_eq!(
            controller.view(now).error.map(|e| e.kind),
            Some(ErrorKind::Network)
        );
        assert!(controller.view(now + ERROR_DISPLAY_WINDOW).error.is_none());
        assert_eq!(controller.state(), &SubmissionState::Idle);
    }

    #[test]
    fn view_is_idempotent() {
        let controller = displaying();
        let now = Instant::now();
        assert_eq!(controller.view(now), controller.view(now));
    }
}
