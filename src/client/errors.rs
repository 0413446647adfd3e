//! Error classification and the auto-clearing error banner.
//!
//! Failures reach the client as plain messages. [`classify`] sorts a message
//! into an [`ErrorKind`] by pattern, and [`ClassifiedError`] pairs the kind
//! with the text the user sees. Classification only ever changes wording;
//! callers never branch on it.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::analysis::ValidationError;

/// How long an error stays on screen unless a newer one replaces it.
pub const ERROR_DISPLAY_WINDOW: Duration = Duration::from_secs(10);

static RATE_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rate[\s_-]?limit|too many requests|\b429\b").expect("rate limit regex must compile")
});

static TIMEOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)time[\s_-]?out|timed out").expect("timeout regex must compile")
});

static NETWORK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)network|fetch|connection|offline|unreachable|dns")
        .expect("network regex must compile")
});

/// `"<service> [storage|service|api key] [is] not configured"`.
static NOT_CONFIGURED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(github|ai|openai|storage)\b[\w\s]*?\bnot configured")
        .expect("not-configured regex must compile")
});

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Backend services that can be left unconfigured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// The AI model service.
    Ai,
    /// The record store (local directory or GitHub repository).
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    RateLimited,
    Timeout,
    Network,
    ServiceNotConfigured(Service),
    Unclassified,
}

/// Classify a failure message. First matching pattern wins, in the order
/// rate limit, timeout, network, unconfigured service.
pub fn classify(message: &str) -> ErrorKind {
    if RATE_LIMIT_RE.is_match(message) {
        return ErrorKind::RateLimited;
    }
    if TIMEOUT_RE.is_match(message) {
        return ErrorKind::Timeout;
    }
    if NETWORK_RE.is_match(message) {
        return ErrorKind::Network;
    }
    if let Some(caps) = NOT_CONFIGURED_RE.captures(message) {
        let service = match caps[1].to_ascii_lowercase().as_str() {
            "ai" | "openai" => Service::Ai,
            _ => Service::Storage,
        };
        return ErrorKind::ServiceNotConfigured(service);
    }
    ErrorKind::Unclassified
}

/// User-facing text for a kind; `raw` is shown verbatim when unclassified.
pub fn display_message(kind: ErrorKind, raw: &str) -> String {
    match kind {
        ErrorKind::Validation | ErrorKind::Unclassified => raw.to_string(),
        ErrorKind::RateLimited => {
            "Too many requests. Please wait a moment and try again.".to_string()
        }
        ErrorKind::Timeout => {
            "The request timed out. Check your connection and try again.".to_string()
        }
        ErrorKind::Network => "Network error. Check your internet connection.".to_string(),
        ErrorKind::ServiceNotConfigured(Service::Ai) => {
            "AI analysis is not configured. Set CLAUSESCOPE_AI_API_KEY on the server and restart it."
                .to_string()
        }
        ErrorKind::ServiceNotConfigured(Service::Storage) => {
            "Saving is not configured. Set CLAUSESCOPE_GITHUB_TOKEN, storage.github_owner and \
             storage.github_repo on the server, or switch storage.backend to \"local\"."
                .to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Classified error
// ---------------------------------------------------------------------------

/// A failure ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// What the user sees.
    pub message: String,
    /// The message the backend or transport reported, when it differs from
    /// `message`.
    pub detail: Option<String>,
}

impl ClassifiedError {
    pub fn from_message(raw: &str) -> Self {
        let kind = classify(raw);
        let message = display_message(kind, raw);
        let detail = (message != raw && !raw.trim().is_empty()).then(|| raw.to_string());
        Self {
            kind,
            message,
            detail,
        }
    }

    pub fn validation(err: &ValidationError) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: err.to_string(),
            detail: None,
        }
    }

    /// Raised when the client learns the connection dropped.
    pub fn offline() -> Self {
        Self {
            kind: ErrorKind::Network,
            message: display_message(ErrorKind::Network, ""),
            detail: Some("You appear to be offline.".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Banner
// ---------------------------------------------------------------------------

/// An error on screen with the instant it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub error: ClassifiedError,
    pub raised_at: Instant,
}

impl ErrorBanner {
    pub fn new(error: ClassifiedError, raised_at: Instant) -> Self {
        Self { error, raised_at }
    }

    /// Whether the banner is still within its display window at `now`.
    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < ERROR_DISPLAY_WINDOW
    }
}

/// The one banner position on screen.
///
/// A new error replaces the current banner and restarts the display window,
/// so an earlier banner's expiry never clears a later one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BannerSlot {
    current: Option<ErrorBanner>,
}

impl BannerSlot {
    pub fn raise(&mut self, error: ClassifiedError, now: Instant) {
        self.current = Some(ErrorBanner::new(error, now));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The error on screen at `now`, if its window is still open.
    pub fn visible(&self, now: Instant) -> Option<&ClassifiedError> {
        self.current
            .as_ref()
            .filter(|banner| banner.is_visible(now))
            .map(|banner| &banner.error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_kind() {
        assert_eq!(classify("GitHub API rate limit exceeded."), ErrorKind::RateLimited);
        assert_eq!(classify("HTTP 429 Too Many Requests"), ErrorKind::RateLimited);
        assert_eq!(classify("Request timed out."), ErrorKind::Timeout);
        assert_eq!(classify("Gateway Timeout"), ErrorKind::Timeout);
        assert_eq!(classify("TypeError: Failed to fetch"), ErrorKind::Network);
        assert_eq!(classify("Connection refused"), ErrorKind::Network);
        assert_eq!(
            classify("GitHub storage not configured: set CLAUSESCOPE_GITHUB_TOKEN"),
            ErrorKind::ServiceNotConfigured(Service::Storage)
        );
        assert_eq!(
            classify("AI service not configured"),
            ErrorKind::ServiceNotConfigured(Service::Ai)
        );
        assert_eq!(classify("Invalid clause encoding"), ErrorKind::Unclassified);
    }

    #[test]
    fn rate_limit_wins_over_network_wording() {
        assert_eq!(
            classify("Network error: rate limit exceeded"),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn ai_inside_words_does_not_match_service() {
        // "domain" contains "ai" but not as a word.
        assert_eq!(classify("domain is not configured"), ErrorKind::Unclassified);
    }

    #[test]
    fn unclassified_message_is_shown_verbatim() {
        let err = ClassifiedError::from_message("Clause contains unsupported characters");
        assert_eq!(err.kind, ErrorKind::Unclassified);
        assert_eq!(err.message, "Clause contains unsupported characters");
        assert!(err.detail.is_none());
    }

    #[test]
    fn classified_message_keeps_raw_detail() {
        let err = ClassifiedError::from_message("Request timed out. Check your network connection.");
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(
            err.detail.as_deref(),
            Some("Request timed out. Check your network connection.")
        );
    }

    #[test]
    fn banner_clears_after_window() {
        let raised = Instant::now();
        let banner = ErrorBanner::new(ClassifiedError::offline(), raised);
        assert!(banner.is_visible(raised));
        assert!(banner.is_visible(raised + Duration::from_millis(9_999)));
        assert!(!banner.is_visible(raised + ERROR_DISPLAY_WINDOW));
    }

    #[test]
    fn second_error_restarts_the_window() {
        let t0 = Instant::now();
        let mut slot = BannerSlot::default();
        slot.raise(ClassifiedError::from_message("Request timed out."), t0);
        slot.raise(
            ClassifiedError::from_message("Connection refused"),
            t0 + Duration::from_secs(8),
        );

        // Past the first banner's window, inside the second's.
        let shown = slot.visible(t0 + Duration::from_secs(12));
        assert_eq!(shown.map(|e| e.kind), Some(ErrorKind::Network));
        assert!(slot.visible(t0 + Duration::from_secs(18)).is_none());
    }

    #[test]
    fn cleared_slot_shows_nothing() {
        let t0 = Instant::now();
        let mut slot = BannerSlot::default();
        slot.raise(ClassifiedError::offline(), t0);
        slot.clear();
        assert!(slot.visible(t0).is_none());
    }
}
