//! Client-side presentation core.
//!
//! Three components, sharing no state:
//!
//! - [`submission`]: drives one clause through analyze and save
//! - [`dashboard`]: filters, sorts and aggregates saved analyses
//! - [`detail`]: shows one saved record, discarding stale responses
//!
//! All three are plain single-threaded state machines. Network calls go
//! through the [`Backend`] trait, either over HTTP or in-process (see
//! [`transport`]).

pub mod dashboard;
pub mod detail;
pub mod errors;
pub mod render;
pub mod submission;
pub mod transport;

use thiserror::Error;

use crate::analysis::AnalysisResult;
use crate::analysis::record::StoredRecord;
use crate::protocol::{AnalyzeRequest, SaveRequest, SaveResponse};

pub use dashboard::{AnalysisSummary, Dashboard, FilterState, SortKey};
pub use detail::DetailViewer;
pub use submission::SubmissionController;
pub use transport::{HttpBackend, LocalBackend};

/// A failed backend call, as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never got a response.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status; `message` is the body's `error` field when there
    /// was one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A response arrived but could not be read.
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    /// The message to classify and show.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// The endpoints the client consumes.
pub trait Backend {
    fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResult, TransportError>;

    fn save(&self, request: &SaveRequest) -> Result<SaveResponse, TransportError>;

    fn fetch(&self, id: &str) -> Result<StoredRecord, TransportError>;

    /// The typed summary collection the dashboard loads.
    fn list(&self) -> Result<Vec<AnalysisSummary>, TransportError>;

    /// Download URL for a record's report, opened out of band.
    fn export_url(&self, _id: &str) -> Option<String> {
        None
    }
}
