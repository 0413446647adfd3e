//! Detail viewer: one saved record on demand.
//!
//! Responses may arrive out of order. Every `open` and `close` starts a new
//! generation and hands out a [`DetailTicket`] stamped with it; an outcome
//! is applied only if its ticket is still current, so the last request
//! always wins and nothing lands in a closed view.

use super::render::DetailView;
use super::{Backend, TransportError};
use crate::analysis::record::StoredRecord;

/// Proof of a pending `open`, passed back with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    generation: u64,
    id: String,
}

impl DetailTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DetailContent {
    #[default]
    Closed,
    Loading {
        id: String,
    },
    Loaded(DetailView),
    /// Shown inline in place of the content area.
    Failed {
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct DetailViewer {
    generation: u64,
    content: DetailContent,
}

impl DetailViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> &DetailContent {
        &self.content
    }

    /// Start loading `id`, superseding any earlier request.
    pub fn open(&mut self, id: &str) -> DetailTicket {
        self.generation += 1;
        self.content = DetailContent::Loading { id: id.to_string() };
        DetailTicket {
            generation: self.generation,
            id: id.to_string(),
        }
    }

    /// Apply a fetch outcome. Returns `false` when the ticket is stale and
    /// the outcome was dropped.
    pub fn resolve(
        &mut self,
        ticket: &DetailTicket,
        outcome: Result<StoredRecord, TransportError>,
    ) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.content = match outcome {
            Ok(record) => DetailContent::Loaded(DetailView::from_record(&ticket.id, &record)),
            Err(e) => DetailContent::Failed {
                message: format!("Error loading analysis: {e}"),
            },
        };
        true
    }

    /// Clear the view and invalidate any request in flight.
    pub fn close(&mut self) {
        self.generation += 1;
        self.content = DetailContent::Closed;
    }

    /// Open and wait for the backend.
    pub fn run_open<B: Backend + ?Sized>(&mut self, backend: &B, id: &str) -> &DetailContent {
        let ticket = self.open(id);
        let outcome = backend.fetch(id);
        self.resolve(&ticket, outcome);
        &self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(clause: &str) -> StoredRecord {
        StoredRecord::from_value(json!({ "clauseText": clause })).unwrap()
    }

    #[test]
    fn later_open_wins_regardless_of_response_order() {
        let mut viewer = DetailViewer::new();
        let a = viewer.open("a");
        let b = viewer.open("b");

        assert!(viewer.resolve(&b, Ok(record("clause b"))));
        assert!(!viewer.resolve(&a, Ok(record("clause a"))));

        match viewer.content() {
            DetailContent::Loaded(view) => assert_eq!(view.clause_text, "clause b"),
            other => panic!("expected b loaded, got {other:?}"),
        }
    }

    #[test]
    fn close_drops_in_flight_response() {
        let mut viewer = DetailViewer::new();
        let ticket = viewer.open("a");
        viewer.close();
        assert!(!viewer.resolve(&ticket, Ok(record("late"))));
        assert_eq!(viewer.content(), &DetailContent::Closed);
    }

    #[test]
    fn failure_renders_inline_message() {
        let mut viewer = DetailViewer::new();
        let ticket = viewer.open("missing");
        viewer.resolve(
            &ticket,
            Err(TransportError::Status {
                status: 404,
                message: "Analysis not found: missing".into(),
            }),
        );
        assert_eq!(
            viewer.content(),
            &DetailContent::Failed {
                message: "Error loading analysis: Analysis not found: missing".into()
            }
        );
    }
}
