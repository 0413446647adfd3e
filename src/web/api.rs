//! JSON API handlers.
//!
//! Every handler answers through the in-process [`LocalBackend`], so the
//! HTTP surface and the CLI share validation and error statuses. Failures
//! become `{ "error": ... }` with the backend's status.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};
use url::form_urlencoded;

use crate::analysis::record::StoredRecord;
use crate::client::dashboard::{self, AnalysisSummary, FilterState, SortKey};
use crate::client::render::DetailView;
use crate::client::{Backend, LocalBackend, TransportError};
use crate::protocol::{AnalyzeRequest, ErrorBody, SaveRequest};

use super::{content_type_json, content_type_text, with_header};

pub type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
pub(crate) fn json_response<T: Serialize>(status: u16, data: &T) -> Result<HttpResponse> {
    let body = serde_json::to_string(data).context("failed to serialize JSON response")?;
    Ok(with_header(Response::from_data(body.into_bytes()), content_type_json())
        .with_status_code(StatusCode(status)))
}

pub(crate) fn error_response(status: u16, message: &str) -> Result<HttpResponse> {
    json_response(status, &ErrorBody::new(message))
}

fn transport_failure(err: TransportError) -> Result<HttpResponse> {
    match err {
        TransportError::Status { status, message } => error_response(status, &message),
        other => error_response(500, &other.to_string()),
    }
}

/// Parse a JSON request body, answering 400 when it does not fit.
fn parse_body<T: serde::de::DeserializeOwned>(body: Option<&str>) -> Result<T, HttpResponse> {
    let body = body.unwrap_or("").trim();
    if body.is_empty() {
        return Err(bad_request("No data provided"));
    }
    serde_json::from_str(body).map_err(|e| bad_request(&format!("Invalid request body: {e}")))
}

fn bad_request(message: &str) -> HttpResponse {
    error_response(400, message)
        .unwrap_or_else(|_| Response::from_data(Vec::new()).with_status_code(StatusCode(400)))
}

/// Decoded value of a query parameter.
fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /api/analyze`: run both engines over `{ clauseText }`.
pub fn post_analyze(backend: &LocalBackend, body: Option<&str>) -> Result<HttpResponse> {
    let request: AnalyzeRequest = match parse_body(body) {
        Ok(request) => request,
        Err(resp) => return Ok(resp),
    };
    match backend.analyze(&request) {
        Ok(result) => json_response(200, &result),
        Err(e) => transport_failure(e),
    }
}

/// `POST /api/save`: persist `{ analysisData }`, answer `{ analysisId }`.
pub fn post_save(backend: &LocalBackend, body: Option<&str>) -> Result<HttpResponse> {
    let request: SaveRequest = match parse_body(body) {
        Ok(request) => request,
        Err(resp) => return Ok(resp),
    };
    match backend.save(&request) {
        Ok(saved) => json_response(200, &saved),
        Err(e) => transport_failure(e),
    }
}

/// `GET /api/analyses`: the typed summary listing, newest first.
pub fn get_analyses(backend: &LocalBackend) -> Result<HttpResponse> {
    match backend.summaries() {
        Ok(summaries) => json_response(200, &summaries),
        Err(e) => transport_failure(e),
    }
}

/// `GET /api/analyses/{id}`: one record as stored.
pub fn get_analysis(backend: &LocalBackend, id: &str) -> Result<HttpResponse> {
    match backend.fetch_raw(id) {
        Ok(record) => json_response(200, &record),
        Err(e) => transport_failure(e),
    }
}

/// `GET /api/analyses/{id}/export`: plain-text report as a download.
pub fn get_export(backend: &LocalBackend, id: &str) -> Result<HttpResponse> {
    let record = match backend.fetch_raw(id) {
        Ok(value) => StoredRecord::from_value(value).unwrap_or_default(),
        Err(e) => return transport_failure(e),
    };
    let report = DetailView::from_record(id, &record).to_report();
    let disposition = tiny_http::Header::from_bytes(
        &b"Content-Disposition"[..],
        format!("attachment; filename=\"analysis_{id}.txt\"").as_bytes(),
    );

    let resp = with_header(Response::from_data(report.into_bytes()), content_type_text());
    Ok(match disposition {
        Ok(header) => resp.with_header(header),
        Err(()) => resp,
    })
}

/// `GET /api/dashboard?search=&sort=`: filtered, sorted, aggregated view.
pub fn get_dashboard(backend: &LocalBackend, url: &str) -> Result<HttpResponse> {
    let sort_key = match query_param(url, "sort").filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<SortKey>() {
            Ok(key) => key,
            Err(e) => return error_response(400, &e),
        },
        None => SortKey::default(),
    };
    let filter = FilterState {
        search_term: query_param(url, "search").unwrap_or_default(),
        sort_key,
    };

    let base: Vec<AnalysisSummary> = match backend.list() {
        Ok(base) => base,
        Err(e) => return transport_failure(e),
    };
    json_response(200, &dashboard::compute_view(&base, &filter))
}

/// `GET /api/health`: which backend services are configured.
pub fn get_health(backend: &LocalBackend) -> Result<HttpResponse> {
    json_response(200, &backend.health())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_decodes_values() {
        assert_eq!(
            query_param("/api/dashboard?search=hold%20harmless&sort=risk-desc", "search").as_deref(),
            Some("hold harmless")
        );
        assert_eq!(
            query_param("/api/dashboard?search=a+b", "search").as_deref(),
            Some("a b")
        );
        assert_eq!(query_param("/api/dashboard", "search"), None);
        assert_eq!(query_param("/api/dashboard?sort=date-asc", "search"), None);
    }

    #[test]
    fn error_response_carries_status() {
        let resp = error_response(404, "Analysis not found: x").unwrap();
        assert_eq!(resp.status_code(), StatusCode(404));
    }

    #[test]
    fn empty_body_is_rejected() {
        let resp = parse_body::<AnalyzeRequest>(None).unwrap_err();
        assert_eq!(resp.status_code(), StatusCode(400));

        let resp = parse_body::<AnalyzeRequest>(Some("{\"text\":1}")).unwrap_err();
        assert_eq!(resp.status_code(), StatusCode(400));

        let ok = parse_body::<AnalyzeRequest>(Some("{\"clauseText\":\"x\"}")).ok();
        assert_eq!(ok.map(|r| r.clause_text).as_deref(), Some("x"));
    }

    fn scratch_backend(name: &str) -> LocalBackend {
        let root = std::env::temp_dir().join(format!(
            "clausescope-api-{}-{name}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        LocalBackend::new(
            Box::new(crate::ai::Unavailable(crate::ai::NOT_CONFIGURED.to_string())),
            Box::new(crate::store::LocalStore::new(root)),
        )
    }

    #[test]
    fn handlers_answer_with_backend_statuses() {
        let backend = scratch_backend("statuses");

        let blank = post_analyze(&backend, Some("{\"clauseText\":\"   \"}")).unwrap();
        assert_eq!(blank.status_code(), StatusCode(400));

        let missing = get_analysis(&backend, "20990101_000000").unwrap();
        assert_eq!(missing.status_code(), StatusCode(404));

        let bad_id = get_analysis(&backend, "../etc").unwrap();
        assert_eq!(bad_id.status_code(), StatusCode(400));

        let bad_sort = get_dashboard(&backend, "/api/dashboard?sort=sideways").unwrap();
        assert_eq!(bad_sort.status_code(), StatusCode(400));

        let health = get_health(&backend).unwrap();
        assert_eq!(health.status_code(), StatusCode(200));
    }

    #[test]
    fn saved_record_can_be_listed_and_exported() {
        let backend = scratch_backend("export");
        let result = backend
            .analyze(&AnalyzeRequest {
                clause_text: "Vendor will indemnify Customer.".into(),
            })
            .unwrap();
        let id = backend
            .save(&SaveRequest {
                analysis_data: result,
            })
            .unwrap()
            .analysis_id;

        assert_eq!(get_analyses(&backend).unwrap().status_code(), StatusCode(200));
        assert_eq!(
            get_dashboard(&backend, "/api/dashboard?search=indemn&sort=risk-desc")
                .unwrap()
                .status_code(),
            StatusCode(200)
        );

        let export = get_export(&backend, &id).unwrap();
        assert_eq!(export.status_code(), StatusCode(200));
        assert!(
            export
                .headers()
                .iter()
                .any(|h| h.field.equiv("Content-Disposition"))
        );
    }
}
