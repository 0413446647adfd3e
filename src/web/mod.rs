//! HTTP backend for clausescope.
//!
//! A small synchronous server (`tiny_http`) that serves:
//! - the embedded single-page frontend (analyze form plus dashboard)
//! - the JSON endpoints the client consumes
//!
//! Launched via `clausescope serve` (default: `http://127.0.0.1:8750`).

mod api;
mod frontend;

use std::io::{Cursor, Read};

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::activity;
use crate::client::LocalBackend;

use api::HttpResponse;

/// Request bodies above this size are refused.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Serve `backend` on `addr` until the process is stopped.
///
/// Requests are handled one at a time. A failing request gets a JSON error
/// and never takes the server down.
pub fn serve(addr: &str, backend: &LocalBackend) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("clausescope backend running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = match read_body(&mut request) {
            Ok(body) => body,
            Err(message) => {
                let resp = api::error_response(413, &message).unwrap_or_else(|_| empty(413));
                let _ = request.respond(resp);
                continue;
            }
        };

        let resp = match dispatch(&method, &url, body.as_deref(), backend) {
            Ok(resp) => resp,
            Err(e) => {
                activity::record_error(&url, &format!("{e:#}"));
                api::error_response(500, &e.to_string()).unwrap_or_else(|_| empty(500))
            }
        };
        let status = resp.status_code().0;
        let _ = request.respond(resp);

        println!(
            "{} {} {} {}",
            method,
            url,
            status,
            chrono::Local::now().format("%H:%M:%S")
        );
    }

    Ok(())
}

/// Read the body of methods that carry one.
fn read_body(request: &mut Request) -> Result<Option<String>, String> {
    if !matches!(request.method(), Method::Post | Method::Put) {
        return Ok(None);
    }
    if request.body_length().is_some_and(|len| len as u64 > MAX_BODY_BYTES) {
        return Err("Request body too large".to_string());
    }
    let mut buf = String::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut buf)
        .map_err(|e| format!("Could not read request body: {e}"))?;
    Ok(Some(buf))
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn dispatch(
    method: &Method,
    url: &str,
    body: Option<&str>,
    backend: &LocalBackend,
) -> Result<HttpResponse> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        (&Method::Post, "/api/analyze") => api::post_analyze(backend, body),
        (&Method::Post, "/api/save") => api::post_save(backend, body),
        (&Method::Get, "/api/analyses") => api::get_analyses(backend),
        (&Method::Get, "/api/dashboard") => api::get_dashboard(backend, url),
        (&Method::Get, "/api/health") => api::get_health(backend),

        (&Method::Get, _) => match record_route(path) {
            Some((id, false)) => api::get_analysis(backend, id),
            Some((id, true)) => api::get_export(backend, id),
            None => not_found(),
        },

        _ => not_found(),
    }
}

/// `/api/analyses/{id}` → `(id, false)`, `/api/analyses/{id}/export` →
/// `(id, true)`.
fn record_route(path: &str) -> Option<(&str, bool)> {
    let rest = path.strip_prefix("/api/analyses/")?;
    let (id, export) = match rest.strip_suffix("/export") {
        Some(id) => (id, true),
        None => (rest, false),
    };
    (!id.is_empty() && !id.contains('/')).then_some((id, export))
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn serve_frontend() -> HttpResponse {
    with_header(
        Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec()),
        content_type_html(),
    )
    .with_status_code(StatusCode(200))
}

fn not_found() -> Result<HttpResponse> {
    api::error_response(404, "not found")
}

fn empty(status: u16) -> HttpResponse {
    Response::from_data(Vec::new()).with_status_code(StatusCode(status))
}

pub(crate) fn with_header(
    resp: Response<Cursor<Vec<u8>>>,
    header: Option<Header>,
) -> Response<Cursor<Vec<u8>>> {
    match header {
        Some(header) => resp.with_header(header),
        None => resp,
    }
}

pub(crate) fn content_type_json() -> Option<Header> {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").ok()
}

pub(crate) fn content_type_text() -> Option<Header> {
    Header::from_bytes("Content-Type", "text/plain; charset=utf-8").ok()
}

fn content_type_html() -> Option<Header> {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").ok()
}
