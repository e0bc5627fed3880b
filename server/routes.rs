use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::state::SharedState;
use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

const CORS_HEADERS: &[(&str, &str)] = &[
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

fn headers(extra: &[(&str, &str)]) -> Vec<Header> {
    CORS_HEADERS.iter()
        .chain(extra.iter())
        .filter_map(|(k, v)| Header::from_bytes(k.as_bytes(), v.as_bytes()).ok())
        .collect()
}

pub fn json_response(status: u16, body: String) -> Response<Cursor<Vec<u8>>> {
    let bytes = body.into_bytes();
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        headers(&[("Content-Type", "application/json")]),
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

/// `{"error": message}` with the given status.
pub fn json_error(status: u16, message: &str) -> Response<Cursor<Vec<u8>>> {
    json_response(status, serde_json::json!({ "error": message }).to_string())
}

/// Empty 204 answering a CORS preflight.
pub fn preflight() -> Response<Cursor<Vec<u8>>> {
    Response::new(StatusCode(204), headers(&[]), Cursor::new(Vec::new()), Some(0), None)
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    json_error(404, "not found")
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches incoming requests to the appropriate handler.
///
/// Handlers receive a `&mut Request` so that the dispatcher retains
/// ownership and can call `request.respond(response)` at the end.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();
    let path   = url.split('?').next().unwrap_or("").to_owned();
    log::debug!("{} {}", method, path);

    let response = match (method, path.as_str()) {
        (Method::Options, _)               => preflight(),
        (Method::Get,  "/api/health")      => handlers::health::handle(&state),
        (Method::Post, "/api/scan-qr")     => handlers::scan::handle(&mut request, &state),
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        log::warn!("failed to send response for {}: {}", path, e);
    }
}
