use std::io::Cursor;
use tiny_http::Response;

use crate::state::AppState;

/// `GET /api/health`
pub fn handle(state: &AppState) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::json!({
        "status": "ok",
        "model_loaded": state.scanner.model_loaded(),
    });
    crate::routes::json_response(200, body.to_string())
}
