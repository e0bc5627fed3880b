use std::io::{self, Cursor, Read};
use tiny_http::{Request, Response};

use qr_healer::heal::{decode_image_payload, ScanResult};
use qr_healer::HealError;
use serde::Deserialize;

use crate::state::AppState;
use crate::util::multipart::{extract_boundary, extract_file};

#[derive(Deserialize)]
struct ScanRequest {
    image: Option<String>,
}

/// Why no image bytes could be taken from a request.
#[derive(Debug)]
enum BodyError {
    /// 400: nothing that looks like an image was sent.
    Missing,
    /// 500: the image field was present but its base64 did not decode.
    Payload(HealError),
}

/// Pulls the image bytes out of a JSON or multipart request body.
fn extract_image(content_type: &str, body: &[u8]) -> Result<Vec<u8>, BodyError> {
    if content_type.starts_with("multipart/form-data") {
        let boundary = extract_boundary(content_type).ok_or(BodyError::Missing)?;
        return extract_file(body, &boundary, "image").ok_or(BodyError::Missing);
    }
    let request: ScanRequest = serde_json::from_slice(body).map_err(|_| BodyError::Missing)?;
    let payload = request.image.filter(|s| !s.trim().is_empty()).ok_or(BodyError::Missing)?;
    decode_image_payload(&payload).map_err(BodyError::Payload)
}

/// Drains a request body into memory.
fn read_body<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.read_to_end(&mut body)?;
    Ok(body)
}

/// 200 for a decoded code, 400 for a scan that ran but failed.
fn status_for(result: &ScanResult) -> u16 {
    if result.success { 200 } else { 400 }
}

fn error_body(e: &HealError) -> String {
    let result = ScanResult { error: Some(e.to_string()), ..Default::default() };
    serde_json::to_string(&result).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// POST /api/scan-qr
// ---------------------------------------------------------------------------

pub fn handle(request: &mut Request, state: &AppState) -> Response<Cursor<Vec<u8>>> {
    let content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let body = match read_body(request.as_reader()) {
        Ok(body) => body,
        Err(e) => {
            log::warn!("failed to read request body: {}", e);
            return crate::routes::json_response(500, error_body(&HealError::Io(e)));
        }
    };

    let bytes = match extract_image(&content_type, &body) {
        Ok(b) => b,
        Err(BodyError::Missing) => return crate::routes::json_error(400, "No image provided"),
        Err(BodyError::Payload(e)) => {
            log::warn!("bad image payload: {}", e);
            return crate::routes::json_response(500, error_body(&e));
        }
    };

    match state.scanner.scan(&bytes) {
        Ok(result) => {
            log::info!(
                "scan: success={} reconstructed={} confidence={:?}",
                result.success, result.reconstructed, result.confidence
            );
            let body = serde_json::to_string(&result).unwrap_or_default();
            crate::routes::json_response(status_for(&result), body)
        }
        Err(e) => {
            log::error!("error in scan: {}", e);
            crate::routes::json_response(500, error_body(&e))
        }
    }
}
