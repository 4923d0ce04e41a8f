//! Response envelope handling: pagination cursor, payload decode, error bodies.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ApiError, ErrorDetail};

/// Metadata of a completed API call.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    /// Cursor for the next page; empty on the last page.
    pub next: String,
}

impl Response {
    pub fn has_next(&self) -> bool {
        !self.next.is_empty()
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    #[serde(default)]
    next_link: Option<String>,
}

/// Extract `meta.pagination.next_link`.
///
/// Bodies without the envelope (bare arrays, empty bodies, a malformed `meta`
/// block) simply have no next page.
pub(crate) fn next_link(body: &[u8]) -> String {
    serde_json::from_slice::<Envelope>(body)
        .ok()
        .and_then(|e| e.meta)
        .and_then(|m| m.pagination)
        .and_then(|p| p.next_link)
        .unwrap_or_default()
}

/// Decode the primary payload. An empty body decodes to `None`.
pub(crate) fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(ApiError::Decode)
}

/// Build the error for a non-success status from the service's error array.
pub(crate) fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let details: Vec<ErrorDetail> = serde_json::from_slice(body).unwrap_or_default();

    let message = if !details.is_empty() {
        details
            .iter()
            .map(|d| {
                if d.error_key.is_empty() {
                    d.error_message.clone()
                } else {
                    format!("{} ({})", d.error_message, d.error_key)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    } else {
        let text = String::from_utf8_lossy(body);
        let text = text.trim();
        if text.is_empty() {
            status.canonical_reason().unwrap_or("no response body").to_string()
        } else {
            text.chars().take(200).collect()
        }
    };

    ApiError::Status {
        status: status.as_u16(),
        message,
        details,
    }
}
