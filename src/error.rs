//! JSON error payloads returned by the TOON middleware.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Wire shape of every error response produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

impl ErrorBody {
    pub fn new(status: StatusCode, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            error: error.into(),
            details: None,
            original_error: None,
        }
    }

    /// Attach diagnostics, only when `include` is set.
    pub fn with_details(
        mut self,
        include: bool,
        details: impl Into<String>,
        original_error: Option<String>,
    ) -> Self {
        if include {
            self.details = Some(details.into());
            self.original_error = original_error;
        }
        self
    }

    /// 413 for bodies over `max_body_size`.
    pub fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
            "PayloadTooLargeError",
        )
    }

    /// 408 for bodies that did not finish within `parse_timeout_ms`.
    pub fn request_timeout() -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            "Request body parsing timeout",
            "RequestTimeoutError",
        )
    }

    /// 400 for TOON bodies that failed to decode.
    pub fn bad_request() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Failed to parse TOON request body",
            "BadRequestError",
        )
    }

    /// 500 for transport errors while streaming the body.
    pub fn body_read_failed() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error reading request body",
            "InternalServerError",
        )
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Render the response and ask the server to drop the connection.
    pub fn into_closing_response(self) -> Response {
        let mut response = self.into_response();
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
        response
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
