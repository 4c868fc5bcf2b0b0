//! Response-side TOON handling.
//!
//! # Responsibilities
//! - Decide from the Accept header whether the client wants TOON
//! - Re-encode successful JSON handler output as TOON
//! - Apply the error policy when encoding fails
//!
//! # Design Decisions
//! - Only 2xx responses with a JSON content type are touched
//! - `*/*` alone keeps JSON; clients opt in by naming the TOON type
//! - A fallback response carries the original JSON bytes and `x-toon-fallback: true`

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, response::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::codec::CodecError;
use crate::config::ToonOptions;
use crate::error::ErrorBody;
use crate::http::request::endpoint;
use crate::http::server::ToonState;
use crate::negotiation::{accepts_target_ranked, JSON_CONTENT_TYPE, TOON_FALLBACK_HEADER};
use crate::observability::metrics;
use crate::policy::{decide, Decision, ErrorContext, Operation};

fn wants_toon(headers: &HeaderMap, options: &ToonOptions) -> bool {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    match accepts_target_ranked(accept, &options.content_type, &options.accept_limits()) {
        Ok(wanted) => wanted,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring Accept header, responding with JSON");
            false
        }
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with(JSON_CONTENT_TYPE))
}

/// Middleware encoding JSON responses as TOON for clients that ask for it.
pub async fn toon_response_middleware(
    State(state): State<ToonState>,
    request: Request,
    next: Next,
) -> Response {
    let options = state.options();
    if !options.enable_response_serialization || !wants_toon(request.headers(), &options) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let endpoint = endpoint(&parts);
    let response = next.run(Request::from_parts(parts, body)).await;

    if !response.status().is_success() || !is_json(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(endpoint = %endpoint, error = %e, "Error reading response body");
            return ErrorBody::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error reading response body",
                "InternalServerError",
            )
            .into_response();
        }
    };

    match encode(&state, &options, &bytes) {
        Ok((content_type, text)) => {
            metrics::record_encoded();
            toon_response(parts, content_type, text)
        }
        Err(err) => {
            let ctx = ErrorContext {
                operation: Operation::Serialization,
                endpoint: Some(endpoint.as_str()),
            };
            match decide(&err, options.error_handling, &ctx) {
                Decision::Propagate => err
                    .to_error_body(options.include_error_details())
                    .into_response(),
                Decision::Fallback => fallback_response(parts, bytes),
            }
        }
    }
}

fn encode(
    state: &ToonState,
    options: &ToonOptions,
    json: &[u8],
) -> Result<(HeaderValue, String), CodecError> {
    let value: Value = serde_json::from_slice(json).map_err(CodecError::serialization)?;
    let text = state.codec().encode_value(&value)?;
    let content_type =
        HeaderValue::from_str(&options.content_type).map_err(CodecError::serialization)?;
    Ok((content_type, text))
}

fn toon_response(mut parts: Parts, content_type: HeaderValue, text: String) -> Response {
    parts.headers.insert(header::CONTENT_TYPE, content_type);
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(text))
}

fn fallback_response(mut parts: Parts, json: Bytes) -> Response {
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    parts
        .headers
        .insert(TOON_FALLBACK_HEADER, HeaderValue::from_static("true"));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(json))
}
