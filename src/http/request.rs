//! Request-side TOON handling.
//!
//! # Responsibilities
//! - Generate the `x-request-id` for every request
//! - Read TOON bodies under the size ceiling and parse timeout
//! - Decode them and hand the result to handlers as JSON
//!
//! # Design Decisions
//! - Requests whose content type is not the configured TOON type pass through untouched
//! - Size, timeout and transport failures map to fixed responses; only decode
//!   failures go through the error policy
//! - The decoded body is stored in request extensions and also re-serialized as
//!   the JSON request body, so `Json<T>` handlers work unchanged

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, Request, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::error::ErrorBody;
use crate::http::body::{read_bounded, BodyOutcome};
use crate::http::server::ToonState;
use crate::negotiation::JSON_CONTENT_TYPE;
use crate::observability::metrics;
use crate::policy::{decide, Decision, ErrorContext, Operation};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Decoded TOON body, placed in request extensions by [`toon_body_middleware`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToonBody(pub Value);

/// `"METHOD /path"`, used in logs.
pub(crate) fn endpoint(parts: &Parts) -> String {
    format!("{} {}", parts.method, parts.uri.path())
}

fn is_toon_request(parts: &Parts, content_type: &str) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains(&content_type.to_ascii_lowercase()))
}

/// Middleware decoding TOON request bodies.
pub async fn toon_body_middleware(
    State(state): State<ToonState>,
    request: Request,
    next: Next,
) -> Response {
    let options = state.options();
    let (mut parts, body) = request.into_parts();

    if !options.enable_request_deserialization || !is_toon_request(&parts, &options.content_type) {
        return next.run(Request::from_parts(parts, body)).await;
    }

    let endpoint = endpoint(&parts);
    let bytes = match read_bounded(body.into_data_stream(), options.body_limits()).await {
        BodyOutcome::Completed(bytes) => bytes,
        BodyOutcome::SizeExceeded { received, limit } => {
            tracing::warn!(endpoint = %endpoint, received, limit, "TOON request body too large");
            metrics::record_body_rejection("too_large");
            return ErrorBody::payload_too_large().into_closing_response();
        }
        BodyOutcome::TimedOut => {
            tracing::warn!(
                endpoint = %endpoint,
                timeout_ms = options.parse_timeout_ms,
                "TOON request body parsing timed out"
            );
            metrics::record_body_rejection("timeout");
            return ErrorBody::request_timeout().into_closing_response();
        }
        BodyOutcome::TransportError(message) => {
            tracing::error!(endpoint = %endpoint, error = %message, "Error reading TOON request body");
            metrics::record_body_rejection("read_error");
            return ErrorBody::body_read_failed().into_response();
        }
    };

    let value = match state.codec().decode_bytes(&bytes) {
        Ok(value) => {
            metrics::record_decoded();
            value
        }
        Err(err) => {
            let ctx = ErrorContext {
                operation: Operation::Deserialization,
                endpoint: Some(endpoint.as_str()),
            };
            match decide(&err, options.error_handling, &ctx) {
                Decision::Propagate => {
                    tracing::debug!(endpoint = %endpoint, error = %err, "Rejecting TOON request body");
                    metrics::record_body_rejection("parse_error");
                    return ErrorBody::bad_request()
                        .with_details(
                            options.include_error_details(),
                            err.detail(),
                            Some(err.original_error()),
                        )
                        .into_response();
                }
                Decision::Fallback => Value::Object(Map::new()),
            }
        }
    };

    let json = value.to_string();
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(json.len()));
    parts.extensions.insert(DecodedToonBody(value));

    next.run(Request::from_parts(parts, Body::from(json))).await
}

/// Extractor for request bodies sent as TOON or JSON.
///
/// ```ignore
/// async fn create(ToonBody(user): ToonBody<NewUser>) -> Json<User> { .. }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ToonBody<T>(pub T);

/// Rejection for [`ToonBody`].
#[derive(Debug)]
pub enum ToonBodyRejection {
    /// The decoded TOON value does not fit the target type.
    Shape(serde_json::Error),
    /// The request was not TOON and its JSON body was rejected.
    Json(JsonRejection),
}

impl IntoResponse for ToonBodyRejection {
    fn into_response(self) -> Response {
        match self {
            ToonBodyRejection::Shape(err) => {
                tracing::debug!(error = %err, "Decoded TOON body does not match handler type");
                ErrorBody::new(
                    StatusCode::BAD_REQUEST,
                    "Request body does not match the expected shape",
                    "BadRequestError",
                )
                .into_response()
            }
            ToonBodyRejection::Json(rejection) => {
                let status = rejection.status();
                ErrorBody::new(status, rejection.body_text(), "BadRequestError").into_response()
            }
        }
    }
}

impl<S, T> FromRequest<S> for ToonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ToonBodyRejection;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(DecodedToonBody(value)) = request.extensions().get::<DecodedToonBody>() {
            return serde_json::from_value(value.clone())
                .map(ToonBody)
                .map_err(ToonBodyRejection::Shape);
        }

        Json::<T>::from_request(request, state)
            .await
            .map(|Json(value)| ToonBody(value))
            .map_err(ToonBodyRejection::Json)
    }
}
