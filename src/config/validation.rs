//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject content types that are not valid MIME types or that could inject headers
//! - Validate value ranges (limits and timeouts > 0, addresses parse)
//! - Keep the body-read deadline inside the whole-request timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ToonConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, at startup and on reload

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ToonConfig;
use crate::negotiation::{validate_content_type, MimeError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    ContentType(#[from] MimeError),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a socket address: {value}")]
    Address { field: &'static str, value: String },

    #[error(
        "toon.parse_timeout_ms ({parse_timeout_ms}) must be less than timeouts.request_secs in milliseconds ({request_ms})"
    )]
    ParseTimeoutTooLong { parse_timeout_ms: u64, request_ms: u64 },
}

pub fn validate_config(config: &ToonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let toon = &config.toon;

    if let Err(e) = validate_content_type(&toon.content_type) {
        errors.push(e.into());
    }

    let positive = [
        ("toon.max_body_size", toon.max_body_size as u64),
        ("toon.parse_timeout_ms", toon.parse_timeout_ms),
        ("toon.max_accept_header_length", toon.max_accept_header_length as u64),
        ("toon.max_media_types", toon.max_media_types as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    errors.extend(
        positive
            .into_iter()
            .filter(|(_, value)| *value == 0)
            .map(|(field, _)| ValidationError::Zero { field }),
    );

    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    if request_ms > 0 && toon.parse_timeout_ms >= request_ms {
        errors.push(ValidationError::ParseTimeoutTooLong {
            parse_timeout_ms: toon.parse_timeout_ms,
            request_ms,
        });
    }

    let addresses = [
        ("listener.bind_address", &config.listener.bind_address),
        ("observability.metrics_address", &config.observability.metrics_address),
    ];
    for (field, value) in addresses {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::Address {
                field,
                value: value.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
