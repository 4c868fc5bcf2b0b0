//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::body::BodyLimits;
use crate::negotiation::{AcceptLimits, MAX_ACCEPT_HEADER_LENGTH, MAX_MEDIA_TYPES, TOON_CONTENT_TYPE};
use crate::policy::ErrorHandling;

/// Default maximum TOON request body (100KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 100 * 1024;

/// Default body parsing timeout (30 seconds).
pub const DEFAULT_PARSE_TIMEOUT_MS: u64 = 30_000;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ToonConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// TOON negotiation and body parsing.
    pub toon: ToonOptions,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole request timeout (including handler time) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// TOON options, read once per request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToonOptions {
    /// Encode JSON responses as TOON when the client asks for it.
    pub enable_response_serialization: bool,

    /// Decode `content_type` request bodies.
    pub enable_request_deserialization: bool,

    /// Apply the TOON layers to every route, not only the TOON-enabled ones.
    pub global: bool,

    /// What to do when encoding or decoding fails.
    pub error_handling: ErrorHandling,

    /// MIME type used for TOON payloads.
    pub content_type: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Body parsing timeout in milliseconds.
    pub parse_timeout_ms: u64,

    /// Maximum Accept header length in bytes.
    pub max_accept_header_length: usize,

    /// Maximum media ranges read from one Accept header.
    pub max_media_types: usize,

    /// Hide error details in production.
    pub sanitize_errors: bool,

    /// Production mode flag.
    pub production: bool,
}

impl Default for ToonOptions {
    fn default() -> Self {
        Self {
            enable_response_serialization: true,
            enable_request_deserialization: true,
            global: false,
            error_handling: ErrorHandling::Throw,
            content_type: TOON_CONTENT_TYPE.to_string(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            parse_timeout_ms: DEFAULT_PARSE_TIMEOUT_MS,
            max_accept_header_length: MAX_ACCEPT_HEADER_LENGTH,
            max_media_types: MAX_MEDIA_TYPES,
            sanitize_errors: true,
            production: false,
        }
    }
}

impl ToonOptions {
    /// Whether error responses may carry details and original error text.
    pub fn include_error_details(&self) -> bool {
        !self.production || !self.sanitize_errors
    }

    pub fn body_limits(&self) -> BodyLimits {
        BodyLimits {
            max_body_size: self.max_body_size,
            parse_timeout: Duration::from_millis(self.parse_timeout_ms),
        }
    }

    pub fn accept_limits(&self) -> AcceptLimits {
        AcceptLimits {
            max_header_length: self.max_accept_header_length,
            max_media_types: self.max_media_types,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
