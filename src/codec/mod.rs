//! TOON codec subsystem.
//!
//! # Data Flow
//! ```text
//! encode:  T: Serialize → cycle.rs (identity walk) → serde_json::Value
//!              → Format::encode → TOON text
//! decode:  bytes → UTF-8 / emptiness checks → Format::decode → serde_json::Value
//! ```
//!
//! # Design Decisions
//! - The text grammar sits behind the [`Format`] trait (`serde_toon` by
//!   default); the codec only adds input normalization and typed failures
//! - Every failure becomes a [`CodecError`] carrying its original cause, so the
//!   HTTP layer decides how much of it a client may see

pub mod cycle;
pub mod format;

use std::sync::Arc;

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::ErrorBody;

pub use cycle::{detect_cycles, CycleError};
pub use format::{Format, FormatError, ToonFormat};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Input rejected before it reaches the format.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Input string is empty")]
    Empty,

    #[error("Input must be valid UTF-8 text")]
    NotText(#[from] std::str::Utf8Error),
}

/// Typed codec failure.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Encoding a value to TOON failed.
    #[error("TOON serialization failed: {detail}")]
    Serialization {
        detail: String,
        #[source]
        source: BoxError,
    },

    /// Decoding TOON text failed.
    #[error("TOON deserialization failed: {detail}")]
    Deserialization {
        detail: String,
        #[source]
        source: BoxError,
    },
}

impl CodecError {
    pub fn serialization(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        CodecError::Serialization {
            detail: source.to_string(),
            source,
        }
    }

    pub fn deserialization(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        CodecError::Deserialization {
            detail: source.to_string(),
            source,
        }
    }

    /// Message safe to show any client.
    pub fn public_message(&self) -> &'static str {
        match self {
            CodecError::Serialization { .. } => "Failed to serialize response to TOON format",
            CodecError::Deserialization { .. } => "Failed to deserialize TOON request body",
        }
    }

    pub fn error_name(&self) -> &'static str {
        match self {
            CodecError::Serialization { .. } => "ToonSerializationError",
            CodecError::Deserialization { .. } => "ToonDeserializationError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            CodecError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CodecError::Deserialization { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Internal detail message.
    pub fn detail(&self) -> &str {
        match self {
            CodecError::Serialization { detail, .. } | CodecError::Deserialization { detail, .. } => {
                detail
            }
        }
    }

    /// Message of the underlying error.
    pub fn original_error(&self) -> String {
        match self {
            CodecError::Serialization { source, .. } | CodecError::Deserialization { source, .. } => {
                source.to_string()
            }
        }
    }

    /// Response body, with diagnostics only when `include_details` is set.
    pub fn to_error_body(&self, include_details: bool) -> ErrorBody {
        ErrorBody::new(self.status(), self.public_message(), self.error_name()).with_details(
            include_details,
            self.detail(),
            Some(self.original_error()),
        )
    }
}

/// Encoder/decoder service shared by the middleware.
#[derive(Clone)]
pub struct ToonCodec {
    format: Arc<dyn Format>,
}

impl ToonCodec {
    /// Codec backed by the bundled [`ToonFormat`].
    pub fn new() -> Self {
        Self::with_format(ToonFormat)
    }

    pub fn with_format(format: impl Format + 'static) -> Self {
        Self {
            format: Arc::new(format),
        }
    }

    /// Encode any serializable value.
    ///
    /// Values that reach themselves through shared ownership are rejected
    /// before projection, which would otherwise never terminate.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        detect_cycles(value).map_err(CodecError::serialization)?;
        let plain = serde_json::to_value(value).map_err(CodecError::serialization)?;
        self.encode_value(&plain)
    }

    /// Encode a value that is already plain data.
    pub fn encode_value(&self, value: &Value) -> Result<String, CodecError> {
        self.format.encode(value).map_err(CodecError::serialization)
    }

    pub fn decode(&self, text: &str) -> Result<Value, CodecError> {
        if text.trim().is_empty() {
            return Err(CodecError::deserialization(InputError::Empty));
        }
        self.format.decode(text).map_err(CodecError::deserialization)
    }

    /// Decode a raw request body.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::deserialization(InputError::NotText(e)))?;
        self.decode(text)
    }

    /// Whether `value` can be encoded without running into a cycle.
    pub fn can_serialize<T: Serialize + ?Sized>(&self, value: &T) -> bool {
        detect_cycles(value).is_ok()
    }
}

impl Default for ToonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToonCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToonCodec").finish_non_exhaustive()
    }
}
