//! Error policy for codec failures.
//!
//! # Responsibilities
//! - Map a [`CodecError`] plus the configured [`ErrorHandling`] to a decision
//! - Emit the structured log line for `log-and-fallback`
//!
//! # Design Decisions
//! - Pure decision function; the caller applies the fallback
//! - Unknown strategies fail safe (propagate)
//! - Only codec failures are routed here. Size, timeout and transport errors
//!   always map to their fixed responses

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::observability::metrics;

/// Strategy applied when encoding or decoding fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorHandling {
    /// Surface the error to the client.
    #[default]
    Throw,
    /// Log the error and fall back to JSON (responses) or `{}` (requests).
    LogAndFallback,
    /// Fall back without logging.
    Silent,
    /// Any other configured value. Behaves like `Throw`.
    #[serde(other)]
    Unrecognized,
}

/// Direction of the failed codec call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Serialization,
    Deserialization,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Serialization => "serialization",
            Operation::Deserialization => "deserialization",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the failure happened, for logging.
#[derive(Debug, Clone, Copy)]
pub struct ErrorContext<'a> {
    pub operation: Operation,
    /// `"METHOD /path"` of the request, when known.
    pub endpoint: Option<&'a str>,
}

/// Outcome of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Return the error to the client.
    Propagate,
    /// Substitute the fallback representation and continue.
    Fallback,
}

impl Decision {
    pub fn propagate(&self) -> bool {
        matches!(self, Decision::Propagate)
    }
}

/// Decide how to handle a codec failure.
pub fn decide(error: &CodecError, handling: ErrorHandling, ctx: &ErrorContext<'_>) -> Decision {
    match handling {
        ErrorHandling::Throw | ErrorHandling::Unrecognized => Decision::Propagate,
        ErrorHandling::LogAndFallback => {
            let endpoint = ctx.endpoint.map(|e| format!(" at {e}")).unwrap_or_default();
            tracing::error!(
                operation = %ctx.operation,
                endpoint = ctx.endpoint.unwrap_or("-"),
                error = %error,
                "TOON {}{} failed: {}",
                ctx.operation,
                endpoint,
                error.detail()
            );
            metrics::record_fallback(ctx.operation.as_str());
            Decision::Fallback
        }
        ErrorHandling::Silent => {
            metrics::record_fallback(ctx.operation.as_str());
            Decision::Fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ToonCodec;

    fn failure() -> CodecError {
        ToonCodec::new().decode("").unwrap_err()
    }

    fn ctx() -> ErrorContext<'static> {
        ErrorContext {
            operation: Operation::Deserialization,
            endpoint: Some("POST /api/echo"),
        }
    }

    #[test]
    fn test_decision_table() {
        let err = failure();
        assert_eq!(decide(&err, ErrorHandling::Throw, &ctx()), Decision::Propagate);
        assert_eq!(decide(&err, ErrorHandling::LogAndFallback, &ctx()), Decision::Fallback);
        assert_eq!(decide(&err, ErrorHandling::Silent, &ctx()), Decision::Fallback);
        assert_eq!(decide(&err, ErrorHandling::Unrecognized, &ctx()), Decision::Propagate);
    }

    #[test]
    fn test_fallback_without_endpoint() {
        let ctx = ErrorContext {
            operation: Operation::Serialization,
            endpoint: None,
        };
        assert!(!decide(&failure(), ErrorHandling::LogAndFallback, &ctx).propagate());
    }

    #[test]
    fn test_strategy_parsing() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: ErrorHandling,
        }

        let parse = |s: &str| toml::from_str::<Wrapper>(&format!("mode = \"{s}\"")).unwrap().mode;
        assert_eq!(parse("throw"), ErrorHandling::Throw);
        assert_eq!(parse("log-and-fallback"), ErrorHandling::LogAndFallback);
        assert_eq!(parse("silent"), ErrorHandling::Silent);
        assert_eq!(parse("explode"), ErrorHandling::Unrecognized);
        assert_eq!(ErrorHandling::default(), ErrorHandling::Throw);
    }
}
