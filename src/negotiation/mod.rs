//! Content negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Startup / reload:
//!     configured content type → mime.rs (syntax + header-injection check)
//!
//! Per request:
//!     Accept header → accept.rs
//!         → accepts_target_ranked() (response middleware: TOON or not)
//!             → parse_accept_header() (ranked media ranges, DoS limits)
//!         → negotiate_content_type() (pick one of the supported types)
//! ```
//!
//! # Design Decisions
//! - `*/*` never selects TOON; clients opt in explicitly
//! - All functions are pure and allocation-light, safe to call from any task
//! - Oversized headers are rejected, excess media ranges are dropped silently

pub mod accept;
pub mod mime;

pub use accept::{
    accepts_target, accepts_target_ranked, negotiate_content_type, parse_accept_header, AcceptLimits, MediaTypeRange,
    NegotiationError,
};
pub use mime::{validate_content_type, MimeError};

/// Default MIME type for TOON payloads.
pub const TOON_CONTENT_TYPE: &str = "text/toon";

/// Content type used when a response falls back to JSON.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Response header signalling that TOON encoding degraded to JSON.
pub const TOON_FALLBACK_HEADER: &str = "x-toon-fallback";

/// Maximum accepted Accept header length in bytes (8KB, per RFC 7230 guidance).
pub const MAX_ACCEPT_HEADER_LENGTH: usize = 8192;

/// Maximum number of media ranges considered from a single Accept header.
pub const MAX_MEDIA_TYPES: usize = 20;
