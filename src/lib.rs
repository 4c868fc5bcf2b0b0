//! TOON content negotiation and safe body ingestion for axum services.
//!
//! TOON (Token-Oriented Object Notation) is a compact, indentation-based text
//! encoding of the JSON data model. This crate lets an axum application accept
//! TOON request bodies and answer with TOON when a client asks for it, while
//! handlers keep working with ordinary serde types.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ────────────────▶ request id ─▶ trace ─▶ toon_body_middleware ─▶ handler
//!                                               │  body::read_bounded      │
//!                                               │  (size cap + timeout)    │
//!                                               │  codec::decode           │
//!                                               │  policy::decide          │
//!                                                                          ▼
//!     Client Response
//!     ◀──────────────── toon_response_middleware ◀─────────────── Json output
//!                         negotiation::accepts_target_ranked
//!                         codec::encode_value
//!                         policy::decide
//! ```
//!
//! Cross-cutting: `config` (TOML, validation, hot reload), `observability`
//! (tracing, Prometheus counters), `lifecycle` (startup, signals, shutdown).

pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod negotiation;
pub mod observability;
pub mod policy;

pub use codec::ToonCodec;
pub use config::schema::{ToonConfig, ToonOptions};
pub use error::ErrorBody;
pub use http::{HttpServer, ToonBody, ToonState};
pub use lifecycle::Shutdown;
