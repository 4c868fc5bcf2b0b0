//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and policy produce:
//!     → logging.rs (tracing subscriber, structured events)
//!     → metrics.rs (decode/encode/rejection/fallback counters)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the TraceLayer span
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
