//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, timeout)
//!     → request.rs (TOON body? → body.rs bounded read → decode → JSON body)
//!     → handler (Json<T> or ToonBody<T>)
//!     → response.rs (Accept names TOON? → encode JSON output)
//!     → Send to client
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod server;

pub use body::{read_bounded, BodyLimits, BodyOutcome};
pub use request::{toon_body_middleware, DecodedToonBody, MakeRequestUuid, ToonBody, X_REQUEST_ID};
pub use response::toon_response_middleware;
pub use server::{with_toon, HttpServer, ToonState};
