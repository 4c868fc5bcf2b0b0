//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the demo handlers
//! - Wire up middleware (tracing, timeout, request ID, TOON layers)
//! - Share the live [`ToonOptions`] with the middleware and apply reloads
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    extract::Request,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::codec::ToonCodec;
use crate::config::{ToonConfig, ToonOptions};
use crate::http::request::{toon_body_middleware, MakeRequestUuid, ToonBody, X_REQUEST_ID};
use crate::http::response::toon_response_middleware;

/// State shared by the TOON middleware.
///
/// Each request takes one snapshot of the options; a reload only affects
/// requests that start after it.
#[derive(Clone)]
pub struct ToonState {
    options: Arc<ArcSwap<ToonOptions>>,
    codec: ToonCodec,
}

impl ToonState {
    pub fn new(options: ToonOptions, codec: ToonCodec) -> Self {
        Self {
            options: Arc::new(ArcSwap::from_pointee(options)),
            codec,
        }
    }

    /// Current options snapshot.
    pub fn options(&self) -> Arc<ToonOptions> {
        self.options.load_full()
    }

    pub fn codec(&self) -> &ToonCodec {
        &self.codec
    }

    /// Replace the options for subsequent requests.
    pub fn update(&self, options: ToonOptions) {
        self.options.store(Arc::new(options));
    }
}

/// Apply the TOON request and response layers to `router`.
///
/// This is how individual routers opt in; with `toon.global` the server
/// applies it to the whole application instead.
pub fn with_toon<S>(router: Router<S>, state: &ToonState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            toon_response_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            toon_body_middleware,
        ))
}

/// HTTP server hosting the TOON-enabled routes.
pub struct HttpServer {
    router: Router,
    config: ToonConfig,
    state: ToonState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ToonConfig) -> Self {
        Self::with_codec(config, ToonCodec::new())
    }

    /// Create a server that uses a specific codec.
    pub fn with_codec(config: ToonConfig, codec: ToonCodec) -> Self {
        let state = ToonState::new(config.toon.clone(), codec);
        let router = Self::build_router(&config, &state);
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ToonConfig, state: &ToonState) -> Router {
        let api = Router::new()
            .route("/users", get(list_users))
            .route("/echo", post(echo));

        let app = if config.toon.global {
            with_toon(
                Router::new()
                    .route("/health", get(health))
                    .nest("/api", api),
                state,
            )
        } else {
            Router::new()
                .route("/health", get(health))
                .nest("/api", with_toon(api, state))
        };

        app.layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path()
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Configurations received on `config_updates` replace the TOON options.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ToonConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            global = self.config.toon.global,
            content_type = %self.config.toon.content_type,
            "HTTP server starting"
        );

        let state = self.state.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                tracing::info!(
                    content_type = %config.toon.content_type,
                    error_handling = ?config.toon.error_handling,
                    "TOON options reloaded"
                );
                state.update(config.toon);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving it in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ToonConfig {
        &self.config
    }

    pub fn state(&self) -> &ToonState {
        &self.state
    }
}

#[derive(Debug, Clone, Serialize)]
struct User {
    id: u32,
    name: &'static str,
    role: &'static str,
}

const USERS: [User; 3] = [
    User { id: 1, name: "Alice", role: "admin" },
    User { id: 2, name: "Bob", role: "user" },
    User { id: 3, name: "Carol", role: "user" },
];

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_users() -> Json<Value> {
    Json(json!({ "users": USERS }))
}

async fn echo(ToonBody(body): ToonBody<Value>) -> Json<Value> {
    Json(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_snapshots_survive_updates() {
        let state = ToonState::new(ToonOptions::default(), ToonCodec::new());
        let before = state.options();

        state.update(ToonOptions {
            max_body_size: 10,
            ..ToonOptions::default()
        });

        assert_eq!(before.max_body_size, 102_400);
        assert_eq!(state.options().max_body_size, 10);
    }

    #[test]
    fn test_users_encode_as_table() {
        let text = ToonCodec::new().encode(&json!({ "users": USERS })).unwrap();
        assert!(text.starts_with("users: [3]{id,name,role}:"));
        assert!(text.contains("  1,Alice,admin"));
    }
}
