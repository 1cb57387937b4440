//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, headers)
//! - Wire the registry, access gate and resolver around one record store
//! - Serve until the shutdown signal fires

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers;
use super::request::make_span;
use crate::channel::ChannelRegistry;
use crate::config::RedirectorConfig;
use crate::lifecycle::shutdown;
use crate::redirect::{AccessGate, RedirectResolver};
use crate::resilience::StorePolicy;
use crate::store::RecordStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChannelRegistry>,
    pub gate: Arc<AccessGate>,
    pub resolver: Arc<RedirectResolver>,
}

impl AppState {
    /// Wire the core components around a record store.
    pub fn new(config: &RedirectorConfig, store: Arc<dyn RecordStore>) -> Self {
        let registry = Arc::new(ChannelRegistry::new(
            store,
            StorePolicy::from_config(&config.store),
        ));
        let gate = Arc::new(AccessGate::new(registry.clone(), &config.access));
        let resolver = Arc::new(RedirectResolver::new(registry.clone(), gate.clone()));

        Self {
            registry,
            gate,
            resolver,
        }
    }
}

/// HTTP server for the channel redirector.
pub struct HttpServer {
    router: Router,
    config: RedirectorConfig,
    store_name: &'static str,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: RedirectorConfig, store: Arc<dyn RecordStore>) -> Self {
        let store_name = store.name();
        let state = AppState::new(&config, store);
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            store_name,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RedirectorConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(handlers::index))
            .route("/index.html", get(handlers::index))
            .route("/register", get(handlers::register))
            .route("/healthz", get(handlers::healthz))
            .route("/api/create", post(handlers::create_channel))
            .route("/api/update", post(handlers::update_channel))
            .route("/api/verify", post(handlers::verify_access))
            .fallback(handlers::resolve_channel)
            .with_state(state);

        let router = if config.security.enable_headers {
            router
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
        } else {
            router
        };

        router
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            store = self.store_name,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
