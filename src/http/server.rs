//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with health and admin handlers
//! - Wire up middleware (request ID, trace, timeout, request metrics)
//! - Own the shared state: hot-swappable config + notifier, rate limiter,
//!   sessions, notification switches, SMS subscriptions
//! - Run background tasks (login record sweep, config reload) until shutdown

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, SessionStore};
use crate::config::GatewayConfig;
use crate::notifications::{NotificationClient, NotificationError, SettingsStore};
use crate::observability::metrics;
use crate::security::{LoginRateLimiter, CLEANUP_INTERVAL};
use crate::subscriptions::{setup_subscription_router, SubscriptionStore};

/// State replaced as a whole when the configuration reloads.
pub struct InnerState {
    pub config: GatewayConfig,
    pub notifier: NotificationClient,
}

impl InnerState {
    fn from_config(
        config: GatewayConfig,
        settings: &Arc<SettingsStore>,
    ) -> Result<Self, NotificationError> {
        let notifier = NotificationClient::new(
            config.notifications.clone(),
            Duration::from_secs(config.timeouts.delivery_secs),
        )?
        .with_settings(settings.clone());
        Ok(Self { config, notifier })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
    /// Survives config reloads.
    pub limiter: Arc<LoginRateLimiter>,
    /// Survives config reloads.
    pub sessions: Arc<SessionStore>,
    /// Seeded from the first config; later changes come from admins only.
    pub settings: Arc<SettingsStore>,
    pub subscriptions: Arc<SubscriptionStore>,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self, NotificationError> {
        let settings = Arc::new(SettingsStore::from_config(&config.notifications));
        Ok(Self {
            inner: Arc::new(ArcSwap::from_pointee(InnerState::from_config(config, &settings)?)),
            limiter: Arc::new(LoginRateLimiter::new()),
            sessions: Arc::new(SessionStore::new()),
            settings,
            subscriptions: Arc::new(SubscriptionStore::new()),
        })
    }

    /// Swap in a reloaded configuration. The old one stays active on error.
    pub fn apply_config(&self, config: GatewayConfig) {
        match InnerState::from_config(config, &self.settings) {
            Ok(inner) => {
                self.inner.store(Arc::new(inner));
                tracing::info!("Configuration reloaded");
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected reloaded configuration, keeping current");
            }
        }
    }
}

/// HTTP server for the membership gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, NotificationError> {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let state = AppState::new(config)?;
        let router = Self::build_router(request_timeout, state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(request_timeout: Duration, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .merge(setup_admin_router(state.clone()))
            .merge(setup_subscription_router(state))
            .route_layer(middleware::from_fn(track_requests))
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process callers.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` fires, applying config updates
    /// as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let limiter = self.state.limiter.clone();
        let sweeper_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            limiter.run_cleanup(CLEANUP_INTERVAL, sweeper_shutdown).await;
        });

        let state = self.state.clone();
        let mut reload_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => state.apply_config(config),
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16(), start);
    response
}
