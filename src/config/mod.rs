//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! gateway.toml
//!     → loader.rs (parse, ADMIN_PASSWORD override)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via ArcSwap to handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → atomic swap of Arc<GatewayConfig>
//! ```
//!
//! Listener address and metrics exporter are bound once at startup; a reload
//! affects admin password, session TTL, notification endpoints and retries.

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, GatewayConfig, ListenerConfig, NotificationConfig, ObservabilityConfig,
    RetryConfig, TimeoutConfig,
};
pub use validation::ValidationError;
