//! Membership gateway: admin login with brute-force lockout and retried
//! notification delivery behind an Axum HTTP server.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod notifications;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod subscriptions;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
