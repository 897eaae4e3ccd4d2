//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, trace, timeout, metrics layers)
//!     → /health
//!     → admin router (login, logout, session, notifications, settings)
//!     → subscription router (public SMS opt-in / opt-out)
//!     → JSON response
//! ```

pub mod server;

pub use server::{AppState, HttpServer, InnerState};
