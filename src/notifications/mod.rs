//! Notification delivery.
//!
//! # Data Flow
//! ```text
//! NotificationJob { type, data }
//!     → client.rs (POST to email / SMS endpoint)
//!     → resilience::with_retry (5xx and transport errors retried, 4xx terminal)
//!     → observability::metrics (outcome recorded)
//!
//! Many jobs:
//!     → batch.rs (groups of 5, concurrent within a group, pause between groups)
//!
//! Channel switches:
//!     → settings.rs (seeded from config, flipped at runtime by admins)
//! ```
//!
//! Delivery is best-effort. Nothing is queued or persisted; a process restart
//! drops in-flight retries.

pub mod batch;
pub mod client;
pub mod error;
pub mod settings;

pub use batch::{BatchReport, BATCH_PAUSE, BATCH_SIZE};
pub use client::{Channel, NotificationClient, NotificationJob};
pub use error::{ErrorCode, NotificationError, NON_RETRYABLE_CODES};
pub use settings::{ChannelSwitches, NotificationSettings, SettingsError, SettingsStore};
