//! Failed-login rate limiting with temporary lockout.
//!
//! # State per client
//! ```text
//! NONE ──fail──▶ TRACKING (count 1..4) ──5th fail──▶ LOCKED (locked_until set)
//!   ▲                 │                                  │
//!   └──── success ────┘       window / lockout expiry ───┘
//! ```
//!
//! Records live in process memory only. A restart forgets them, and separate
//! instances do not share them.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::observability::metrics;

/// Failed attempts tolerated before lockout.
pub const MAX_ATTEMPTS: u32 = 5;
/// How long a locked client is denied.
pub const LOCKOUT_DURATION: Duration = Duration::from_secs(15 * 60);
/// Period over which failures accumulate.
pub const ATTEMPT_WINDOW: Duration = Duration::from_secs(60 * 60);
/// Interval of the stale-record sweep.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Failure history for one client identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttemptRecord {
    pub count: u32,
    pub first_attempt: Instant,
    pub last_attempt: Instant,
    pub locked_until: Option<Instant>,
}

impl LoginAttemptRecord {
    fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            first_attempt: now,
            last_attempt: now,
            locked_until: None,
        }
    }

    fn window_elapsed(&self, now: Instant) -> bool {
        now.duration_since(self.first_attempt) > ATTEMPT_WINDOW
    }

    fn locked_at(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}

/// Advisory answer from [`LoginRateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Seconds until the lockout ends, rounded up. Set when denied.
    pub retry_after: Option<u64>,
    /// Failures left before lockout. Set when allowed.
    pub attempts_left: Option<u32>,
}

impl RateLimitDecision {
    fn allow(attempts_left: u32) -> Self {
        Self {
            allowed: true,
            retry_after: None,
            attempts_left: Some(attempts_left),
        }
    }

    fn deny(remaining: Duration) -> Self {
        Self {
            allowed: false,
            retry_after: Some(ceil_secs(remaining)),
            attempts_left: None,
        }
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

/// In-memory registry of failed login attempts keyed by client identifier.
#[derive(Debug, Default)]
pub struct LoginRateLimiter {
    attempts: DashMap<String, LoginAttemptRecord>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `client_id` may attempt a login now.
    ///
    /// Locks a client that has reached [`MAX_ATTEMPTS`] but has no active
    /// lockout, and drops records whose window has elapsed.
    pub fn check(&self, client_id: &str) -> RateLimitDecision {
        let now = Instant::now();

        let mut entry = match self.attempts.entry(client_id.to_string()) {
            Entry::Vacant(_) => return RateLimitDecision::allow(MAX_ATTEMPTS),
            Entry::Occupied(entry) => entry,
        };

        let record = entry.get_mut();
        if let Some(until) = record.locked_until.filter(|until| now < *until) {
            return RateLimitDecision::deny(until - now);
        }

        if record.window_elapsed(now) {
            entry.remove();
            return RateLimitDecision::allow(MAX_ATTEMPTS);
        }

        if record.count >= MAX_ATTEMPTS {
            record.locked_until = Some(now + LOCKOUT_DURATION);
            return RateLimitDecision::deny(LOCKOUT_DURATION);
        }

        RateLimitDecision::allow(MAX_ATTEMPTS - record.count)
    }

    /// Count one failed login for `client_id`.
    pub fn record_failed_attempt(&self, client_id: &str) {
        let now = Instant::now();

        let count = self
            .attempts
            .entry(client_id.to_string())
            .and_modify(|record| {
                if record.window_elapsed(now) {
                    *record = LoginAttemptRecord::fresh(now);
                } else {
                    record.count += 1;
                    record.last_attempt = now;
                    if record.count >= MAX_ATTEMPTS {
                        record.locked_until = Some(now + LOCKOUT_DURATION);
                    }
                }
            })
            .or_insert_with(|| LoginAttemptRecord::fresh(now))
            .count;

        tracing::warn!(client = %client_id, attempts = count, "Failed login attempt");
        metrics::record_tracked_clients(self.attempts.len());
    }

    /// Forget `client_id` after a successful login.
    pub fn clear_attempts(&self, client_id: &str) {
        self.attempts.remove(client_id);
    }

    /// Drop records whose window has elapsed and whose lockout, if any, is over.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let before = self.attempts.len();
        self.attempts
            .retain(|_, record| !(record.window_elapsed(now) && !record.locked_at(now)));
        let removed = before.saturating_sub(self.attempts.len());

        metrics::record_tracked_clients(self.attempts.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.attempts.len(), "Swept stale login records");
        }
        removed
    }

    /// Number of clients with a live record.
    pub fn tracked_clients(&self) -> usize {
        self.attempts.len()
    }

    /// Snapshot of one client's record.
    pub fn record(&self, client_id: &str) -> Option<LoginAttemptRecord> {
        self.attempts.get(client_id).map(|r| r.value().clone())
    }

    /// Sweep every `period` until shutdown.
    pub async fn run_cleanup(&self, period: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.cleanup();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Login record sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
