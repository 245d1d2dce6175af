//! Token bucket rate limiting for outbound API requests.
//!
//! [`RateLimiter`] holds up to `permit_limit` permits. Callers that cannot be
//! served immediately wait in a FIFO queue bounded by `queue_limit`; a
//! background timer adds `tokens_per_period` permits every
//! `replenishment_period` and releases queued callers in arrival order.
//!
//! ```no_run
//! use reddit_rs::rate_limit::{RateLimitConfig, RateLimiter};
//!
//! # async fn example() -> reddit_rs::Result<()> {
//! let limiter = RateLimiter::new(RateLimitConfig::default())?;
//!
//! let lease = limiter.acquire(1).await?;
//! if lease.is_acquired() {
//!     // send the request
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// Configuration for the token bucket.
///
/// The defaults pace a client at one request per second with a burst of 60,
/// which keeps a single OAuth client inside the API's per-minute quota.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use reddit_rs::rate_limit::RateLimitConfig;
///
/// let config = RateLimitConfig::default()
///     .with_permit_limit(10)
///     .with_replenishment(Duration::from_millis(500), 1);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum number of permits the bucket can hold
    pub permit_limit: u32,
    /// Maximum number of permits that may be waiting in the queue
    pub queue_limit: u32,
    /// Interval between replenishment ticks
    pub replenishment_period: Duration,
    /// Permits added per tick (capped at `permit_limit`)
    pub tokens_per_period: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            permit_limit: 60,
            queue_limit: 60,
            replenishment_period: Duration::from_secs(1),
            tokens_per_period: 1,
        }
    }
}

impl RateLimitConfig {
    /// Set the bucket capacity.
    pub fn with_permit_limit(mut self, permit_limit: u32) -> Self {
        self.permit_limit = permit_limit;
        self
    }

    /// Set the queue capacity.
    pub fn with_queue_limit(mut self, queue_limit: u32) -> Self {
        self.queue_limit = queue_limit;
        self
    }

    /// Set the replenishment period and the permits added each period.
    pub fn with_replenishment(mut self, period: Duration, tokens_per_period: u32) -> Self {
        self.replenishment_period = period;
        self.tokens_per_period = tokens_per_period;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a limit or the period is zero.
    pub fn validate(&self) -> Result<()> {
        if self.permit_limit == 0 {
            return Err(Error::Config("permit_limit must be greater than 0".to_string()));
        }
        if self.tokens_per_period == 0 {
            return Err(Error::Config("tokens_per_period must be greater than 0".to_string()));
        }
        if self.replenishment_period.is_zero() {
            return Err(Error::Config(
                "replenishment_period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a [`RateLimiter::acquire`] call.
///
/// A lease is a plain result, not a guard: permits are spent on acquisition
/// and come back only through replenishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct PermitLease {
    acquired: bool,
}

impl PermitLease {
    fn granted() -> Self {
        Self { acquired: true }
    }

    fn rejected() -> Self {
        Self { acquired: false }
    }

    /// Whether the requested permits were granted.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }
}

struct Waiter {
    count: u32,
    tx: oneshot::Sender<()>,
}

struct LimiterState {
    available: u32,
    queued: u32,
    queue: VecDeque<Waiter>,
}

impl LimiterState {
    /// Drop waiters whose caller stopped waiting.
    fn purge_cancelled(&mut self) {
        let before = self.queue.len();
        self.queue.retain(|w| !w.tx.is_closed());
        if self.queue.len() != before {
            self.queued = self.queue.iter().map(|w| w.count).sum();
        }
    }

    fn replenish(&mut self, tokens_per_period: u32, permit_limit: u32) {
        let added = tokens_per_period.min(permit_limit.saturating_sub(self.available));
        self.available += added;

        while let Some(front) = self.queue.front() {
            if front.tx.is_closed() {
                if let Some(cancelled) = self.queue.pop_front() {
                    self.queued -= cancelled.count;
                }
                continue;
            }
            // Strict FIFO: the head blocks everyone behind it.
            if front.count > self.available {
                break;
            }
            let Some(waiter) = self.queue.pop_front() else {
                break;
            };
            self.queued -= waiter.count;
            if waiter.tx.send(()).is_ok() {
                self.available -= waiter.count;
            }
        }

        trace!(
            added,
            available = self.available,
            queued = self.queued,
            "Replenished rate limiter"
        );
    }
}

/// Token bucket rate limiter with a bounded FIFO wait queue.
///
/// The permit counter and the queue live behind one mutex shared by
/// [`acquire`](Self::acquire) and the replenishment timer. The timer task is
/// stopped when the limiter is dropped.
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<LimiterState>>,
    replenisher: JoinHandle<()>,
}

impl RateLimiter {
    /// Create a limiter with a full bucket and start its replenishment timer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or no Tokio
    /// runtime is available to drive the timer.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            Error::Config("rate limiter must be created inside a Tokio runtime".to_string())
        })?;

        let state = Arc::new(Mutex::new(LimiterState {
            available: config.permit_limit,
            queued: 0,
            queue: VecDeque::new(),
        }));

        let replenisher = runtime.spawn(run_replenisher(
            Arc::downgrade(&state),
            config.replenishment_period,
            config.tokens_per_period,
            config.permit_limit,
        ));

        Ok(Self {
            config,
            state,
            replenisher,
        })
    }

    /// Acquire `count` permits, waiting in the queue if necessary.
    ///
    /// Permits on hand are granted at once, even while larger requests are
    /// queued. Queued requests are released in order by the timer.
    ///
    /// * `count == 0` is a probe: the lease is acquired iff permits are
    ///   currently available; nothing is consumed.
    /// * If the queue cannot take `count` more permits, a non-acquired lease
    ///   is returned immediately.
    ///
    /// Dropping the returned future while queued withdraws the request
    /// without consuming permits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `count` exceeds the permit limit.
    pub async fn acquire(&self, count: u32) -> Result<PermitLease> {
        let rx = {
            let mut state = self.state.lock();

            if count == 0 {
                return Ok(if state.available > 0 {
                    PermitLease::granted()
                } else {
                    PermitLease::rejected()
                });
            }

            if count > self.config.permit_limit {
                return Err(Error::InvalidInput(format!(
                    "requested {count} permits, limit is {}",
                    self.config.permit_limit
                )));
            }

            if state.available >= count {
                state.available -= count;
                return Ok(PermitLease::granted());
            }

            state.purge_cancelled();
            if state.queued + count > self.config.queue_limit {
                warn!(
                    requested = count,
                    queued = state.queued,
                    queue_limit = self.config.queue_limit,
                    "Rate limiter queue saturated"
                );
                return Ok(PermitLease::rejected());
            }

            let (tx, rx) = oneshot::channel();
            state.queue.push_back(Waiter { count, tx });
            state.queued += count;
            debug!(requested = count, queued = state.queued, "Queued permit request");
            rx
        };

        // A closed channel means the limiter was dropped while we waited.
        Ok(match rx.await {
            Ok(()) => PermitLease::granted(),
            Err(_) => PermitLease::rejected(),
        })
    }

    /// Permits that can be leased right now.
    pub fn available_permits(&self) -> u32 {
        self.state.lock().available
    }

    /// Permits currently requested by queued callers.
    pub fn queued_permits(&self) -> u32 {
        self.state.lock().queued
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.replenisher.abort();
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("available", &state.available)
            .field("queued", &state.queued)
            .finish()
    }
}

async fn run_replenisher(
    state: Weak<Mutex<LimiterState>>,
    period: Duration,
    tokens_per_period: u32,
    permit_limit: u32,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else {
            break;
        };
        state.lock().replenish(tokens_per_period, permit_limit);
    }
}
