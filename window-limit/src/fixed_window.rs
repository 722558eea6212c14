use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use parking_lot::RwLockUpgradableReadGuard;
use parking_lot::RwLockWriteGuard;
use quanta::Clock;
use quanta::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;

use crate::LimitError;
use crate::RateLimiter;
use crate::Remaining;
use crate::Result;

/// Capacity and window length of a [`FixedWindowLimiter`].
///
/// Values are not validated. A `limit` of zero denies every caller, and a zero
/// `window` expires immediately so every call starts a fresh window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedWindowConfig {
    /// Maximum admissions per window.
    pub limit: usize,
    /// Length of one window.
    pub window: Duration,
}

impl FixedWindowConfig {
    /// Admit at most `limit` callers per `window`.
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window }
    }
}

#[derive(Debug)]
struct WindowState {
    started: Instant,
    count: usize,
}

impl WindowState {
    fn expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started) >= window
    }

    fn reset(&mut self, now: Instant) {
        self.started = now;
        self.count = 0;
    }

    fn reset_in(&self, now: Instant, window: Duration) -> Duration {
        window.saturating_sub(now.saturating_duration_since(self.started))
    }
}

/// A simple window-based limiter.
///
/// Divides time into fixed intervals, each admitting at most `limit` callers.
/// Like every fixed window scheme it is susceptible to "boundary bursts" where
/// double the limit is admitted in a short period spanning two windows.
///
/// The window start and the admission count live behind a single lock. Expiry is
/// checked and the window rolled over inside the same critical section as the
/// admission decision, so concurrent callers straddling a boundary can never
/// reset twice or admit more than `limit` per window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    config: FixedWindowConfig,
    state: RwLock<WindowState>,
    clock: Clock,
}

impl FixedWindowLimiter {
    /// Creates a new `FixedWindowLimiter` whose first window starts now.
    pub fn new(config: FixedWindowConfig) -> Self {
        Self::with_clock(config, Clock::new())
    }

    /// Creates a limiter reading time from `clock`.
    ///
    /// Useful with `quanta::Clock::mock()` to drive windows deterministically.
    pub fn with_clock(config: FixedWindowConfig, clock: Clock) -> Self {
        let started = clock.now();
        Self {
            config,
            state: RwLock::new(WindowState { started, count: 0 }),
            clock,
        }
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> FixedWindowConfig {
        self.config
    }

    /// Starts a fresh window now, discarding any admissions in the current one.
    pub fn reset(&self) {
        let now = self.clock.now();
        self.state.write().reset(now);
        trace!("fixed window reset");
    }

    /// Rolls the window over if it has expired.
    ///
    /// Returns `true` if a new window was started.
    pub fn reset_if_window_expired(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write();
        self.roll_over(&mut state, now)
    }

    fn roll_over(&self, state: &mut WindowState, now: Instant) -> bool {
        if state.expired(now, self.config.window) {
            trace!(admitted = state.count, "fixed window expired, rolling over");
            state.reset(now);
            true
        } else {
            false
        }
    }

    fn admit(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write();
        self.roll_over(&mut state, now);

        if state.count < self.config.limit {
            state.count += 1;
            true
        } else {
            false
        }
    }

    fn reset_in(&self) -> Duration {
        let now = self.clock.now();
        self.state.read().reset_in(now, self.config.window)
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    fn allow(&self) -> Result<bool> {
        Ok(self.admit())
    }

    async fn wait(&self, cancel: &CancellationToken) -> Result<bool> {
        if self.admit() {
            return Ok(true);
        }

        let delay = self.reset_in();
        debug!(?delay, "window exhausted, waiting for rollover");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("wait cancelled before admission");
                Err(LimitError::Cancelled)
            }
            _ = tokio::time::sleep(delay) => {
                let admitted = self.admit();
                if !admitted {
                    // Another caller took the fresh quota first.
                    trace!("lost the race for the new window");
                }
                Ok(admitted)
            }
        }
    }

    fn remaining(&self) -> Result<Remaining> {
        let now = self.clock.now();
        let state = self.state.upgradable_read();

        let state = if state.expired(now, self.config.window) {
            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            self.roll_over(&mut state, now);
            RwLockWriteGuard::downgrade(state)
        } else {
            RwLockUpgradableReadGuard::downgrade(state)
        };

        Ok(Remaining {
            quota: self.config.limit.saturating_sub(state.count),
            reset_in: state.reset_in(now, self.config.window),
        })
    }
}
