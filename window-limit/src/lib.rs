//! # window-limit
//!
//! `window-limit` decides, for a stream of concurrent callers, whether an action may
//! proceed right now under a fixed capacity per time window. Callers that cannot be
//! admitted may instead block until the next window opens, with the wait cancellable
//! at any point.
//!
//! ## Key Concepts
//!
//! * **Fixed Windows**: Time is divided into windows of equal length; each window
//!   admits at most `limit` callers.
//! * **Lazy Rollover**: Window expiry is detected at the moment of the request,
//!   eliminating the need for background worker threads or timers.
//! * **Cancellable Waits**: [`RateLimiter::wait`] races the window boundary against a
//!   [`CancellationToken`] and retries once when the window ends. A cancelled wait
//!   leaves the limiter untouched.
//! * **Limiter Trait**: A unified, object-safe interface so callers can swap a
//!   [`FixedWindowLimiter`] for a [`NullLimiter`] without branching.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use window_limit::FixedWindowConfig;
//! use window_limit::FixedWindowLimiter;
//! use window_limit::RateLimiter;
//!
//! let limiter = FixedWindowLimiter::new(FixedWindowConfig::new(100, Duration::from_secs(60)));
//!
//! if limiter.allow().unwrap_or(false) {
//!     // Request allowed
//! }
//! ```

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub mod config;
mod error;
mod fixed_window;
mod null;

pub use config::LimiterConfig;
pub use error::ConfigError;
pub use error::LimitError;
pub use fixed_window::FixedWindowConfig;
pub use fixed_window::FixedWindowLimiter;
pub use null::NullLimiter;

/// Result type alias for limiter operations.
pub type Result<T> = std::result::Result<T, LimitError>;

/// Quota left in the current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Remaining {
    /// Admissions still available before the window is exhausted.
    pub quota: usize,
    /// Time until the current window ends. Zero means a reset is imminent.
    pub reset_in: Duration,
}

/// The contract every limiter variant satisfies.
///
/// Limiters must be `Send` and `Sync` to allow sharing across thread boundaries
/// via `Arc`, and the trait is object safe so `Arc<dyn RateLimiter>` works.
#[async_trait]
pub trait RateLimiter: Debug + Send + Sync {
    /// Attempts to admit a single caller without blocking.
    ///
    /// Denial is `Ok(false)`, not an error. The error path is reserved for
    /// variants backed by something that can fail.
    fn allow(&self) -> Result<bool>;

    /// Admits the caller, suspending until the next window if capacity is
    /// exhausted.
    ///
    /// The caller is suspended at most once, for no longer than one window,
    /// and admission is retried a single time when the window ends. `Ok(false)`
    /// means another caller took the fresh quota first.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::Cancelled`] if `cancel` fires before admission.
    async fn wait(&self, cancel: &CancellationToken) -> Result<bool>;

    /// Reports the quota left in the current window and the time until it resets.
    fn remaining(&self) -> Result<Remaining>;

    /// Like [`RateLimiter::wait`], but gives up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError::Timeout`] if the wait had not finished in time.
    async fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        let cancel = CancellationToken::new();
        match tokio::time::timeout(timeout, self.wait(&cancel)).await {
            Ok(res) => res,
            Err(_) => Err(LimitError::Timeout(timeout)),
        }
    }
}
