use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tower::Layer;
use window_limit::RateLimiter;

use crate::service::GuardService;

/// Guards requests with a [`RateLimiter`].
#[derive(Debug)]
pub struct GuardLayer<L>
where
    L: ?Sized,
{
    limiter: Arc<L>,
    fail_fast: bool,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl<L> Clone for GuardLayer<L>
where
    L: ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            fail_fast: self.fail_fast,
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

impl<L> GuardLayer<L>
where
    L: RateLimiter + ?Sized,
{
    /// Create a GuardLayer
    pub fn new(limiter: Arc<L>) -> Self {
        GuardLayer {
            limiter,
            fail_fast: false,
            timeout: None,
            cancel: None,
        }
    }

    /// Set whether the service should fail immediately when the window is exhausted.
    ///
    /// If `true`, the service will return `GuardError::RateLimited` immediately
    /// instead of waiting for the next window.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the longest a request may wait for admission.
    ///
    /// If the wait exceeds this duration, the service will return
    /// `GuardError::Timeout`. Ignored in fail-fast mode.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abort every pending wait when `cancel` fires, e.g. on shutdown.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl<L, S> Layer<S> for GuardLayer<L>
where
    L: ?Sized,
{
    type Service = GuardService<L, S>;

    fn layer(&self, service: S) -> Self::Service {
        let mut svc =
            GuardService::new(service, self.limiter.clone()).with_fail_fast(self.fail_fast);
        if let Some(timeout) = self.timeout {
            svc = svc.with_timeout(timeout);
        }
        if let Some(cancel) = &self.cancel {
            svc = svc.with_cancellation(cancel.clone());
        }
        svc
    }
}
