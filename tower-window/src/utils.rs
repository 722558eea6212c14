use std::sync::Arc;
use std::time::Duration;

use tower::ServiceBuilder;
use tower::layer::util::Stack;

use window_limit::RateLimiter;

use crate::GuardLayer;

/// Service Builder Extension with guard helpers for tower::ServiceBuilder.
pub trait ServiceBuilderExt<L> {
    /// Add a guard that queues requests until the next window, up to `timeout`
    fn waiting_guard(
        self,
        limiter: Arc<dyn RateLimiter>,
        timeout: Duration,
    ) -> ServiceBuilder<Stack<GuardLayer<dyn RateLimiter>, L>>;

    /// Add a guard that rejects requests as soon as the window is exhausted
    fn fail_fast_guard(
        self,
        limiter: Arc<dyn RateLimiter>,
    ) -> ServiceBuilder<Stack<GuardLayer<dyn RateLimiter>, L>>;
}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn waiting_guard(
        self,
        limiter: Arc<dyn RateLimiter>,
        timeout: Duration,
    ) -> ServiceBuilder<Stack<GuardLayer<dyn RateLimiter>, L>> {
        self.layer(GuardLayer::new(limiter).with_timeout(timeout))
    }

    fn fail_fast_guard(
        self,
        limiter: Arc<dyn RateLimiter>,
    ) -> ServiceBuilder<Stack<GuardLayer<dyn RateLimiter>, L>> {
        self.layer(GuardLayer::new(limiter).with_fail_fast(true))
    }
}
