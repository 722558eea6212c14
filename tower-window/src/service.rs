use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tower::Service;
use tracing::debug;

use window_limit::RateLimiter;

use crate::error::GuardError;

#[derive(Clone, Debug)]
struct GuardServiceMetrics {
    admitted: Counter<u64>,
    rejected: Counter<u64>,
    cancelled: Counter<u64>,
}

impl GuardServiceMetrics {
    fn new() -> Self {
        let meter = global::meter("guard_service");
        Self {
            admitted: meter.u64_counter("admitted").build(),
            rejected: meter.u64_counter("rejected").build(),
            cancelled: meter.u64_counter("cancelled").build(),
        }
    }

    fn record(&self, mode: &'static str, outcome: &Result<(), GuardError>) {
        let attrs = [KeyValue::new("mode", mode)];
        match outcome {
            Ok(()) => self.admitted.add(1, &attrs),
            Err(GuardError::Cancelled) => self.cancelled.add(1, &attrs),
            Err(_) => self.rejected.add(1, &attrs),
        }
    }
}

/// Admits each request through a [`RateLimiter`] before calling the inner service.
#[derive(Debug)]
pub struct GuardService<L, S>
where
    L: ?Sized,
{
    inner: S,
    limiter: Arc<L>,
    fail_fast: bool,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    instruments: GuardServiceMetrics,
}

// Manually implement Clone so L does not need to be Clone
impl<L, S> Clone for GuardService<L, S>
where
    L: ?Sized,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
            fail_fast: self.fail_fast,
            timeout: self.timeout,
            cancel: self.cancel.clone(),
            instruments: self.instruments.clone(),
        }
    }
}

async fn admit<L>(
    limiter: &L,
    fail_fast: bool,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<(), GuardError>
where
    L: RateLimiter + ?Sized,
{
    let admitted = if fail_fast {
        limiter.allow()?
    } else {
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, limiter.wait(cancel))
                .await
                .map_err(|_| GuardError::Timeout)??,
            None => limiter.wait(cancel).await?,
        }
    };

    if admitted {
        return Ok(());
    }
    let retry_after = limiter.remaining()?.reset_in;
    Err(GuardError::RateLimited { retry_after })
}

impl<L, S, Req> Service<Req> for GuardService<L, S>
where
    L: RateLimiter + ?Sized + 'static,
    S: Service<Req, Error = BoxError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Response: 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Admission happens in call(), so readiness is the inner service's alone
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // The readied service goes into the future, the fresh clone stays behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let limiter = Arc::clone(&self.limiter);
        let fail_fast = self.fail_fast;
        let timeout = self.timeout;
        let cancel = self.cancel.clone();
        let instruments = self.instruments.clone();

        Box::pin(async move {
            let mode = if fail_fast { "fail_fast" } else { "wait" };
            let outcome = admit(limiter.as_ref(), fail_fast, timeout, &cancel).await;
            instruments.record(mode, &outcome);

            if let Err(err) = outcome {
                debug!(%err, mode, "request rejected by guard");
                return Err(BoxError::from(err));
            }
            inner.call(req).await
        })
    }
}

impl<L, S> GuardService<L, S>
where
    L: ?Sized,
{
    pub fn new(inner: S, limiter: Arc<L>) -> Self {
        Self {
            inner,
            limiter,
            fail_fast: false,
            timeout: None,
            cancel: CancellationToken::new(),
            instruments: GuardServiceMetrics::new(),
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
