use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::RateLimiter;
use crate::Remaining;
use crate::Result;

/// A limiter that never limits.
///
/// Drop it in wherever a [`RateLimiter`] is expected to switch limiting off
/// without branching at the call site.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullLimiter;

#[async_trait]
impl RateLimiter for NullLimiter {
    fn allow(&self) -> Result<bool> {
        Ok(true)
    }

    async fn wait(&self, _cancel: &CancellationToken) -> Result<bool> {
        Ok(true)
    }

    fn remaining(&self) -> Result<Remaining> {
        Ok(Remaining {
            quota: usize::MAX,
            reset_in: Duration::ZERO,
        })
    }

    async fn wait_timeout(&self, _timeout: Duration) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::FixedWindowConfig;
    use crate::FixedWindowLimiter;

    #[test]
    fn it_always_allows() {
        let rl = NullLimiter;
        for _ in 0..1_000 {
            assert_eq!(rl.allow(), Ok(true));
        }
        assert_eq!(rl.remaining().unwrap().quota, usize::MAX);
    }

    #[tokio::test]
    async fn it_never_waits() {
        let rl = NullLimiter;
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(rl.wait(&cancel).await, Ok(true));
        assert_eq!(rl.wait_timeout(Duration::ZERO).await, Ok(true));
    }

    #[tokio::test]
    async fn it_swaps_for_a_fixed_window() {
        let limiters: Vec<Arc<dyn RateLimiter>> = vec![
            Arc::new(NullLimiter),
            Arc::new(FixedWindowLimiter::new(FixedWindowConfig::new(
                1,
                Duration::from_secs(60),
            ))),
        ];

        let cancel = CancellationToken::new();
        for rl in limiters {
            assert_eq!(rl.wait(&cancel).await, Ok(true));
        }
    }
}
