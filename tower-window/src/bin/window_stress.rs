use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use hdrhistogram::Histogram;
use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tower::BoxError;
use tower::Layer;
use tower::Service;
use tower::ServiceExt;
use tower::service_fn;
use tower_window::GuardError;
use tower_window::GuardLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use window_limit::FixedWindowConfig;
use window_limit::FixedWindowLimiter;
use window_limit::NullLimiter;
use window_limit::RateLimiter;

async fn mock_db_call(_req: ()) -> Result<&'static str, BoxError> {
    // Simulate real-world work (5ms of DB latency)
    sleep(Duration::from_millis(5)).await;
    Ok("success")
}

#[derive(Default)]
struct RejectionCounter {
    timeouts: usize,
    cancelled: usize,
    rate_limited: usize,
    unknown: usize,
}

impl RejectionCounter {
    fn total(&self) -> usize {
        self.timeouts + self.cancelled + self.rate_limited + self.unknown
    }
}

async fn run_load_test<S>(name: &str, svc: S, total_reqs: usize) -> Result<(), BoxError>
where
    S: Service<(), Response = &'static str, Error = BoxError> + Clone + Send + 'static,
    S::Future: Send,
{
    let mut hist_elapsed = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3)?;

    let mut tasks = JoinSet::new();
    let mut rejections = RejectionCounter::default();

    let start = Instant::now();

    let barrier = Arc::new(Barrier::new(total_reqs));

    for _ in 0..total_reqs {
        let local_svc = svc.clone();
        let bar = barrier.clone();
        tasks.spawn(async move {
            bar.wait().await;
            let req_start = Instant::now();
            let res = local_svc.oneshot(()).await;
            (res, req_start.elapsed())
        });
    }

    let mut success_count = 0;

    while let Some(task) = tasks.join_next().await {
        let (res, elapsed) = task?;
        match res {
            Ok(_) => {
                success_count += 1;
                hist_elapsed.record(elapsed.as_micros() as u64)?;
            }
            Err(e) => match e.downcast_ref::<GuardError>() {
                Some(GuardError::Timeout) => rejections.timeouts += 1,
                Some(GuardError::Cancelled) => rejections.cancelled += 1,
                Some(GuardError::RateLimited { .. }) => rejections.rate_limited += 1,
                None => rejections.unknown += 1,
            },
        }
    }

    let total_duration = start.elapsed();
    let throughput = total_reqs as f64 / total_duration.as_secs_f64();
    let goodput = success_count as f64 / total_duration.as_secs_f64();

    println!("--- {} ---", name);
    println!("Total Duration:  {:.2?}", total_duration);
    println!("Success/Total:   {}/{}", success_count, total_reqs);
    println!("Total Rate:      {:.2} req/sec", throughput);
    println!("Success Rate:    {:.2} req/sec (Goodput)", goodput);

    if success_count > 0 {
        println!("P50 (Elapsed):   {}µs", hist_elapsed.value_at_quantile(0.5));
        println!(
            "P99 (Elapsed):   {}µs",
            hist_elapsed.value_at_quantile(0.99)
        );
    }

    let total_errors = rejections.total();
    println!("Errors:          {}", total_errors);
    if total_errors > 0 {
        println!("  └─ Timeouts:    {}", rejections.timeouts);
        println!("  └─ Cancelled:   {}", rejections.cancelled);
        println!("  └─ RateLimited: {}", rejections.rate_limited);
        if rejections.unknown > 0 {
            println!("  └─ Unknown:     {}", rejections.unknown);
        }
    }
    println!();
    Ok(())
}

fn fixed(limit: usize, window: Duration) -> Arc<dyn RateLimiter> {
    Arc::new(FixedWindowLimiter::new(FixedWindowConfig::new(limit, window)))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let capacity = 1_000;
    let window = Duration::from_millis(100);
    let timeout = Duration::from_millis(550);
    let total_reqs = 10_000;

    info!(capacity, ?window, total_reqs, "starting window stress");

    // 1. Waiting guard, bounded by a timeout
    let svc = GuardLayer::new(fixed(capacity, window))
        .with_timeout(timeout)
        .layer(service_fn(mock_db_call));
    run_load_test("Waiting Fixed Window", svc, total_reqs).await?;

    // 2. Fail fast guard
    let svc = GuardLayer::new(fixed(capacity, window))
        .with_fail_fast(true)
        .layer(service_fn(mock_db_call));
    run_load_test("Fail Fast Fixed Window", svc, total_reqs).await?;

    // 3. Waiting guard, cancelled part way through
    let cancel = CancellationToken::new();
    let svc = GuardLayer::new(fixed(capacity, window))
        .with_cancellation(cancel.clone())
        .layer(service_fn(mock_db_call));
    let trigger = cancel.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(450)).await;
        trigger.cancel();
    });
    run_load_test("Cancelled Fixed Window", svc, total_reqs).await?;

    // 4. Limiting switched off
    let null: Arc<dyn RateLimiter> = Arc::new(NullLimiter);
    let svc = GuardLayer::new(null).layer(service_fn(mock_db_call));
    run_load_test("Null Limiter", svc, total_reqs).await?;

    Ok(())
}
