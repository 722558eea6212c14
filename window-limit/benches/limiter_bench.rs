use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;

use governor::Quota;
use governor::RateLimiter as GovernorLimiter;

use window_limit::FixedWindowConfig;
use window_limit::FixedWindowLimiter;
use window_limit::NullLimiter;
use window_limit::RateLimiter;

fn bench_single<F>(group_name: &str, c: &mut Criterion, allow: F)
where
    F: Fn() -> bool,
{
    let mut group = c.benchmark_group(group_name);

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(allow());
        })
    });

    group.finish();
}

fn bench_parallel<L: RateLimiter + 'static>(group_name: &str, c: &mut Criterion, limiter: Arc<L>) {
    let mut group = c.benchmark_group(group_name);

    for threads in [2, 4, 8].iter() {
        let num_threads = *threads;
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}-threads", num_threads)),
            &num_threads,
            |b, &n| {
                b.iter_custom(|iters| {
                    let barrier = Arc::new(Barrier::new(n + 1));
                    let mut handles = Vec::with_capacity(n);

                    for _ in 0..n {
                        let l = Arc::clone(&limiter);
                        let bar = Arc::clone(&barrier);
                        let iters_per_thread = iters / n as u64;

                        handles.push(thread::spawn(move || {
                            bar.wait(); // Wait for the start signal
                            for _ in 0..iters_per_thread {
                                let _ = black_box(l.allow());
                            }
                        }));
                    }

                    // Synchronize the start across all threads
                    barrier.wait();
                    let start = Instant::now();

                    for handle in handles {
                        let _ = handle.join();
                    }

                    start.elapsed()
                });
            },
        );
    }
    group.finish();
}

fn bench_dynamic(group_name: &str, c: &mut Criterion, limiter: Arc<dyn RateLimiter>) {
    let mut group = c.benchmark_group(format!("Dynamic-{}", group_name));

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(limiter.as_ref()).allow();
        })
    });

    group.finish();
}

fn bench_remaining(c: &mut Criterion, limiter: Arc<FixedWindowLimiter>) {
    let mut group = c.benchmark_group("FixedWindow-Remaining");

    group.bench_function("single-threaded", |b| {
        b.iter(|| {
            let _ = black_box(limiter.remaining());
        })
    });

    group.finish();
}

fn run_all_benches(c: &mut Criterion) {
    let limit_val = 1_000_000;
    let period = Duration::from_secs(60);

    let fw = Arc::new(FixedWindowLimiter::new(FixedWindowConfig::new(
        limit_val, period,
    )));
    let null = Arc::new(NullLimiter);

    // Governor as a baseline for the single threaded admission cost
    let gov_quota = Quota::per_minute(NonZeroU32::new(limit_val as u32).unwrap());
    let gov = GovernorLimiter::direct(gov_quota);

    bench_single("FixedWindow-Static", c, || fw.allow().unwrap_or(false));
    bench_parallel("FixedWindow-Static", c, fw.clone());

    bench_single("Null-Static", c, || null.allow().unwrap_or(false));
    bench_parallel("Null-Static", c, null.clone());

    bench_single("Governor-Static", c, || gov.check().is_ok());

    bench_remaining(c, fw.clone());

    let limiters: Vec<(&str, Arc<dyn RateLimiter>)> = vec![("FixedWindow", fw), ("Null", null)];

    for (name, limiter) in limiters {
        bench_dynamic(name, c, limiter);
    }
}

criterion_group!(benches, run_all_benches);
criterion_main!(benches);
