use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use report_throttle::infrastructure::mocks::RecordingNotifier;
use report_throttle::{Context, ErrorIdentity, RateLimitedReporter, ReportableError};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct BenchError(usize);

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bench failure #{}", self.0)
    }
}

impl std::error::Error for BenchError {}
impl ReportableError for BenchError {}

fn reporter() -> RateLimitedReporter {
    RateLimitedReporter::builder()
        .with_max_tracked_errors(100_000)
        .build(RecordingNotifier::new())
        .unwrap()
}

/// Benchmark identity fingerprinting speed
fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    group.bench_function("short_message", |b| {
        b.iter(|| ErrorIdentity::fingerprint(black_box("Timeout"), black_box("timed out")))
    });

    let long_message = "connection reset by peer ".repeat(40);
    group.bench_function("long_message", |b| {
        b.iter(|| ErrorIdentity::fingerprint(black_box("IoError"), black_box(&long_message)))
    });

    group.finish();
}

/// Benchmark the suppression path, the hot path during an incident
fn bench_suppressed_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("suppressed");
    group.throughput(Throughput::Elements(1));

    let reporter = reporter();
    reporter
        .report(&BenchError(0), Context::new(), Some("hot"))
        .unwrap();

    group.bench_function("no_user", |b| {
        b.iter(|| {
            reporter
                .report(black_box(&BenchError(0)), Context::new(), Some("hot"))
                .unwrap()
        })
    });

    group.bench_function("with_user", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            let mut context = Context::new();
            context.insert("user_id".to_string(), json!(i % 2000));
            reporter
                .report(black_box(&BenchError(0)), context, Some("hot"))
                .unwrap()
        })
    });

    group.finish();
}

/// Benchmark delivery of distinct identities
fn bench_distinct_identities(c: &mut Criterion) {
    let mut group = c.benchmark_group("distinct_identities");

    for count in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("identities", count), count, |b, &count| {
            b.iter(|| {
                let reporter = reporter();
                for i in 0..count {
                    reporter
                        .report(black_box(&BenchError(i)), Context::new(), None)
                        .unwrap();
                }
            })
        });
    }

    group.finish();
}

/// Benchmark multi-threaded reporting against one shared store
fn bench_concurrent_reports(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        group.bench_with_input(
            BenchmarkId::new("threads", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let reporter = Arc::new(reporter());
                    let mut handles = vec![];

                    for t in 0..num_threads {
                        let reporter = Arc::clone(&reporter);
                        let handle = std::thread::spawn(move || {
                            // Each thread uses its own identity to avoid contention
                            let key = format!("thread-{}", t);
                            for _ in 0..1000 {
                                reporter
                                    .report(&BenchError(t), Context::new(), Some(&key))
                                    .unwrap();
                            }
                        });
                        handles.push(handle);
                    }

                    for handle in handles {
                        handle.join().unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_fingerprint,
    bench_suppressed_reports,
    bench_distinct_identities,
    bench_concurrent_reports
);
criterion_main!(benches);
