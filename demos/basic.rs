//! Basic example demonstrating cooldown-based report throttling.
//!
//! Reports are written to the log by `LogNotifier`. The first occurrence of
//! each error is reported; repeats inside the cooldown are counted and folded
//! into the next report.

use report_throttle::{Context, GroupableError, LogNotifier, RateLimitedReporter, ReportableError};
use serde_json::json;
use std::fmt;
use std::time::Duration;

#[derive(Debug)]
struct CheckoutFailed {
    order: u32,
}

impl fmt::Display for CheckoutFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "checkout failed for order {}", self.order)
    }
}

impl std::error::Error for CheckoutFailed {}

// Group every checkout failure together, whatever the order number
impl GroupableError for CheckoutFailed {
    fn error_group(&self) -> String {
        "checkout".to_string()
    }
}

impl ReportableError for CheckoutFailed {
    fn as_groupable(&self) -> Option<&dyn GroupableError> {
        Some(self)
    }
}

#[derive(Debug)]
struct DiskFull;

impl fmt::Display for DiskFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no space left on device")
    }
}

impl std::error::Error for DiskFull {}
impl ReportableError for DiskFull {}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let reporter = RateLimitedReporter::builder()
        .with_cooldown(Duration::from_secs(5))
        .with_debug(true)
        .build(LogNotifier::new())
        .expect("valid configuration");

    println!("=== Basic Report Throttling Example ===\n");
    println!("Cooldown: 5 seconds\n");

    println!("Reporting 10 checkout failures from 10 users:");
    for i in 1..=10 {
        let mut context = Context::new();
        context.insert("user_id".to_string(), json!(i));
        let outcome = reporter
            .report(&CheckoutFailed { order: 1000 + i }, context, None)
            .expect("in-memory store never fails");
        println!("  order {} -> {:?}", 1000 + i, outcome);
    }

    println!("\nA different error has its own window:");
    let outcome = reporter
        .report(&DiskFull, Context::new(), None)
        .expect("in-memory store never fails");
    println!("  disk full -> {:?}", outcome);

    println!("\nWaiting for the cooldown to pass...");
    std::thread::sleep(Duration::from_secs(6));

    let outcome = reporter
        .report(&CheckoutFailed { order: 2000 }, Context::new(), None)
        .expect("in-memory store never fails");
    println!("  order 2000 -> {:?} (carries the suppressed occurrences)", outcome);

    let snapshot = reporter.metrics().snapshot();
    println!("\n=== Example Complete ===");
    println!(
        "delivered: {}, suppressed: {}, bypassed: {}",
        snapshot.reports_delivered, snapshot.reports_suppressed, snapshot.reports_bypassed
    );
}
