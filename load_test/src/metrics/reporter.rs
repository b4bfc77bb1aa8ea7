//! Console reporter for metrics with real-time updates

use std::io::{self, Write};

use tokio::time::{interval, Duration};

use super::collector::{LatencyStats, MetricsCollector};
use super::types::TestMetrics;
use crate::config::ERRORS_METRIC;

/// Start periodic metrics reporting (every N seconds)
pub async fn start_periodic_reporter(collector: MetricsCollector, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        // Update system metrics before printing
        collector.update_system_metrics();

        print_live_metrics(&collector);
    }
}

/// Print live metrics (clears screen and updates in place)
pub fn print_live_metrics(collector: &MetricsCollector) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[1;1H");

    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed_seconds();
    let latency = collector.get_request_latency_percentiles();

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║          MIP Engine Algorithm Load Test - Live Metrics         ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    println!(
        "\n⏱️  Elapsed Time: {:02}:{:02}:{:02}",
        elapsed / 3600,
        (elapsed % 3600) / 60,
        elapsed % 60
    );

    println!("\n┌─ ITERATIONS ───────────────────────────────────────────────┐");
    println!(
        "│  Started:      {:>8}    In-Flight:  {:>8}              │",
        metrics.iterations.started, metrics.iterations.in_flight
    );
    println!(
        "│  Completed:    {:>8}    Requests:   {:>8}              │",
        metrics.iterations.completed, metrics.http.requests
    );
    println!(
        "│  Failed Requests: {:>8}  ({:>6.2}%)                       │",
        metrics.http.failed,
        metrics.http.failed_rate() * 100.0
    );
    if elapsed > 0 {
        let throughput = metrics.iterations.completed as f64 / elapsed as f64;
        println!(
            "│  Throughput: {:>8.2}/sec                                    │",
            throughput
        );
    }
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n┌─ CHECKS ───────────────────────────────────────────────────┐");
    for (name, check) in &metrics.checks {
        println!(
            "│  {:<24} ✓ {:>8}  ✗ {:>8}  {:>6.2}%       │",
            name,
            check.passes,
            check.fails,
            check.pass_rate() * 100.0
        );
    }
    println!(
        "│  {:<24} {:>6.2}%  ({} samples)                 │",
        ERRORS_METRIC,
        metrics.errors.rate.rate() * 100.0,
        metrics.errors.rate.samples
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    if latency.count > 0 {
        println!("\n┌─ REQUEST LATENCY (ms) ─────────────────────────────────────┐");
        println!(
            "│  Min: {:>6}  P50: {:>6}  P95: {:>6}  P99: {:>6}  Max: {:>6}│",
            latency.min, latency.p50, latency.p95, latency.p99, latency.max
        );
        println!(
            "│  Mean: {:>8.2} ms    Count: {:>10}                    │",
            latency.mean, latency.count
        );
        println!("└─────────────────────────────────────────────────────────────┘");
    }

    println!("\n┌─ SYSTEM ────────────────────────────────────────────────────┐");
    println!(
        "│  CPU Usage:    {:>6.1}%    Memory: {:>6} / {:>6} MB       │",
        metrics.system.cpu_usage, metrics.system.memory_used_mb, metrics.system.memory_total_mb
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n  [Press Ctrl+C to stop test]");

    // Flush stdout to ensure immediate display
    let _ = io::stdout().flush();
}

/// Print final summary report
pub fn print_final_report(collector: &MetricsCollector) {
    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed_seconds();
    let request_latency = collector.get_request_latency_percentiles();
    let iteration_latency = collector.get_iteration_latency_percentiles();

    println!("\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                    FINAL TEST REPORT                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    println!("\n📊 ITERATIONS");
    println!("   Total Started:        {:>10}", metrics.iterations.started);
    println!("   Total Completed:      {:>10}", metrics.iterations.completed);
    println!("   Interrupted:          {:>10}", metrics.iterations.in_flight);

    if elapsed > 0 {
        let throughput = metrics.iterations.completed as f64 / elapsed as f64;
        println!("   Throughput:           {:>10.2} iterations/sec", throughput);
    }

    print_checks(&metrics);
    print_http(&metrics);

    if request_latency.count > 0 {
        print_latency("📈 HTTP REQUEST DURATION", &request_latency);
    }
    if iteration_latency.count > 0 {
        print_latency("📈 ITERATION DURATION", &iteration_latency);
    }

    println!("\n⏱️  Test Duration: {} seconds", elapsed);
    println!("════════════════════════════════════════════════════════════════\n");
}

fn print_checks(metrics: &TestMetrics) {
    println!("\n✅ CHECKS");
    for (name, check) in &metrics.checks {
        println!(
            "   {:<28} {:>6.2}%  ✓ {} ✗ {}",
            name,
            check.pass_rate() * 100.0,
            check.passes,
            check.fails
        );
    }

    println!("\n❌ {}", ERRORS_METRIC.to_uppercase());
    println!(
        "   Rate:                 {:>10.2}%  ({} of {} samples non-zero)",
        metrics.errors.rate.rate() * 100.0,
        metrics.errors.rate.non_zero,
        metrics.errors.rate.samples
    );
    for (status, count) in &metrics.errors.by_status {
        let label = if *status == 0 {
            "no response".to_string()
        } else {
            format!("status {}", status)
        };
        println!("   {:<22}{:>10}", label, count);
    }
}

fn print_http(metrics: &TestMetrics) {
    println!("\n🌐 HTTP");
    println!("   Requests:             {:>10}", metrics.http.requests);
    println!(
        "   http_req_failed:      {:>10.2}%  ({} of {})",
        metrics.http.failed_rate() * 100.0,
        metrics.http.failed,
        metrics.http.requests
    );
    println!("   Transport Failures:   {:>10}", metrics.http.transport_failures);
    for (status, count) in &metrics.http.by_status {
        println!("   Status {:<15}{:>10}", status, count);
    }
}

fn print_latency(title: &str, latency: &LatencyStats) {
    println!("\n{}", title);
    println!("   Min:                  {:>10} ms", latency.min);
    println!("   P50 (Median):         {:>10} ms", latency.p50);
    println!("   P90:                  {:>10} ms", latency.p90);
    println!("   P95:                  {:>10} ms", latency.p95);
    println!("   P99:                  {:>10} ms", latency.p99);
    println!("   Max:                  {:>10} ms", latency.max);
    println!("   Mean:                 {:>10.2} ms", latency.mean);
}
