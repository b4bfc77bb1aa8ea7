//! Metrics collector - thread-safe collection with latency tracking

use std::sync::Arc;
use std::time::Instant;

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::types::TestMetrics;
use crate::config::is_expected_status;

#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<TestMetrics>>,
    request_latencies: Arc<RwLock<Histogram<u64>>>,
    iteration_latencies: Arc<RwLock<Histogram<u64>>>,
    system: Arc<RwLock<System>>,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        // Create histograms with 3 significant digits of precision
        let request_hist = Histogram::new(3).expect("Failed to create request histogram");
        let iteration_hist = Histogram::new(3).expect("Failed to create iteration histogram");

        // Initialize system monitor
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );

        Self {
            metrics: Arc::new(RwLock::new(TestMetrics::default())),
            request_latencies: Arc::new(RwLock::new(request_hist)),
            iteration_latencies: Arc::new(RwLock::new(iteration_hist)),
            system: Arc::new(RwLock::new(system)),
            start_time: Instant::now(),
        }
    }

    pub fn iteration_started(&self) {
        let mut metrics = self.metrics.write();
        metrics.iterations.started += 1;
        metrics.iterations.in_flight += 1;
    }

    pub fn iteration_completed(&self, duration_ms: u64) {
        let mut metrics = self.metrics.write();
        metrics.iterations.completed += 1;
        metrics.iterations.in_flight = metrics.iterations.in_flight.saturating_sub(1);
        drop(metrics);

        let _ = self.iteration_latencies.write().record(duration_ms);
    }

    /// Record one HTTP exchange. `status` is 0 when no response arrived.
    ///
    /// 200 and 461 are successful responses; anything else counts toward
    /// `http_req_failed`.
    pub fn request_completed(&self, status: u16, duration_ms: u64) {
        let mut metrics = self.metrics.write();
        metrics.http.requests += 1;
        if !is_expected_status(status) {
            metrics.http.failed += 1;
        }
        if status == 0 {
            metrics.http.transport_failures += 1;
        } else {
            *metrics.http.by_status.entry(status).or_default() += 1;
        }
        drop(metrics);

        let _ = self.request_latencies.write().record(duration_ms);
    }

    /// Record the outcome of a named check and return it.
    pub fn record_check(&self, name: &str, passed: bool) -> bool {
        let mut metrics = self.metrics.write();
        let check = metrics.checks.entry(name.to_string()).or_default();
        if passed {
            check.passes += 1;
        } else {
            check.fails += 1;
        }
        passed
    }

    /// Add a sample to the error-rate metric.
    pub fn record_error(&self, status: u16) {
        let mut metrics = self.metrics.write();
        metrics.errors.rate.add(u64::from(status));
        *metrics.errors.by_status.entry(status).or_default() += 1;
    }

    /// Update system metrics (CPU, memory)
    pub fn update_system_metrics(&self) {
        let mut system = self.system.write();
        system.refresh_cpu_all();
        system.refresh_memory();

        let mut metrics = self.metrics.write();

        // Get global CPU usage
        metrics.system.cpu_usage = system.global_cpu_usage();

        // Get memory usage
        metrics.system.memory_used_mb = system.used_memory() / 1024 / 1024;
        metrics.system.memory_total_mb = system.total_memory() / 1024 / 1024;
    }

    pub fn get_snapshot(&self) -> TestMetrics {
        self.metrics.read().clone()
    }

    pub fn get_request_latency_percentiles(&self) -> LatencyStats {
        LatencyStats::from_histogram(&self.request_latencies.read())
    }

    pub fn get_iteration_latency_percentiles(&self) -> LatencyStats {
        LatencyStats::from_histogram(&self.iteration_latencies.read())
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct LatencyStats {
    pub min: u64,
    pub p50: u64,
    pub p90: u64,
    pub p95: u64,
    pub p99: u64,
    pub max: u64,
    pub mean: f64,
    pub count: u64,
}

impl LatencyStats {
    fn from_histogram(hist: &Histogram<u64>) -> Self {
        Self {
            min: hist.min(),
            p50: hist.value_at_quantile(0.50),
            p90: hist.value_at_quantile(0.90),
            p95: hist.value_at_quantile(0.95),
            p99: hist.value_at_quantile(0.99),
            max: hist.max(),
            mean: hist.mean(),
            count: hist.len(),
        }
    }
}
