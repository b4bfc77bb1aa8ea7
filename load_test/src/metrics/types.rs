//! Metric types

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct IterationMetrics {
    pub started: u64,
    pub completed: u64,
    pub in_flight: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HttpMetrics {
    pub requests: u64,
    /// Requests answered with anything but 200 / 461, or not answered at all
    #[serde(rename = "http_req_failed")]
    pub failed: u64,
    /// Requests that never got a response
    pub transport_failures: u64,
    pub by_status: BTreeMap<u16, u64>,
}

impl HttpMetrics {
    pub fn failed_rate(&self) -> f64 {
        ratio(self.failed, self.requests)
    }
}

/// Pass/fail counts of one named check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckMetrics {
    pub passes: u64,
    pub fails: u64,
}

impl CheckMetrics {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn pass_rate(&self) -> f64 {
        ratio(self.passes, self.total())
    }
}

/// Rate metric: the fraction of samples that are non-zero.
///
/// Samples of 0 (no response at all) still count toward the total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateMetrics {
    pub samples: u64,
    pub non_zero: u64,
}

impl RateMetrics {
    pub fn add(&mut self, value: u64) {
        self.samples += 1;
        if value != 0 {
            self.non_zero += 1;
        }
    }

    pub fn rate(&self) -> f64 {
        ratio(self.non_zero, self.samples)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorMetrics {
    pub rate: RateMetrics,
    /// Recorded samples keyed by failing status
    pub by_status: BTreeMap<u16, u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemMetrics {
    pub cpu_usage: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestMetrics {
    pub iterations: IterationMetrics,
    pub http: HttpMetrics,
    pub checks: BTreeMap<String, CheckMetrics>,
    pub errors: ErrorMetrics,
    pub system: SystemMetrics,
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
