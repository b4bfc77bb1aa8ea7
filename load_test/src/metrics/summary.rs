//! End-of-run summary export

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::collector::{LatencyStats, MetricsCollector};
use super::types::TestMetrics;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub base_url: String,
    pub vus: usize,
    pub duration_secs: u64,
    pub metrics: TestMetrics,
    pub http_req_duration_ms: LatencyStats,
    pub iteration_duration_ms: LatencyStats,
}

impl RunSummary {
    pub fn capture(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        base_url: &str,
        vus: usize,
        collector: &MetricsCollector,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            base_url: base_url.to_string(),
            vus,
            duration_secs: collector.elapsed_seconds(),
            metrics: collector.get_snapshot(),
            http_req_duration_ms: collector.get_request_latency_percentiles(),
            iteration_duration_ms: collector.get_iteration_latency_percentiles(),
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize summary")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        Ok(())
    }
}
