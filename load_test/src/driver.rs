//! Randomized scenario driver
//!
//! One iteration picks a random algorithm and one of its recorded requests,
//! POSTs it to the engine, checks the status and records the outcome. An
//! iteration never fails: transport errors and unexpected statuses become a
//! failed check plus an error-rate sample, and the virtual user moves on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};

use crate::config::{
    is_expected_status, ALGORITHMS_PATH, STATUS_CHECK, STATUS_TRANSPORT_FAILURE,
};
use crate::corpus::{AlgorithmCorpus, TestCase};
use crate::error::ConfigError;
use crate::metrics::collector::MetricsCollector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    Failed,
}

impl CheckOutcome {
    pub fn from_status(status: u16) -> Self {
        if is_expected_status(status) {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed
        }
    }

    pub fn passed(self) -> bool {
        self == CheckOutcome::Passed
    }
}

/// What one iteration observed. Dropped once the iteration is recorded.
#[derive(Debug, Clone)]
pub struct IterationResult {
    pub algorithm: String,
    pub url: String,
    /// HTTP status, or 0 when no response arrived
    pub status: u16,
    pub body: String,
    pub duration: Duration,
    pub outcome: CheckOutcome,
}

/// Validate a base URL and strip any trailing `/`.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

/// `<base_url>/algorithms/<algorithm>`
pub fn algorithm_url(base_url: &str, algorithm: &str) -> String {
    format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        ALGORITHMS_PATH,
        algorithm
    )
}

pub struct ScenarioDriver {
    client: Client,
    corpus: Arc<AlgorithmCorpus>,
    base_url: String,
    timeout: Duration,
    collector: MetricsCollector,
}

impl ScenarioDriver {
    pub fn new(
        corpus: Arc<AlgorithmCorpus>,
        base_url: &str,
        timeout: Duration,
        collector: MetricsCollector,
    ) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            corpus,
            base_url,
            timeout,
            collector,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn corpus(&self) -> &AlgorithmCorpus {
        &self.corpus
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }

    /// Run one randomized iteration.
    pub async fn run_iteration<R: Rng + ?Sized>(&self, rng: &mut R) -> IterationResult {
        let case = self.corpus.pick(rng);
        self.execute(case).await
    }

    /// Send one recorded request and record its outcome.
    pub async fn execute(&self, case: &TestCase) -> IterationResult {
        let url = algorithm_url(&self.base_url, case.algorithm_name());

        self.collector.iteration_started();
        let start = Instant::now();

        let (status, body) = self.send(&url, case).await;
        let duration = start.elapsed();
        let duration_ms = duration.as_millis() as u64;

        self.collector.request_completed(status, duration_ms);
        tracing::info!("{}", url);

        let outcome = CheckOutcome::from_status(status);
        self.collector.record_check(STATUS_CHECK, outcome.passed());
        if !outcome.passed() {
            self.collector.record_error(status);
            tracing::warn!("Status: {} \nResponse: {}", status, body);
        }

        self.collector.iteration_completed(duration_ms);

        IterationResult {
            algorithm: case.algorithm_name().to_string(),
            url,
            status,
            body,
            duration,
            outcome,
        }
    }

    async fn send(&self, url: &str, case: &TestCase) -> (u16, String) {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/plain")
            .timeout(self.timeout)
            .body(case.body().to_string())
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.text().await {
                    Ok(body) => (status, body),
                    Err(e) => {
                        tracing::warn!("Failed to read response body from {}: {}", url, e);
                        (status, String::new())
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Request to {} failed: {}", url, e);
                (STATUS_TRANSPORT_FAILURE, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{ERRORS_METRIC, STATUS_NOT_ENOUGH_DATA, STATUS_OK};

    fn onesample_corpus() -> Arc<AlgorithmCorpus> {
        Arc::new(
            AlgorithmCorpus::from_inputs([("ttest_onesample", vec![json!({"x": [1, 2, 3]})])])
                .unwrap(),
        )
    }

    fn driver_for(corpus: Arc<AlgorithmCorpus>, base_url: &str) -> ScenarioDriver {
        ScenarioDriver::new(
            corpus,
            base_url,
            Duration::from_secs(5),
            MetricsCollector::new(),
        )
        .unwrap()
    }

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run one iteration against an engine answering `status`, returning the
    /// result and everything logged meanwhile.
    async fn logged_iteration(status: u16, body: &str) -> (IterationResult, String) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let driver = driver_for(onesample_corpus(), &mock_server.uri());
        let result = driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;

        (result, logs.contents())
    }

    #[test]
    fn test_check_outcome_is_pure_function_of_status() {
        assert_eq!(CheckOutcome::from_status(STATUS_OK), CheckOutcome::Passed);
        assert_eq!(
            CheckOutcome::from_status(STATUS_NOT_ENOUGH_DATA),
            CheckOutcome::Passed
        );
        for status in [0, 400, 500, 503] {
            assert_eq!(CheckOutcome::from_status(status), CheckOutcome::Failed);
            assert_eq!(
                CheckOutcome::from_status(status),
                CheckOutcome::from_status(status)
            );
        }
    }

    #[test]
    fn test_algorithm_url() {
        assert_eq!(
            algorithm_url("http://host:30000", "pca"),
            "http://host:30000/algorithms/pca"
        );
        assert_eq!(
            algorithm_url("http://host:30000/", "ttest_paired"),
            "http://host:30000/algorithms/ttest_paired"
        );
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://host:30000/").unwrap(),
            "http://host:30000"
        );
        assert_eq!(
            normalize_base_url("https://engine.example/mip").unwrap(),
            "https://engine.example/mip"
        );
        assert!(normalize_base_url("host:30000").is_err());
        assert!(normalize_base_url("ftp://host").is_err());
        assert!(normalize_base_url("http://host/?a=1").is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ScenarioDriver::new(
            onesample_corpus(),
            "http://localhost:30000",
            Duration::ZERO,
            MetricsCollector::new(),
        );
        assert!(matches!(result, Err(ConfigError::ZeroTimeout)));
    }

    #[tokio::test]
    async fn test_success_records_no_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/algorithms/ttest_onesample"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "text/plain"))
            .and(body_json(json!({"x": [1, 2, 3]})))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"t_stat\": 1.0}"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let driver = driver_for(onesample_corpus(), &mock_server.uri());
        let result = driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;

        assert_eq!(result.status, 200);
        assert_eq!(result.outcome, CheckOutcome::Passed);
        assert_eq!(
            result.url,
            format!("{}/algorithms/ttest_onesample", mock_server.uri())
        );

        let metrics = driver.collector().get_snapshot();
        assert_eq!(metrics.checks[STATUS_CHECK].passes, 1);
        assert_eq!(metrics.errors.rate.samples, 0, "{} recorded", ERRORS_METRIC);
        assert_eq!(metrics.iterations.completed, 1);
    }

    #[tokio::test]
    async fn test_not_enough_data_is_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(461).set_body_string("Not enough data"))
            .mount(&mock_server)
            .await;

        let driver = driver_for(onesample_corpus(), &mock_server.uri());
        let result = driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;

        assert_eq!(result.status, 461);
        assert!(result.outcome.passed());

        let metrics = driver.collector().get_snapshot();
        assert_eq!(metrics.errors.rate.samples, 0);
        assert_eq!(metrics.http.failed, 0);
    }

    #[tokio::test]
    async fn test_unexpected_status_records_one_error_sample() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("engine unavailable"))
            .mount(&mock_server)
            .await;

        let driver = driver_for(onesample_corpus(), &mock_server.uri());
        let result = driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;

        assert_eq!(result.status, 503);
        assert_eq!(result.body, "engine unavailable");
        assert_eq!(result.outcome, CheckOutcome::Failed);

        let metrics = driver.collector().get_snapshot();
        assert_eq!(metrics.checks[STATUS_CHECK].fails, 1);
        assert_eq!(metrics.errors.rate.samples, 1);
        assert_eq!(metrics.errors.by_status.get(&503), Some(&1));
        assert_eq!(metrics.http.by_status.get(&503), Some(&1));
        assert_eq!(metrics.http.failed, 1);
    }

    #[tokio::test]
    async fn test_failure_logs_status_and_body() {
        let (result, logs) = logged_iteration(503, "engine unavailable").await;

        assert!(logs.contains(&result.url), "url not logged: {}", logs);
        assert!(logs.contains("Status: 503"), "status not logged: {}", logs);
        assert!(logs.contains("Response: engine unavailable"), "body not logged: {}", logs);
    }

    #[tokio::test]
    async fn test_success_logs_url_only() {
        for status in [200, 461] {
            let (result, logs) = logged_iteration(status, "ok").await;

            assert!(result.outcome.passed());
            assert!(logs.contains(&result.url), "url not logged for {}: {}", status, logs);
            assert!(!logs.contains("Status:"), "failure logged for {}: {}", status, logs);
        }
    }

    #[tokio::test]
    async fn test_client_error_status_fails_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&mock_server)
            .await;

        let driver = driver_for(onesample_corpus(), &mock_server.uri());
        driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;
        driver.run_iteration(&mut StdRng::seed_from_u64(2)).await;

        let metrics = driver.collector().get_snapshot();
        assert_eq!(metrics.checks[STATUS_CHECK].fails, 2);
        assert_eq!(metrics.errors.by_status.get(&400), Some(&2));
    }

    #[tokio::test]
    async fn test_connection_refused_records_zero_status() {
        // Reserve a port, then free it so nothing is listening there.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let driver = driver_for(onesample_corpus(), &format!("http://127.0.0.1:{}", port));
        let result = driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;

        assert_eq!(result.status, STATUS_TRANSPORT_FAILURE);
        assert_eq!(result.outcome, CheckOutcome::Failed);

        let metrics = driver.collector().get_snapshot();
        assert_eq!(metrics.http.transport_failures, 1);
        assert_eq!(metrics.errors.rate.samples, 1);
        assert_eq!(metrics.errors.rate.non_zero, 0);
        assert_eq!(metrics.errors.by_status.get(&0), Some(&1));
    }

    #[tokio::test]
    async fn test_timeout_is_a_failed_check() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let driver = ScenarioDriver::new(
            onesample_corpus(),
            &mock_server.uri(),
            Duration::from_millis(100),
            MetricsCollector::new(),
        )
        .unwrap();
        let result = driver.run_iteration(&mut StdRng::seed_from_u64(1)).await;

        assert_eq!(result.status, STATUS_TRANSPORT_FAILURE);
        assert!(!result.outcome.passed());
    }

    #[tokio::test]
    async fn test_urls_only_target_corpus_algorithms() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let corpus = Arc::new(
            AlgorithmCorpus::from_inputs([
                ("pca", vec![json!({"a": 1})]),
                ("anova_oneway", vec![json!({"b": 2}), json!({"b": 3})]),
            ])
            .unwrap(),
        );
        let driver = driver_for(corpus, &mock_server.uri());

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let result = driver.run_iteration(&mut rng).await;
            let expected = format!("{}/algorithms/{}", mock_server.uri(), result.algorithm);
            assert_eq!(result.url, expected);
            assert!(result.algorithm == "pca" || result.algorithm == "anova_oneway");
        }

        let received = mock_server.received_requests().await.unwrap();
        assert_eq!(received.len(), 20);
        assert!(received.iter().all(|r| r.url.path().starts_with("/algorithms/")));
    }
}
