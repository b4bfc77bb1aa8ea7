//! Algorithm catalogue and protocol constants for the MIP engine

/// Algorithms exercised by the load test, in corpus order.
pub const ALGORITHM_NAMES: [&str; 11] = [
    "anova_oneway",
    "descriptive_stats",
    "linear_regression",
    "linear_regression_cv",
    "logistic_regression",
    "logistic_regression_cv",
    "pca",
    "pearson_correlation",
    "ttest_independent",
    "ttest_onesample",
    "ttest_paired",
];

/// Regular success.
pub const STATUS_OK: u16 = 200;

/// Engine-specific "not enough data" response. Counts as a success.
pub const STATUS_NOT_ENOUGH_DATA: u16 = 461;

/// Status recorded when no HTTP response was received (timeout, refused, DNS).
pub const STATUS_TRANSPORT_FAILURE: u16 = 0;

/// Algorithm execution can be slow; requests get up to an hour.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3600;

pub const DEFAULT_REQUESTS_DIR: &str = "/algorithm_requests";
pub const DEFAULT_BASE_URL: &str = "http://uoa.hbpmip.link:30000";

/// Path segment under the base URL that hosts algorithm endpoints.
pub const ALGORITHMS_PATH: &str = "algorithms";

/// Name of the per-iteration status check.
pub const STATUS_CHECK: &str = "is status 200 or 461";

/// Name of the error-rate metric.
pub const ERRORS_METRIC: &str = "errors";

pub fn is_known_algorithm(name: &str) -> bool {
    ALGORITHM_NAMES.contains(&name)
}

/// File holding the recorded requests of one algorithm.
pub fn expected_file_name(algorithm: &str) -> String {
    format!("{}_expected.json", algorithm)
}

/// Whether a response status counts as a successful iteration.
pub fn is_expected_status(status: u16) -> bool {
    status == STATUS_OK || status == STATUS_NOT_ENOUGH_DATA
}
