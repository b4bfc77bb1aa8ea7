use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Args, Parser, Subcommand};

use crate::config::load_profiles::PROFILE_NAMES;
use crate::config::{
    ALGORITHM_NAMES, DEFAULT_BASE_URL, DEFAULT_REQUESTS_DIR, DEFAULT_REQUEST_TIMEOUT_SECS,
};

/// MIP Engine Algorithm Load Testing Tool
#[derive(Parser, Debug)]
#[command(name = "load-test")]
#[command(about = "Randomized algorithm load test for the MIP engine")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Run virtual users against the engine (until duration, iteration budget or Ctrl+C)
    Run(RunArgs),

    /// Load and validate the request corpus without sending any traffic
    Validate(CorpusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Directory holding <algorithm>_expected.json files
    #[arg(
        long,
        default_value = DEFAULT_REQUESTS_DIR,
        env = "MIP_LOADTEST_REQUESTS_DIR"
    )]
    pub requests_dir: PathBuf,

    /// Comma-separated subset of algorithms to exercise (default: all)
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = PossibleValuesParser::new(ALGORITHM_NAMES)
    )]
    pub algorithms: Vec<String>,
}

impl CorpusArgs {
    /// Selected algorithms in catalogue order, without duplicates.
    pub fn selected_algorithms(&self) -> Vec<String> {
        ALGORITHM_NAMES
            .iter()
            .filter(|name| self.algorithms.is_empty() || self.algorithms.iter().any(|a| a == *name))
            .map(|name| name.to_string())
            .collect()
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Engine base URL; requests go to <base-url>/algorithms/<name>
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "MIP_ENGINE_URL")]
    pub base_url: String,

    /// Load profile: smoke, load, stress
    #[arg(
        long,
        default_value = "load",
        value_parser = PROFILE_NAMES,
        env = "MIP_LOADTEST_PROFILE"
    )]
    pub profile: String,

    /// Number of virtual users (overrides the profile)
    #[arg(long, env = "MIP_LOADTEST_VUS")]
    pub vus: Option<usize>,

    /// Test duration in seconds, 0 for no time limit (overrides the profile)
    #[arg(long, env = "MIP_LOADTEST_DURATION")]
    pub duration: Option<u64>,

    /// Seconds in-flight iterations may run past the duration before being interrupted
    #[arg(long)]
    pub graceful_stop: Option<u64>,

    /// Total iterations shared by all virtual users
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), env = "MIP_LOADTEST_ITERATIONS")]
    pub iterations: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Base RNG seed; virtual user N uses seed + N
    #[arg(long)]
    pub seed: Option<u64>,

    /// Live metrics refresh interval in seconds (0 disables the live view)
    #[arg(long, default_value = "0")]
    pub report_interval: u64,

    /// Write the final summary as JSON to this path
    #[arg(long)]
    pub summary_export: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["load-test", "run"]).unwrap();
        let Mode::Run(args) = cli.mode else {
            panic!("expected run mode");
        };

        assert_eq!(args.profile, "load");
        assert_eq!(args.timeout, 3600);
        assert_eq!(args.report_interval, 0);
        assert_eq!(args.corpus.requests_dir, PathBuf::from("/algorithm_requests"));
        assert_eq!(args.corpus.selected_algorithms().len(), ALGORITHM_NAMES.len());
        assert!(args.vus.is_none());
        assert!(args.iterations.is_none());
    }

    #[test]
    fn test_algorithm_subset() {
        let cli = Cli::try_parse_from([
            "load-test",
            "validate",
            "--algorithms",
            "ttest_paired,pca,pca",
        ])
        .unwrap();
        let Mode::Validate(args) = cli.mode else {
            panic!("expected validate mode");
        };

        assert_eq!(args.selected_algorithms(), vec!["pca", "ttest_paired"]);
    }

    #[test]
    fn test_rejects_unknown_algorithm_and_zero_iterations() {
        assert!(Cli::try_parse_from(["load-test", "run", "--algorithms", "kmeans"]).is_err());
        assert!(Cli::try_parse_from(["load-test", "run", "--iterations", "0"]).is_err());
        assert!(Cli::try_parse_from(["load-test", "run", "--profile", "soak"]).is_err());
    }

    #[test]
    fn test_global_verbose_flag() {
        let cli = Cli::try_parse_from(["load-test", "run", "-v", "--vus", "3"]).unwrap();
        assert!(cli.verbose);
        let Mode::Run(args) = cli.mode else {
            panic!("expected run mode");
        };
        assert_eq!(args.vus, Some(3));
    }
}
