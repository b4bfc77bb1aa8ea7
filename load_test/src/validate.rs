//! Corpus validation - load every selected request file without sending traffic

use anyhow::{Context, Result};

use crate::cli::CorpusArgs;
use crate::config::expected_file_name;
use crate::corpus::AlgorithmCorpus;

pub fn run(args: CorpusArgs) -> Result<()> {
    let algorithms = args.selected_algorithms();
    tracing::info!(
        "Validating {} algorithm request files in {}",
        algorithms.len(),
        args.requests_dir.display()
    );

    let corpus = AlgorithmCorpus::load(&args.requests_dir, &algorithms)
        .context("Corpus validation failed")?;

    for name in corpus.algorithm_names() {
        let cases = corpus.test_cases(name).unwrap_or_default();
        tracing::info!("  {:<28} {:>5} test cases", expected_file_name(name), cases.len());

        let non_objects = cases.iter().filter(|case| !case.input().is_object()).count();
        if non_objects > 0 {
            tracing::warn!(
                "  {} test cases of {} have a non-object input and will likely be rejected",
                non_objects,
                name
            );
        }
    }

    tracing::info!(
        "Corpus OK: {} test cases across {} algorithms",
        corpus.total_cases(),
        corpus.algorithm_count()
    );
    Ok(())
}
