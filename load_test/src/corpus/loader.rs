use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::AlgorithmCorpus;
use crate::config::expected_file_name;
use crate::error::CorpusError;

/// Shape of `<algorithm>_expected.json`. Only `input` is used; recorded
/// outputs and other fields are ignored.
#[derive(Debug, Deserialize)]
struct ExpectedFile {
    test_cases: Vec<RecordedCase>,
}

#[derive(Debug, Deserialize)]
struct RecordedCase {
    input: Value,
}

impl AlgorithmCorpus {
    /// Load the recorded requests of `algorithms` from `dir`.
    ///
    /// Any unreadable, malformed, or empty file aborts the load.
    pub fn load<S: AsRef<str>>(dir: &Path, algorithms: &[S]) -> Result<Self, CorpusError> {
        let mut entries = Vec::with_capacity(algorithms.len());

        for algorithm in algorithms {
            let algorithm = algorithm.as_ref();
            let inputs = read_inputs(dir, algorithm)?;
            tracing::debug!(
                "Loaded {} test cases for {} from {}",
                inputs.len(),
                algorithm,
                dir.display()
            );
            entries.push((algorithm.to_string(), inputs));
        }

        Self::from_inputs(entries)
    }
}

fn read_inputs(dir: &Path, algorithm: &str) -> Result<Vec<Value>, CorpusError> {
    let path = dir.join(expected_file_name(algorithm));

    let raw = fs::read_to_string(&path).map_err(|source| CorpusError::Read {
        algorithm: algorithm.to_string(),
        path: path.clone(),
        source,
    })?;

    let file: ExpectedFile = serde_json::from_str(&raw).map_err(|source| CorpusError::Parse {
        algorithm: algorithm.to_string(),
        path: path.clone(),
        source,
    })?;

    Ok(file.test_cases.into_iter().map(|case| case.input).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::config::ALGORITHM_NAMES;

    fn write_expected(dir: &Path, algorithm: &str, contents: &str) {
        fs::write(dir.join(expected_file_name(algorithm)), contents).unwrap();
    }

    #[test]
    fn test_load_full_catalogue() {
        let dir = TempDir::new().unwrap();
        for (i, algorithm) in ALGORITHM_NAMES.iter().enumerate() {
            let file = json!({
                "test_cases": [
                    { "input": { "inputdata": { "y": ["var"] }, "seq": i }, "output": { "n_obs": 10 } },
                    { "input": { "inputdata": { "y": ["other"] } } }
                ]
            });
            write_expected(dir.path(), algorithm, &file.to_string());
        }

        let corpus = AlgorithmCorpus::load(dir.path(), &ALGORITHM_NAMES).unwrap();

        assert_eq!(corpus.algorithm_count(), ALGORITHM_NAMES.len());
        assert_eq!(corpus.total_cases(), 2 * ALGORITHM_NAMES.len());
        assert_eq!(
            corpus.algorithm_names().collect::<Vec<_>>(),
            ALGORITHM_NAMES.to_vec()
        );

        let cases = corpus.test_cases("pca").unwrap();
        assert_eq!(cases[0].input()["seq"], json!(6));
        assert!(!cases[0].body().contains("output"));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_expected(dir.path(), "pca", r#"{"test_cases": [{"input": {}}]}"#);

        let err = AlgorithmCorpus::load(dir.path(), &["pca", "ttest_paired"]).unwrap_err();
        match err {
            CorpusError::Read { algorithm, path, .. } => {
                assert_eq!(algorithm, "ttest_paired");
                assert!(path.ends_with("ttest_paired_expected.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_expected(dir.path(), "pca", "{ not json");

        let err = AlgorithmCorpus::load(dir.path(), &["pca"]).unwrap_err();
        assert!(matches!(err, CorpusError::Parse { .. }));
        assert!(err.to_string().contains("pca_expected.json"));
    }

    #[test]
    fn test_missing_fields_are_fatal() {
        let dir = TempDir::new().unwrap();

        write_expected(dir.path(), "pca", r#"{"cases": []}"#);
        let err = AlgorithmCorpus::load(dir.path(), &["pca"]).unwrap_err();
        assert!(matches!(err, CorpusError::Parse { .. }));

        write_expected(dir.path(), "pca", r#"{"test_cases": [{"output": 1}]}"#);
        let err = AlgorithmCorpus::load(dir.path(), &["pca"]).unwrap_err();
        assert!(matches!(err, CorpusError::Parse { .. }));
    }

    #[test]
    fn test_empty_test_cases_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_expected(dir.path(), "anova_oneway", r#"{"test_cases": []}"#);

        let err = AlgorithmCorpus::load(dir.path(), &["anova_oneway"]).unwrap_err();
        assert!(matches!(err, CorpusError::Empty(name) if name == "anova_oneway"));
    }
}
