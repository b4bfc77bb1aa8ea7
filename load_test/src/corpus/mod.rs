//! Recorded request corpus
//!
//! The corpus is loaded once before the run and then shared read-only by
//! every virtual user behind an `Arc`. Construction guarantees that every
//! algorithm it holds has at least one test case, so picking never fails.

mod loader;

use rand::Rng;
use serde_json::Value;

use crate::config::is_known_algorithm;
use crate::error::CorpusError;

/// One recorded request for one algorithm.
#[derive(Debug, Clone)]
pub struct TestCase {
    algorithm_name: String,
    input: Value,
    body: String,
}

impl TestCase {
    pub fn new(algorithm_name: impl Into<String>, input: Value) -> Self {
        let body = input.to_string();
        Self {
            algorithm_name: algorithm_name.into(),
            input,
            body,
        }
    }

    pub fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    /// Serialized `input`, sent verbatim as the request body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[derive(Debug, Clone)]
struct AlgorithmCases {
    name: String,
    cases: Vec<TestCase>,
}

/// Algorithm name -> recorded requests, in insertion order.
#[derive(Debug, Clone)]
pub struct AlgorithmCorpus {
    algorithms: Vec<AlgorithmCases>,
}

impl AlgorithmCorpus {
    /// Build a corpus from in-memory inputs.
    ///
    /// Fails if an algorithm is unknown, repeated, or has no inputs, or if
    /// no algorithm is given at all.
    pub fn from_inputs<I, S>(entries: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut algorithms: Vec<AlgorithmCases> = Vec::new();

        for (name, inputs) in entries {
            let name = name.into();
            if !is_known_algorithm(&name) {
                return Err(CorpusError::UnknownAlgorithm(name));
            }
            if algorithms.iter().any(|a| a.name == name) {
                return Err(CorpusError::DuplicateAlgorithm(name));
            }
            if inputs.is_empty() {
                return Err(CorpusError::Empty(name));
            }

            let cases = inputs
                .into_iter()
                .map(|input| TestCase::new(name.clone(), input))
                .collect();

            algorithms.push(AlgorithmCases { name, cases });
        }

        if algorithms.is_empty() {
            return Err(CorpusError::NoAlgorithms);
        }

        Ok(Self { algorithms })
    }

    pub fn algorithm_names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.iter().map(|a| a.name.as_str())
    }

    pub fn test_cases(&self, algorithm: &str) -> Option<&[TestCase]> {
        self.algorithms
            .iter()
            .find(|a| a.name == algorithm)
            .map(|a| a.cases.as_slice())
    }

    pub fn algorithm_count(&self) -> usize {
        self.algorithms.len()
    }

    pub fn total_cases(&self) -> usize {
        self.algorithms.iter().map(|a| a.cases.len()).sum()
    }

    /// Pick an algorithm uniformly, then one of its test cases uniformly.
    ///
    /// Algorithms are equally likely regardless of how many cases each has.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &TestCase {
        let algorithm = &self.algorithms[rng.gen_range(0..self.algorithms.len())];
        &algorithm.cases[rng.gen_range(0..algorithm.cases.len())]
    }
}
