//! Randomized algorithm load test for the MIP engine.
//!
//! Virtual users repeatedly pick a random algorithm and one of its recorded
//! requests, POST it to `<base_url>/algorithms/<name>`, and record whether
//! the engine answered with 200 or 461 (not enough data).

pub mod cli;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod scenarios;
pub mod validate;
