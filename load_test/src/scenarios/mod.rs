// Scenarios module
// Contains load test scenario implementations

pub mod random_algorithm;
