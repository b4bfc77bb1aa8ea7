// Metrics module
// Thread-safe collection, console reporting and summary export

pub mod collector;
pub mod reporter;
pub mod summary;
pub mod types;
