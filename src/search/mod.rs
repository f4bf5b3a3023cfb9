//! Search orchestration module
//!
//! Runs a query against the configured engine with a bounded wait.

mod executor;

pub use executor::Search;
