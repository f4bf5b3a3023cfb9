//! Search result types and their prompt formatting

mod format;
mod types;

pub use format::{format_results, parse_formatted_results};
pub use types::SearchResult;
