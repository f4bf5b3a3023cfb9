//! Search engine module
//!
//! Defines the Engine trait and the web search providers behind it.

mod traits;

pub mod google;

pub use google::GoogleCustomSearch;
pub use traits::*;
