//! Search Synth: a chat backend that answers a query by running a web
//! search and an initial model answer concurrently, then streaming a
//! synthesis of both.

pub mod chat;
pub mod config;
pub mod engines;
pub mod llm;
pub mod network;
pub mod results;
pub mod search;
pub mod web;

pub use chat::{Conversation, Orchestrator};
pub use config::Settings;
pub use engines::Engine;
pub use results::SearchResult;
pub use search::Search;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
