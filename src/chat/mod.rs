//! Chat orchestration
//!
//! Fans a query out to search and knowledge, joins both with independent
//! failure, then streams the synthesized answer into the conversation.

mod backend;
mod conversation;
mod orchestrator;

pub use backend::{BackendError, ChatBackend, ContentStream, HttpBackend, LocalBackend};
pub use conversation::{Conversation, Message, TurnState};
pub use orchestrator::{Orchestrator, RenderUpdate, TurnFailure, TurnOutcome, APOLOGY};
