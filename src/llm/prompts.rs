//! Prompt construction for the knowledge and synthesis calls

use super::models::ChatMessage;
use serde::{Deserialize, Serialize};

/// System instruction for the context-free first answer
pub const KNOWLEDGE_SYSTEM_PROMPT: &str = "You are a helpful assistant. Provide a concise initial response based on your knowledge. If the query requires current information, indicate that search results would be helpful.";

/// System instruction for the combined answer
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a helpful assistant that combines AI knowledge with search results to provide comprehensive answers. When referencing search results, use markdown to highlight important information and include source links. Format: **important info** and [Website](URL).";

/// Stands in for the search results when they are unavailable
pub const SEARCH_UNAVAILABLE: &str = "**Google search is currently unavailable.**";

/// Stands in for the initial answer when it is unavailable
pub const INITIAL_UNAVAILABLE: &str = "**Initial AI response is unavailable.**";

const SYNTHESIS_INSTRUCTIONS: &str = "Please provide a comprehensive answer using the available information. Highlight important information using **bold text** and include source links in markdown format [Website](URL) when referencing search results. Organize the information into clear paragraphs.";

/// Body of a knowledge request.
///
/// With both `search_results` and `initial_response` absent it asks for the
/// initial answer; otherwise it asks for the synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub search_results: Option<String>,
    #[serde(default)]
    pub initial_response: Option<String>,
    #[serde(default)]
    pub search_failed: bool,
    #[serde(default)]
    pub ai_failed: bool,
}

impl CompletionRequest {
    /// Request for the initial, context-free answer
    pub fn initial(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Request for the final answer. A `None` input sets its failure flag.
    pub fn synthesis(
        query: impl Into<String>,
        search_results: Option<String>,
        initial_response: Option<String>,
    ) -> Self {
        Self {
            query: query.into(),
            search_failed: search_results.is_none(),
            ai_failed: initial_response.is_none(),
            search_results,
            initial_response,
        }
    }

    /// Whether this asks for the initial answer
    pub fn is_initial(&self) -> bool {
        self.search_results.is_none() && self.initial_response.is_none()
    }

    /// Search block to present, `None` when it must be marked unavailable
    fn usable_search_results(&self) -> Option<&str> {
        usable(self.search_failed, &self.search_results)
    }

    /// Initial answer to present, `None` when it must be marked unavailable
    fn usable_initial_response(&self) -> Option<&str> {
        usable(self.ai_failed, &self.initial_response)
    }
}

// A flagged, absent or blank input is never shown as present
fn usable(failed: bool, value: &Option<String>) -> Option<&str> {
    if failed {
        return None;
    }
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Messages for the initial answer
pub fn knowledge_messages(query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(KNOWLEDGE_SYSTEM_PROMPT),
        ChatMessage::user(query),
    ]
}

/// Messages for the combined answer
pub fn synthesis_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYNTHESIS_SYSTEM_PROMPT),
        ChatMessage::user(synthesis_user_prompt(request)),
    ]
}

/// The single user message of the synthesis call
pub fn synthesis_user_prompt(request: &CompletionRequest) -> String {
    let search_part = match request.usable_search_results() {
        Some(results) => format!("Here are the Google search results:\n{}", results),
        None => SEARCH_UNAVAILABLE.to_string(),
    };
    let initial_part = match request.usable_initial_response() {
        Some(answer) => format!("And here is your initial response: {}", answer),
        None => INITIAL_UNAVAILABLE.to_string(),
    };

    format!(
        "Here is my query: \"{}\"\n\n{}\n\n{}\n\n{}",
        request.query, search_part, initial_part, SYNTHESIS_INSTRUCTIONS
    )
}
