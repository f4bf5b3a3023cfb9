//! In-memory conversation state

use crate::llm::Role;
use serde::Serialize;

/// Where the current turn is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingParallel,
    AwaitingSynthesis,
    Streaming,
    Complete,
    Error,
}

/// One chat message as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// Messages of one session plus the state of its latest turn.
///
/// Nothing is persisted; the conversation lives as long as its owner.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    state: TurnState,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: TurnState) {
        tracing::debug!("Turn state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Append the user message and an empty assistant placeholder
    pub(crate) fn begin_turn(&mut self, input: &str) {
        self.messages.push(Message {
            role: Role::User,
            content: input.to_string(),
        });
        self.messages.push(Message {
            role: Role::Assistant,
            content: String::new(),
        });
    }

    pub(crate) fn append_to_answer(&mut self, text: &str) {
        if let Some(answer) = self.placeholder() {
            answer.content.push_str(text);
        }
    }

    pub(crate) fn set_answer(&mut self, text: &str) {
        if let Some(answer) = self.placeholder() {
            answer.content = text.to_string();
        }
    }

    fn placeholder(&mut self) -> Option<&mut Message> {
        self.messages
            .last_mut()
            .filter(|message| message.role == Role::Assistant)
    }
}
