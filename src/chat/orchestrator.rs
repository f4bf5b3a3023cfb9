//! One chat turn: parallel search and knowledge, then streamed synthesis

use super::backend::{BackendError, ChatBackend};
use super::conversation::{Conversation, TurnState};
use crate::config::RenderMode;
use crate::llm::CompletionRequest;
use crate::results::format_results;
use futures::StreamExt;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Shown in place of the answer when a turn fails
pub const APOLOGY: &str = "Sorry, an error occurred while processing your request.";

/// Change to the visible assistant message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderUpdate<'a> {
    /// Text appended to the message
    Append(&'a str),
    /// The whole message content was replaced
    Replace(&'a str),
}

/// How a submitted turn ended
#[derive(Debug)]
pub enum TurnOutcome {
    /// Blank input, nothing happened
    Ignored,
    /// The synthesized answer was delivered
    Completed { search_failed: bool, ai_failed: bool },
    /// The turn ended with the apology message
    Failed(TurnFailure),
}

/// Why a turn failed
#[derive(Debug)]
pub enum TurnFailure {
    /// Neither search nor knowledge produced anything
    AllSourcesFailed,
    /// The synthesis call failed or its stream broke
    Synthesis(BackendError),
}

/// Drives chat turns against a [`ChatBackend`]
pub struct Orchestrator<B> {
    backend: B,
    render_mode: RenderMode,
}

impl<B: ChatBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            render_mode: RenderMode::default(),
        }
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    /// Run one turn for `input`, reporting visible changes to `render`.
    pub async fn submit<F>(
        &self,
        conversation: &mut Conversation,
        input: &str,
        render: F,
    ) -> TurnOutcome
    where
        F: FnMut(RenderUpdate<'_>) + Send,
    {
        let input = input.trim();
        if input.is_empty() {
            return TurnOutcome::Ignored;
        }

        let span = info_span!("turn", id = %Uuid::new_v4());
        self.run_turn(conversation, input, render)
            .instrument(span)
            .await
    }

    async fn run_turn<F>(
        &self,
        conversation: &mut Conversation,
        input: &str,
        mut render: F,
    ) -> TurnOutcome
    where
        F: FnMut(RenderUpdate<'_>) + Send,
    {
        conversation.begin_turn(input);
        conversation.set_state(TurnState::AwaitingParallel);

        let (search, knowledge) =
            tokio::join!(self.backend.search(input), self.backend.knowledge(input));

        let search_results = match search {
            Ok(results) if !results.is_empty() => Some(format_results(&results)),
            Ok(_) => {
                info!("Search returned no results");
                None
            }
            Err(e) => {
                warn!("Search failed: {}", e);
                None
            }
        };

        let initial_response = match knowledge {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                info!("Initial answer was empty");
                None
            }
            Err(e) => {
                warn!("Initial answer failed: {}", e);
                None
            }
        };

        if search_results.is_none() && initial_response.is_none() {
            warn!("Both search and AI services failed");
            return fail(conversation, TurnFailure::AllSourcesFailed, &mut render);
        }

        let request = CompletionRequest::synthesis(input, search_results, initial_response);
        conversation.set_state(TurnState::AwaitingSynthesis);

        let mut stream = match self.backend.synthesize(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to generate final response: {}", e);
                return fail(conversation, TurnFailure::Synthesis(e), &mut render);
            }
        };

        conversation.set_state(TurnState::Streaming);
        let mut decoder = Utf8Buffer::default();
        let mut buffered = String::new();

        while let Some(item) = stream.next().await {
            let piece = match item {
                Ok(bytes) => decoder.push(&bytes),
                Err(e) => {
                    warn!("Synthesis stream aborted: {}", e);
                    return fail(conversation, TurnFailure::Synthesis(e), &mut render);
                }
            };
            self.deliver(conversation, &mut render, &mut buffered, &piece);
        }
        let tail = decoder.finish();
        self.deliver(conversation, &mut render, &mut buffered, &tail);

        if self.render_mode == RenderMode::Buffered {
            conversation.set_answer(&buffered);
            render(RenderUpdate::Replace(&buffered));
        }

        conversation.set_state(TurnState::Complete);
        debug!("Turn complete");

        TurnOutcome::Completed {
            search_failed: request.search_failed,
            ai_failed: request.ai_failed,
        }
    }

    fn deliver<F>(
        &self,
        conversation: &mut Conversation,
        render: &mut F,
        buffered: &mut String,
        piece: &str,
    ) where
        F: FnMut(RenderUpdate<'_>),
    {
        if piece.is_empty() {
            return;
        }
        match self.render_mode {
            RenderMode::Incremental => {
                conversation.append_to_answer(piece);
                render(RenderUpdate::Append(piece));
            }
            RenderMode::Buffered => buffered.push_str(piece),
        }
    }
}

fn fail<F>(conversation: &mut Conversation, failure: TurnFailure, render: &mut F) -> TurnOutcome
where
    F: FnMut(RenderUpdate<'_>),
{
    conversation.set_answer(APOLOGY);
    conversation.set_state(TurnState::Error);
    render(RenderUpdate::Replace(APOLOGY));
    TurnOutcome::Failed(failure)
}

/// Reassembles UTF-8 text from byte chunks that may split a character
#[derive(Debug, Default)]
struct Utf8Buffer {
    pending: Vec<u8>,
}

impl Utf8Buffer {
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                text
            }
            // incomplete sequence at the end: keep it for the next chunk
            Err(e) if e.error_len().is_none() => {
                let rest = self.pending.split_off(e.valid_up_to());
                let valid = std::mem::replace(&mut self.pending, rest);
                String::from_utf8_lossy(&valid).into_owned()
            }
            Err(_) => self.finish(),
        }
    }

    fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}
