//! Assistant chat widget controller.

use shared::domain::TranscriptRole;
use tracing::{debug, warn};

use crate::{api::CapsuleApi, error::ClientError, locale, view::ChatView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    Answered,
    /// The fallback text was shown instead of a reply.
    Failed,
}

pub struct ChatController<V: ChatView> {
    api: CapsuleApi,
    view: V,
    transcript: Vec<TranscriptEntry>,
    minimized: bool,
}

impl<V: ChatView> ChatController<V> {
    /// Renders the greeting; it is not part of the transcript.
    pub fn new(api: CapsuleApi, mut view: V) -> Self {
        view.append_message(TranscriptRole::Assistant, locale::CHAT_GREETING);
        Self {
            api,
            view,
            transcript: Vec::new(),
            minimized: false,
        }
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn toggle_minimized(&mut self) {
        self.minimized = !self.minimized;
        self.view.set_minimized(self.minimized);
    }

    pub async fn submit(&mut self, input: &str) -> ChatOutcome {
        let message = input.trim();
        if message.is_empty() {
            return ChatOutcome::Ignored;
        }

        self.view.append_message(TranscriptRole::User, message);
        self.push(TranscriptRole::User, message);
        self.view.show_typing();

        let result = self.api.process_chat(message).await;
        self.view.hide_typing();

        match result {
            Ok(reply) => {
                debug!(chars = reply.response.chars().count(), "chat: reply received");
                self.view
                    .append_message(TranscriptRole::Assistant, &reply.response);
                self.push(TranscriptRole::Assistant, &reply.response);
                ChatOutcome::Answered
            }
            Err(err) => {
                warn!("chat: request failed: {err}");
                let fallback = match err {
                    ClientError::Server { .. } => locale::CHAT_UNREACHABLE,
                    _ => locale::CHAT_FAILURE,
                };
                self.view.append_message(TranscriptRole::Assistant, fallback);
                ChatOutcome::Failed
            }
        }
    }

    fn push(&mut self, role: TranscriptRole, text: &str) {
        self.transcript.push(TranscriptEntry {
            role,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "tests/chat_tests.rs"]
mod tests;
