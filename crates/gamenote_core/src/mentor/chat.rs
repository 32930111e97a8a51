//! In-memory chat transcript owned by the chat view.

use super::client::{MentorClient, MentorError, MentorTransport};
use crate::model::chat::{ChatMessage, ChatRole};
use crate::model::note::Note;

/// Ordered chat transcript. Dropped when the view is left; never persisted.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends `text` as a user message and asks the mentor for a reply.
    ///
    /// Blank input is ignored (`Ok(None)`). On failure the user message stays
    /// in the transcript so the view can offer a retry.
    pub fn send<T: MentorTransport>(
        &mut self,
        client: &MentorClient<T>,
        text: &str,
        recent_notes: &[Note],
    ) -> Result<Option<&ChatMessage>, MentorError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        self.messages.push(ChatMessage::user(trimmed));
        self.request_reply(client, recent_notes).map(Some)
    }

    /// Re-sends the transcript when the last message is an unanswered user
    /// message. Returns `Ok(None)` when there is nothing to retry.
    pub fn retry<T: MentorTransport>(
        &mut self,
        client: &MentorClient<T>,
        recent_notes: &[Note],
    ) -> Result<Option<&ChatMessage>, MentorError> {
        let awaiting_reply = self
            .messages
            .last()
            .is_some_and(|last| last.role == ChatRole::User);
        if !awaiting_reply {
            return Ok(None);
        }
        self.request_reply(client, recent_notes).map(Some)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn request_reply<T: MentorTransport>(
        &mut self,
        client: &MentorClient<T>,
        recent_notes: &[Note],
    ) -> Result<&ChatMessage, MentorError> {
        let reply = client.send_chat(&self.messages, recent_notes)?;
        self.messages.push(ChatMessage::assistant(reply));
        Ok(&self.messages[self.messages.len() - 1])
    }
}
