//! Conversation history, welcome injection, and the thinking placeholder.
//!
//! The store is a plain owned value. Callers that need to share it across
//! suspension points wrap it in a lock (see [`crate::widget::Widget`]); every
//! method here runs to completion without awaiting, so no caller ever
//! observes a half-applied mutation.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, GuardRejection, Rejected, Result},
    types::{AssistantReply, AttachmentRef, Author, Message, MessageId, ResponseMetadata},
};

/// Greeting appended when a fresh session is first expanded
pub const WELCOME_MESSAGE: &str = "Hello! I'm CLAIRE, your BPI virtual assistant. How can I help you with your banking needs today?";

/// Shown in place of an answer when an exchange fails
pub const ERROR_MESSAGE: &str = "I apologize, but I'm having trouble connecting to our servers right now. Please try again in a moment.";

/// Message text used when only attachments are sent
pub const ATTACHMENT_PLACEHOLDER: &str = "📎 File attachment";

/// Fixed texts the store synthesizes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTexts {
    pub welcome: String,
    pub error: String,
    pub attachment_placeholder: String,
}

impl Default for MessageTexts {
    fn default() -> Self {
        Self {
            welcome: WELCOME_MESSAGE.to_string(),
            error: ERROR_MESSAGE.to_string(),
            attachment_placeholder: ATTACHMENT_PLACEHOLDER.to_string(),
        }
    }
}

/// How a thinking placeholder should be replaced
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The service answered
    Success {
        content: String,
        metadata: ResponseMetadata,
    },
    /// The exchange failed; show the apology
    Failure,
}

impl Resolution {
    /// Map an exchange result onto a resolution
    pub fn from_result<E>(result: &std::result::Result<AssistantReply, E>) -> Self {
        match result {
            Ok(reply) => Resolution::Success {
                content: reply.answer.clone(),
                metadata: reply.metadata(),
            },
            Err(_) => Resolution::Failure,
        }
    }
}

/// State of one open-to-close cycle
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    pub history: Vec<Message>,
    pub welcome_injected: bool,
    pub outstanding_request: bool,
}

/// Messages produced when an exchange is started
#[derive(Debug, Clone)]
pub(crate) struct ExchangeStart {
    pub user_message: Message,
    pub placeholder: Message,
    pub epoch: u64,
}

/// Owns the [`ConversationSession`] and every mutation of it
#[derive(Debug, Default)]
pub struct ConversationStore {
    session: ConversationSession,
    texts: MessageTexts,
    /// Never reset, so ids stay unique across sessions
    next_id: u64,
    /// Bumped by `reset()`; replies for an older epoch are discarded
    epoch: u64,
}

impl ConversationStore {
    pub fn new(texts: MessageTexts) -> Self {
        Self {
            texts,
            ..Self::default()
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn history(&self) -> &[Message] {
        &self.session.history
    }

    pub fn welcome_injected(&self) -> bool {
        self.session.welcome_injected
    }

    pub fn outstanding_request(&self) -> bool {
        self.session.outstanding_request
    }

    pub fn texts(&self) -> &MessageTexts {
        &self.texts
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The pending thinking placeholder, if any
    pub fn placeholder(&self) -> Option<&Message> {
        self.session.history.iter().find(|m| m.is_thinking)
    }

    pub fn thinking_count(&self) -> usize {
        self.session.history.iter().filter(|m| m.is_thinking).count()
    }

    fn next_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    fn push(&mut self, message: Message) -> Message {
        self.session.history.push(message.clone());
        message
    }

    /// The send precondition: not in flight, reachable, and something to send
    pub fn check_send(
        &self,
        text: &str,
        attachment_count: usize,
        reachable: bool,
    ) -> std::result::Result<(), GuardRejection> {
        if self.session.outstanding_request || self.placeholder().is_some() {
            return Err(GuardRejection::RequestInFlight);
        }
        if !reachable {
            return Err(GuardRejection::Disconnected);
        }
        if text.trim().is_empty() && attachment_count == 0 {
            return Err(GuardRejection::EmptyMessage);
        }
        Ok(())
    }

    /// Append the user's message. On rejection nothing changes and the
    /// attachments are handed back.
    pub fn append_user_message(
        &mut self,
        text: &str,
        attachments: Vec<AttachmentRef>,
        reachable: bool,
    ) -> std::result::Result<Message, Rejected> {
        if let Err(reason) = self.check_send(text, attachments.len(), reachable) {
            return Err(Rejected::new(reason, attachments));
        }

        let trimmed = text.trim();
        let content = if trimmed.is_empty() {
            self.texts.attachment_placeholder.clone()
        } else {
            trimmed.to_string()
        };

        let id = self.next_id();
        let mut message = Message::new(id, Author::User, content);
        message.attachments = attachments;
        Ok(self.push(message))
    }

    /// Append the thinking placeholder. Fails if one is already pending.
    pub fn append_thinking_placeholder(&mut self) -> Result<Message> {
        if self.placeholder().is_some() {
            return Err(Error::PlaceholderExists);
        }
        Ok(self.push_placeholder())
    }

    fn push_placeholder(&mut self) -> Message {
        let id = self.next_id();
        let mut message = Message::new(id, Author::Assistant, "");
        message.is_thinking = true;
        self.push(message)
    }

    /// Remove the placeholder and append the final assistant message at the tail
    pub fn resolve_placeholder(&mut self, resolution: Resolution) -> Result<Message> {
        let index = self
            .session
            .history
            .iter()
            .position(|m| m.is_thinking)
            .ok_or(Error::NoPlaceholder)?;
        self.session.history.remove(index);

        let id = self.next_id();
        let message = match resolution {
            Resolution::Success { content, metadata } => {
                let mut message = Message::new(id, Author::Assistant, content);
                message.metadata = Some(metadata);
                message
            }
            Resolution::Failure => {
                let mut message = Message::new(id, Author::Assistant, self.texts.error.clone());
                message.is_error = true;
                message
            }
        };
        Ok(self.push(message))
    }

    /// Append the greeting if this session hasn't had one and is still empty
    pub fn inject_welcome(&mut self) -> Option<Message> {
        if self.session.welcome_injected || !self.session.history.is_empty() {
            return None;
        }
        let id = self.next_id();
        let message = Message::new(id, Author::Assistant, self.texts.welcome.clone());
        self.session.welcome_injected = true;
        Some(self.push(message))
    }

    /// Empty the history and re-arm the welcome. An in-flight request stays
    /// outstanding; its reply will be discarded.
    pub fn reset(&mut self) {
        self.session.history.clear();
        self.session.welcome_injected = false;
        self.epoch += 1;
    }

    /// Guard, append the user message, mark outstanding, append placeholder.
    pub(crate) fn begin_exchange(
        &mut self,
        text: &str,
        attachments: Vec<AttachmentRef>,
        reachable: bool,
    ) -> std::result::Result<ExchangeStart, Rejected> {
        let user_message = self.append_user_message(text, attachments, reachable)?;
        self.session.outstanding_request = true;
        // check_send refused any pending placeholder, so this cannot collide
        let placeholder = self.push_placeholder();
        Ok(ExchangeStart {
            user_message,
            placeholder,
            epoch: self.epoch,
        })
    }

    /// Clear the outstanding flag and resolve the placeholder, unless the
    /// session was reset while the exchange ran.
    pub(crate) fn finish_exchange(&mut self, epoch: u64, resolution: Resolution) -> Option<Message> {
        self.session.outstanding_request = false;

        if epoch != self.epoch {
            tracing::debug!(
                "Discarding reply for closed session (epoch {} != {})",
                epoch,
                self.epoch
            );
            return None;
        }

        match self.resolve_placeholder(resolution) {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::warn!("Exchange finished without a placeholder: {}", e);
                None
            }
        }
    }
}
