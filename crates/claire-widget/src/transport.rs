//! The send-message exchange and its mapping onto the conversation

use std::sync::Arc;

use claire_api::{ChatRequest, ServiceApi};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::{
    connectivity::ConnectivityState,
    conversation::{ConversationStore, Resolution},
    error::{Error, Rejected, TransportError},
    events::WidgetEvent,
    types::{AssistantReply, AttachmentRef, Message},
};

/// Issues chat exchanges, one at a time, and resolves the thinking
/// placeholder with the outcome.
#[derive(Clone)]
pub struct TransportClient {
    api: Arc<dyn ServiceApi>,
    session_id: String,
    connectivity: ConnectivityState,
    conversation: Arc<Mutex<ConversationStore>>,
    events: broadcast::Sender<WidgetEvent>,
}

impl TransportClient {
    pub fn new(
        api: Arc<dyn ServiceApi>,
        session_id: impl Into<String>,
        connectivity: ConnectivityState,
        conversation: Arc<Mutex<ConversationStore>>,
        events: broadcast::Sender<WidgetEvent>,
    ) -> Self {
        Self {
            api,
            session_id: session_id.into(),
            connectivity,
            conversation,
            events,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Guard and set up an exchange without contacting the service.
    ///
    /// On success the user message and the thinking placeholder are in the
    /// history and the request is marked outstanding. On rejection nothing
    /// has changed and the attachments are handed back.
    pub fn start(
        &self,
        text: &str,
        attachments: Vec<AttachmentRef>,
    ) -> Result<PendingExchange, Rejected> {
        let reachable = self.connectivity.is_reachable();
        let start = self
            .conversation
            .lock()
            .begin_exchange(text, attachments, reachable)?;

        let _ = self.events.send(WidgetEvent::MessageAppended {
            message: start.user_message.clone(),
        });
        let _ = self.events.send(WidgetEvent::MessageAppended {
            message: start.placeholder.clone(),
        });
        let _ = self.events.send(WidgetEvent::RequestStarted);

        let request = ChatRequest::new(start.user_message.content.clone(), self.session_id.clone());

        Ok(PendingExchange {
            api: Arc::clone(&self.api),
            request,
            user_message: start.user_message,
            placeholder: start.placeholder,
            in_flight: InFlight {
                conversation: Arc::clone(&self.conversation),
                events: self.events.clone(),
                epoch: start.epoch,
                finished: false,
            },
        })
    }

    /// Start and run an exchange in one go
    pub async fn send(
        &self,
        text: &str,
        attachments: Vec<AttachmentRef>,
    ) -> Result<AssistantReply, Error> {
        let pending = self.start(text, attachments)?;
        Ok(pending.run().await?)
    }
}

/// An accepted exchange that has not yet contacted the service
pub struct PendingExchange {
    api: Arc<dyn ServiceApi>,
    request: ChatRequest,
    user_message: Message,
    placeholder: Message,
    in_flight: InFlight,
}

impl PendingExchange {
    /// The user message that was appended
    pub fn user_message(&self) -> &Message {
        &self.user_message
    }

    /// The placeholder that will be resolved
    pub fn placeholder(&self) -> &Message {
        &self.placeholder
    }

    /// The request that will be sent
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Issue the request and resolve the placeholder.
    ///
    /// No retries. A failure shows up in the history as one apology message.
    pub async fn run(mut self) -> Result<AssistantReply, TransportError> {
        let result = self
            .api
            .chat(&self.request)
            .await
            .map(AssistantReply::from);

        if let Err(ref e) = result {
            tracing::warn!("Chat exchange failed: {}", e);
        }

        self.in_flight
            .finish(Resolution::from_result(&result), result.is_ok());
        result
    }
}

/// Clears the outstanding flag exactly once, even if the exchange future is
/// dropped before the service answers.
struct InFlight {
    conversation: Arc<Mutex<ConversationStore>>,
    events: broadcast::Sender<WidgetEvent>,
    epoch: u64,
    finished: bool,
}

impl InFlight {
    fn finish(&mut self, resolution: Resolution, success: bool) {
        if self.finished {
            return;
        }
        self.finished = true;

        let resolved = self
            .conversation
            .lock()
            .finish_exchange(self.epoch, resolution);

        if let Some(message) = resolved {
            let _ = self.events.send(WidgetEvent::PlaceholderResolved { message });
        }
        let _ = self.events.send(WidgetEvent::RequestFinished { success });
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("Exchange dropped before completion");
            self.finish(Resolution::Failure, false);
        }
    }
}
