//! Core types for conversation history

use chrono::{DateTime, Utc};
use claire_api::{ChatResponse, EmotionDetection, LanguageDetection, RetrievedContext};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordinal identifier of a message, unique for the lifetime of a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

/// What kind of file an attachment was staged as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

/// A staged file reference. Only metadata; bytes are never read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: Uuid,
    pub kind: AttachmentKind,
    pub display_name: String,
    pub size_bytes: u64,
}

/// Metadata shown under a successful assistant answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub language: Option<String>,
    pub emotion: Option<String>,
    pub processing_time_seconds: Option<f64>,
    pub source_count: Option<usize>,
}

impl ResponseMetadata {
    /// Whether there is anything to show
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.emotion.is_none()
            && self.processing_time_seconds.is_none()
            && self.source_count.is_none()
    }
}

/// A single entry in the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_thinking: bool,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default)]
    pub metadata: Option<ResponseMetadata>,
}

impl Message {
    pub(crate) fn new(id: MessageId, author: Author, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            author,
            created_at: Utc::now(),
            is_thinking: false,
            is_error: false,
            attachments: Vec::new(),
            metadata: None,
        }
    }

    /// Whether the user wrote this message
    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }

    /// Whether the assistant wrote this message
    pub fn is_assistant(&self) -> bool {
        self.author == Author::Assistant
    }
}

/// A parsed answer from the chat endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub answer: String,
    pub language: Option<LanguageDetection>,
    pub emotion: Option<EmotionDetection>,
    pub processing_time: Option<f64>,
    pub contexts: Option<Vec<RetrievedContext>>,
}

impl AssistantReply {
    /// Flatten the service's nested detections into display metadata
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            language: self.language.as_ref().map(|l| l.language.clone()),
            emotion: self.emotion.as_ref().map(|e| e.emotion.clone()),
            // Negative or NaN timings are dropped rather than shown
            processing_time_seconds: self.processing_time.filter(|t| *t >= 0.0),
            source_count: self.contexts.as_ref().map(Vec::len),
        }
    }
}

impl From<ChatResponse> for AssistantReply {
    fn from(response: ChatResponse) -> Self {
        Self {
            answer: response.answer,
            language: response.language,
            emotion: response.emotion,
            processing_time: response.processing_time,
            contexts: response.contexts,
        }
    }
}
