//! Wire types for the assistant service endpoints

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status string the health endpoint reports when fully operational
pub const HEALTHY_STATUS: &str = "healthy";

/// Body of `POST /api/v1/chat/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question
    pub question: String,
    /// Fixed identifier of the widget instance
    pub session_id: String,
}

impl ChatRequest {
    pub fn new(question: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            session_id: session_id.into(),
        }
    }
}

/// Detected language of the question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    pub language: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Detected emotion of the question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionDetection {
    pub emotion: String,
    #[serde(default)]
    pub confidence: f64,
}

/// A knowledge-base passage the answer was grounded on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedContext {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub source: Option<String>,
}

/// Successful reply from the chat endpoint.
///
/// Only `answer` is required; everything else is optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub language: Option<LanguageDetection>,
    #[serde(default)]
    pub emotion: Option<EmotionDetection>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub contexts: Option<Vec<RetrievedContext>>,
    #[serde(default)]
    pub has_attachment: bool,
}

/// Reply from `GET /api/v1/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub models_loaded: HashMap<String, bool>,
    #[serde(default)]
    pub vector_db_ready: bool,
    #[serde(default)]
    pub ocr_available: bool,
}

impl HealthResponse {
    /// Only a "healthy" service accepts chat traffic; "degraded" does not count
    pub fn is_healthy(&self) -> bool {
        self.status == HEALTHY_STATUS
    }
}
