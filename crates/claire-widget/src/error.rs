//! Error types for claire-widget

use thiserror::Error;

use crate::types::AttachmentRef;

/// Result type alias using claire-widget Error
pub type Result<T> = std::result::Result<T, Error>;

/// A failed send exchange with the assistant service
pub type TransportError = claire_api::Error;

/// Why a send was refused before anything was mutated
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// No text and no attachments
    #[error("nothing to send")]
    EmptyMessage,

    /// Another exchange has not finished yet
    #[error("a request is already in flight")]
    RequestInFlight,

    /// The last health probe failed
    #[error("assistant service is unreachable")]
    Disconnected,
}

/// A refused send. Hands the attachments back so nothing staged is lost.
#[derive(Error, Debug)]
#[error("send rejected: {reason}")]
pub struct Rejected {
    pub reason: GuardRejection,
    pub attachments: Vec<AttachmentRef>,
}

impl Rejected {
    pub(crate) fn new(reason: GuardRejection, attachments: Vec<AttachmentRef>) -> Self {
        Self {
            reason,
            attachments,
        }
    }

    /// Take back the attachments that were offered to the send
    pub fn into_attachments(self) -> Vec<AttachmentRef> {
        self.attachments
    }
}

/// Errors that can occur during widget operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the service client
    #[error(transparent)]
    Api(#[from] claire_api::Error),

    /// A send was refused by the guard
    #[error("Send rejected: {0}")]
    Rejected(GuardRejection),

    /// A second placeholder was requested while one is pending
    #[error("A thinking placeholder is already pending")]
    PlaceholderExists,

    /// Resolution was requested with no pending placeholder
    #[error("No thinking placeholder to resolve")]
    NoPlaceholder,
}

impl From<Rejected> for Error {
    fn from(rejected: Rejected) -> Self {
        Error::Rejected(rejected.reason)
    }
}

impl From<GuardRejection> for Error {
    fn from(reason: GuardRejection) -> Self {
        Error::Rejected(reason)
    }
}

impl Error {
    /// Whether this is a silent guard rejection rather than a real failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }
}
