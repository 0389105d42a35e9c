//! claire-widget: Session core for the CLAIRE chat widget
//!
//! This crate holds the state a chat widget needs between renders: the
//! window state machine, the conversation history with its thinking
//! placeholder, staged attachments, service reachability, and the
//! single-outstanding-request send pipeline. Rendering is left to the host,
//! which reads [`WidgetSnapshot`]s and feeds [`Intent`]s back in.

pub mod attachments;
pub mod connectivity;
pub mod conversation;
pub mod error;
pub mod events;
pub mod transport;
pub mod types;
pub mod widget;
pub mod window;

pub use attachments::{AttachmentStager, FileRef};
pub use connectivity::{ConnectivityMonitor, ConnectivityState, MonitorHandle};
pub use conversation::{ConversationSession, ConversationStore, MessageTexts, Resolution};
pub use error::{Error, GuardRejection, Rejected, Result, TransportError};
pub use events::WidgetEvent;
pub use transport::{PendingExchange, TransportClient};
pub use types::*;
pub use widget::{Intent, Widget, WidgetConfig, WidgetSnapshot};
pub use window::{Transition, WindowController, WindowIntent, WindowState};
