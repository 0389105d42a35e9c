//! Widget event types

use serde::{Deserialize, Serialize};

use crate::{types::Message, window::WindowState};

/// Events emitted as widget state changes, for hosts that redraw on change
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetEvent {
    /// The window moved between states
    WindowChanged { from: WindowState, to: WindowState },

    /// The session was closed and its history cleared
    SessionReset,

    /// A message was appended to the history
    MessageAppended { message: Message },

    /// The thinking placeholder was replaced by its final message
    PlaceholderResolved { message: Message },

    /// A send exchange was issued
    RequestStarted,

    /// A send exchange finished, successfully or not
    RequestFinished { success: bool },

    /// The health probe flipped reachability
    ConnectivityChanged { reachable: bool },

    /// The staged attachment set changed
    AttachmentsChanged { count: usize },
}

impl WidgetEvent {
    /// Whether this event changes the message history
    pub fn touches_history(&self) -> bool {
        matches!(
            self,
            WidgetEvent::SessionReset
                | WidgetEvent::MessageAppended { .. }
                | WidgetEvent::PlaceholderResolved { .. }
        )
    }
}
