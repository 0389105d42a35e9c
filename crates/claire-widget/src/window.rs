//! Window visibility/size state machine

use serde::{Deserialize, Serialize};

/// How the widget is currently shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    /// Collapsed to the bubble
    #[default]
    Mini,
    /// Normal chat panel
    Expanded,
    /// Enlarged chat panel
    Maximized,
}

impl WindowState {
    /// Whether the chat panel is visible
    pub fn is_open(&self) -> bool {
        !matches!(self, WindowState::Mini)
    }
}

/// User actions that move the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowIntent {
    Open,
    ToggleMaximize,
    Minimize,
    Close,
}

/// A state change that actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: WindowState,
    pub to: WindowState,
    pub intent: WindowIntent,
}

impl Transition {
    /// Whether this transition lands on Expanded (the welcome trigger)
    pub fn enters_expanded(&self) -> bool {
        self.to == WindowState::Expanded && self.from != WindowState::Expanded
    }
}

/// Owns the single [`WindowState`] of a widget
#[derive(Debug, Default)]
pub struct WindowController {
    state: WindowState,
}

impl WindowController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> WindowState {
        self.state
    }

    /// Apply an intent. Returns `None` when the intent has no edge from the
    /// current state; the state is left untouched in that case.
    pub fn apply(&mut self, intent: WindowIntent) -> Option<Transition> {
        use WindowIntent::*;
        use WindowState::*;

        let next = match (self.state, intent) {
            (Mini, Open) => Expanded,
            (Expanded, ToggleMaximize) => Maximized,
            (Maximized, ToggleMaximize) => Expanded,
            (Expanded | Maximized, Minimize | Close) => Mini,
            _ => return None,
        };

        let transition = Transition {
            from: self.state,
            to: next,
            intent,
        };
        self.state = next;
        Some(transition)
    }
}
