//! Selection and interaction state.
//!
//! Both are single tagged values, so "active screen and active group at once"
//! or "two dialogs open" cannot be represented.

use sc_core::{GroupKey, ScreenId};

/// What the user has selected on the canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Screen(ScreenId),
    Group(GroupKey),
}

impl Selection {
    pub fn screen(&self) -> Option<ScreenId> {
        match self {
            Selection::Screen(id) => Some(*id),
            _ => None,
        }
    }

    pub fn group(&self) -> Option<&GroupKey> {
        match self {
            Selection::Group(key) => Some(key),
            _ => None,
        }
    }
}

/// Direction through a version chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Prev,
    Next,
}

/// A fragment inside one screen's content, picked in the content frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTarget {
    pub screen: ScreenId,
    /// Markup of the picked element as it appeared when picked.
    pub fragment: String,
}

impl EditTarget {
    pub fn new(screen: ScreenId, fragment: impl Into<String>) -> Self {
        Self {
            screen,
            fragment: fragment.into(),
        }
    }
}

/// The one interaction in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    Idle,
    RegeneratingSection(EditTarget),
    EditingContent(EditTarget),
    AskingAi(EditTarget),
}

impl UiState {
    pub fn target(&self) -> Option<&EditTarget> {
        match self {
            UiState::Idle => None,
            UiState::RegeneratingSection(t) | UiState::EditingContent(t) | UiState::AskingAi(t) => {
                Some(t)
            }
        }
    }

    pub fn targets(&self, screen: ScreenId) -> bool {
        self.target().is_some_and(|t| t.screen == screen)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, UiState::Idle)
    }
}
