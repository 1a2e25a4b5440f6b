//! Orchestrator error taxonomy.
//!
//! Everything that can go wrong at the canvas boundary funnels into
//! `CanvasError`; `user_message` turns any of them into the one line shown
//! to the user. Reconciliation mismatches are not errors and never appear
//! here (see `EditOutcome`).

use crate::backend::BackendError;
use crate::canvas::Phase;
use sc_core::{ScreenId, WireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanvasError {
    /// The backend call failed (transport, status, decode).
    #[error("backend request failed: {0}")]
    Request(#[from] BackendError),

    /// Multi-page generation returned the wrong number of pages.
    #[error("backend returned {received} pages, expected {expected}")]
    PageCountMismatch { expected: usize, received: usize },

    /// A save is still outstanding.
    #[error("a save is already in progress")]
    AlreadySaving,

    /// The operation needs a loaded project.
    #[error("canvas is not ready (phase: {0})")]
    NotReady(Phase),

    #[error("unknown screen {0}")]
    UnknownScreen(ScreenId),

    #[error("unknown group {0}")]
    UnknownGroup(String),

    /// A different project was opened while the request was in flight.
    #[error("project changed while the request was in flight")]
    Superseded,

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl CanvasError {
    /// Single user-facing line for this failure.
    pub fn user_message(&self) -> String {
        match self {
            CanvasError::Request(BackendError::Status { status, body }) if body.is_empty() => {
                format!("The server answered with status {status}.")
            }
            CanvasError::Request(BackendError::Status { status, body }) => {
                format!("The server answered with status {status}: {body}")
            }
            CanvasError::Request(err) => format!("Request failed: {err}"),
            CanvasError::PageCountMismatch { expected, received } => format!(
                "Expected {expected} pages but the generator returned {received}. Nothing was added."
            ),
            CanvasError::AlreadySaving => "A save is already in progress.".to_string(),
            CanvasError::NotReady(Phase::Loading) => "The project is still loading.".to_string(),
            CanvasError::NotReady(Phase::LoadFailed(reason)) => {
                format!("The project could not be loaded: {reason}")
            }
            CanvasError::NotReady(_) => "Open a project first.".to_string(),
            CanvasError::UnknownScreen(_) => "That screen no longer exists.".to_string(),
            CanvasError::UnknownGroup(_) => "That group no longer exists.".to_string(),
            CanvasError::Superseded => {
                "The project changed before the result arrived; it was discarded.".to_string()
            }
            CanvasError::Wire(err) => format!("Could not read the saved project: {err}"),
        }
    }
}

/// Result of an edit or regeneration whose target may have changed while
/// the request was outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content landed on this screen (the edited one, or the new version).
    Applied(ScreenId),
    /// The fragment being replaced is no longer in the screen's content.
    /// The content was left unchanged.
    ContentMismatch,
    /// The target was deleted in the meantime; the result was dropped.
    TargetGone,
}

impl EditOutcome {
    pub fn applied(&self) -> Option<ScreenId> {
        match self {
            EditOutcome::Applied(id) => Some(*id),
            _ => None,
        }
    }
}
