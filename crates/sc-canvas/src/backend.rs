//! Backend capability: AI generation plus project persistence.
//!
//! The canvas never talks to the network directly; it is handed a `Backend`
//! at construction. `crate::http::HttpBackend` is the production
//! implementation, tests script their own.

use sc_core::WireProject;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Database id of a project.
pub type ProjectId = i64;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Rewrite applied to a text fragment by `Backend::process_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAction {
    Summarize,
    Shorten,
    Lengthen,
    Improve,
    ToneProfessional,
    ToneCasual,
}

impl TextAction {
    pub const ALL: [TextAction; 6] = [
        TextAction::Summarize,
        TextAction::Shorten,
        TextAction::Lengthen,
        TextAction::Improve,
        TextAction::ToneProfessional,
        TextAction::ToneCasual,
    ];

    /// Wire name, e.g. `tone-professional`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAction::Summarize => "summarize",
            TextAction::Shorten => "shorten",
            TextAction::Lengthen => "lengthen",
            TextAction::Improve => "improve",
            TextAction::ToneProfessional => "tone-professional",
            TextAction::ToneCasual => "tone-casual",
        }
    }
}

impl fmt::Display for TextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response contract of the generation and persistence service.
///
/// Every method is one round trip. Implementations must not touch canvas
/// state; the canvas applies results itself once the call returns.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// One full page for `prompt`.
    async fn generate_single(&self, prompt: &str) -> Result<String, BackendError>;

    /// One page per entry of `pages`, in the same order.
    async fn generate_multiple(
        &self,
        prompt: &str,
        pages: &[String],
    ) -> Result<Vec<String>, BackendError>;

    /// One page from a reference image (base64, no data-URL prefix).
    async fn generate_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
    ) -> Result<String, BackendError>;

    /// Suggested page names for a flow. Advisory only.
    async fn generate_flow_page_names(&self, prompt: &str) -> Result<Vec<String>, BackendError>;

    /// Full page with `fragment` regenerated according to `prompt`.
    async fn regenerate_section(
        &self,
        full_html: &str,
        fragment: &str,
        prompt: &str,
    ) -> Result<String, BackendError>;

    /// Whole page restyled according to `prompt`.
    async fn regenerate_design(&self, prompt: &str, full_html: &str)
    -> Result<String, BackendError>;

    async fn process_text(&self, text: &str, action: TextAction) -> Result<String, BackendError>;

    async fn save_project(
        &self,
        project: ProjectId,
        wire: &WireProject,
    ) -> Result<(), BackendError>;

    /// Saved canvas, already folded into the frontend-id keyed shape.
    async fn load_project(&self, project: ProjectId) -> Result<WireProject, BackendError>;

    async fn enhance_prompt(&self, prompt: &str) -> Result<String, BackendError>;
}
