pub mod backend;
pub mod canvas;
pub mod config;
pub mod error;
pub mod http;
pub mod ui;

pub use backend::{Backend, BackendError, ProjectId, TextAction};
pub use canvas::{Activity, Canvas, Phase, title_from_prompt};
pub use config::{CanvasConfig, VersionPlacement};
pub use error::{CanvasError, EditOutcome};
pub use http::HttpBackend;
pub use ui::{EditTarget, Selection, Step, UiState};
