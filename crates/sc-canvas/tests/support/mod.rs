//! Scripted in-memory backend shared by the orchestrator tests.
//!
//! Every call yields to the executor a few times before answering, so
//! operations joined with `tokio::join!` genuinely interleave.

#![allow(dead_code)]

use sc_canvas::{Backend, BackendError, Canvas, CanvasConfig, ProjectId, TextAction};
use sc_core::WireProject;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Yields per backend call.
const LATENCY: usize = 3;

#[derive(Default)]
pub struct MockBackend {
    /// Pages returned by `generate_multiple`; `None` echoes one per name.
    pub pages: RefCell<Option<Vec<String>>>,
    pub fail_generation: Cell<bool>,
    pub fail_load: Cell<bool>,
    pub fail_save: Cell<bool>,
    pub projects: RefCell<HashMap<ProjectId, WireProject>>,
    pub saves: Cell<u32>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl MockBackend {
    async fn call(&self, name: &'static str) {
        self.calls.borrow_mut().push(name);
        for _ in 0..LATENCY {
            tokio::task::yield_now().await;
        }
    }

    fn generation(&self, html: String) -> Result<String, BackendError> {
        if self.fail_generation.get() {
            Err(BackendError::Unavailable("generator offline".into()))
        } else {
            Ok(html)
        }
    }

    pub fn saved(&self, project: ProjectId) -> Option<WireProject> {
        self.projects.borrow().get(&project).cloned()
    }
}

impl Backend for MockBackend {
    async fn generate_single(&self, prompt: &str) -> Result<String, BackendError> {
        self.call("generate_single").await;
        self.generation(format!("<main>{prompt}</main>"))
    }

    async fn generate_multiple(
        &self,
        prompt: &str,
        pages: &[String],
    ) -> Result<Vec<String>, BackendError> {
        self.call("generate_multiple").await;
        if self.fail_generation.get() {
            return Err(BackendError::Unavailable("generator offline".into()));
        }
        Ok(self.pages.borrow().clone().unwrap_or_else(|| {
            pages
                .iter()
                .map(|p| format!("<main data-page=\"{p}\">{prompt}</main>"))
                .collect()
        }))
    }

    async fn generate_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
    ) -> Result<String, BackendError> {
        self.call("generate_from_image").await;
        self.generation(format!("<main data-image=\"{}\">{prompt}</main>", image_base64.len()))
    }

    async fn generate_flow_page_names(&self, _prompt: &str) -> Result<Vec<String>, BackendError> {
        self.call("generate_flow_page_names").await;
        Ok(vec![" Home ".into(), "".into(), "Menu".into(), "Contact".into()])
    }

    async fn regenerate_section(
        &self,
        full_html: &str,
        fragment: &str,
        prompt: &str,
    ) -> Result<String, BackendError> {
        self.call("regenerate_section").await;
        self.generation(full_html.replace(fragment, &format!("<section>{prompt}</section>")))
    }

    async fn regenerate_design(
        &self,
        prompt: &str,
        full_html: &str,
    ) -> Result<String, BackendError> {
        self.call("regenerate_design").await;
        self.generation(format!("<div class=\"{prompt}\">{full_html}</div>"))
    }

    async fn process_text(&self, text: &str, action: TextAction) -> Result<String, BackendError> {
        self.call("process_text").await;
        Ok(match action {
            TextAction::Shorten => text.split_whitespace().take(2).collect::<Vec<_>>().join(" "),
            other => format!("{text} [{other}]"),
        })
    }

    async fn save_project(
        &self,
        project: ProjectId,
        wire: &WireProject,
    ) -> Result<(), BackendError> {
        self.call("save_project").await;
        if self.fail_save.get() {
            return Err(BackendError::Status {
                status: 500,
                body: "disk full".into(),
            });
        }
        self.saves.set(self.saves.get() + 1);
        self.projects.borrow_mut().insert(project, wire.clone());
        Ok(())
    }

    async fn load_project(&self, project: ProjectId) -> Result<WireProject, BackendError> {
        self.call("load_project").await;
        if self.fail_load.get() {
            return Err(BackendError::Status {
                status: 404,
                body: "no such project".into(),
            });
        }
        Ok(self.saved(project).unwrap_or_default())
    }

    async fn enhance_prompt(&self, prompt: &str) -> Result<String, BackendError> {
        self.call("enhance_prompt").await;
        Ok(format!("{prompt}, modern, accessible"))
    }
}

/// A ready canvas over a fresh mock, project 1.
pub fn ready_canvas() -> Canvas<MockBackend> {
    ready_canvas_with(CanvasConfig::default())
}

pub fn ready_canvas_with(config: CanvasConfig) -> Canvas<MockBackend> {
    let canvas = Canvas::new(MockBackend::default(), config);
    canvas.open_blank(1);
    canvas
}
