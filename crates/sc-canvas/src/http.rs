//! `reqwest` implementation of `Backend`.

use crate::backend::{Backend, BackendError, ProjectId, TextAction};
use crate::config::CanvasConfig;
use reqwest::{Client, RequestBuilder};
use sc_core::{StoredProject, WireProject};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub struct HttpBackend {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

// ─── Payloads ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct PromptRequest<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
struct MultipleRequest<'a> {
    prompt: &'a str,
    pages: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    prompt: &'a str,
    base64_str: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SectionRequest<'a> {
    full_html: &'a str,
    outer_html: &'a str,
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DesignRequest<'a> {
    prompt: &'a str,
    full_html: &'a str,
}

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
    action: TextAction,
}

#[derive(Deserialize)]
struct HtmlResponse {
    html: String,
}

#[derive(Deserialize)]
struct PagesResponse {
    html_pages: Vec<String>,
}

#[derive(Deserialize)]
struct UpdatedResponse {
    updated_html: String,
}

#[derive(Deserialize)]
struct ProcessedResponse {
    processed_text: String,
}

#[derive(Deserialize)]
struct EnhancedResponse {
    enhanced_prompt: String,
}

#[derive(Deserialize)]
struct PageNamesResponse {
    page_names: PageNames,
}

/// The flow endpoint answers with either a JSON array or a JSON-encoded
/// string holding that array.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageNames {
    List(Vec<String>),
    Encoded(String),
}

#[derive(Deserialize)]
struct SaveResponse {
    #[serde(default)]
    message: String,
}

/// A saved canvas in either the frontend shape or the server's row shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoadedProject {
    Wire(WireProject),
    Stored(StoredProject),
}

impl PageNames {
    fn into_list(self) -> Result<Vec<String>, BackendError> {
        match self {
            PageNames::List(names) => Ok(names),
            PageNames::Encoded(text) => serde_json::from_str(&text)
                .map_err(|err| BackendError::Decode(format!("page names: {err}"))),
        }
    }
}

impl From<LoadedProject> for WireProject {
    fn from(loaded: LoadedProject) -> Self {
        match loaded {
            LoadedProject::Wire(wire) => wire,
            LoadedProject::Stored(stored) => stored.into(),
        }
    }
}

// ─── Client ──────────────────────────────────────────────────────────────

impl HttpBackend {
    pub fn new(config: &CanvasConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, BackendError> {
        log::debug!("POST {path}");
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        Self::send(path, request).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, BackendError> {
        log::debug!("GET {path}");
        let request = self.authorize(self.client.get(self.url(path)));
        Self::send(path, request).await
    }

    async fn send<R: DeserializeOwned>(path: &str, request: RequestBuilder) -> Result<R, BackendError> {
        let response = request.send().await.inspect_err(|err| {
            log::warn!("{path}: {err}");
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("{path}: HTTP {status}");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<R>()
            .await
            .map_err(|err| BackendError::Decode(format!("{path}: {err}")))
    }
}

impl Backend for HttpBackend {
    async fn generate_single(&self, prompt: &str) -> Result<String, BackendError> {
        let r: HtmlResponse = self.post("generate-html", &PromptRequest { prompt }).await?;
        Ok(r.html)
    }

    async fn generate_multiple(
        &self,
        prompt: &str,
        pages: &[String],
    ) -> Result<Vec<String>, BackendError> {
        let r: PagesResponse = self
            .post("generate-multiple-html", &MultipleRequest { prompt, pages })
            .await?;
        Ok(r.html_pages)
    }

    async fn generate_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
    ) -> Result<String, BackendError> {
        let body = ImageRequest {
            prompt,
            base64_str: image_base64,
        };
        let r: HtmlResponse = self.post("generate-from-image", &body).await?;
        Ok(r.html)
    }

    async fn generate_flow_page_names(&self, prompt: &str) -> Result<Vec<String>, BackendError> {
        let r: PageNamesResponse = self.post("generate-flow", &PromptRequest { prompt }).await?;
        r.page_names.into_list()
    }

    async fn regenerate_section(
        &self,
        full_html: &str,
        fragment: &str,
        prompt: &str,
    ) -> Result<String, BackendError> {
        let body = SectionRequest {
            full_html,
            outer_html: fragment,
            prompt,
        };
        let r: UpdatedResponse = self.post("regenerate-section", &body).await?;
        Ok(r.updated_html)
    }

    async fn regenerate_design(
        &self,
        prompt: &str,
        full_html: &str,
    ) -> Result<String, BackendError> {
        let r: HtmlResponse = self
            .post("regenerate-design", &DesignRequest { prompt, full_html })
            .await?;
        Ok(r.html)
    }

    async fn process_text(&self, text: &str, action: TextAction) -> Result<String, BackendError> {
        let r: ProcessedResponse = self.post("regenerate-text", &TextRequest { text, action }).await?;
        Ok(r.processed_text)
    }

    async fn save_project(
        &self,
        project: ProjectId,
        wire: &WireProject,
    ) -> Result<(), BackendError> {
        let r: SaveResponse = self.post(&format!("projects/{project}/canvas"), wire).await?;
        log::info!("project {project} saved: {}", r.message);
        Ok(())
    }

    async fn load_project(&self, project: ProjectId) -> Result<WireProject, BackendError> {
        let loaded: LoadedProject = self.get(&format!("projects/{project}/canvas")).await?;
        Ok(loaded.into())
    }

    async fn enhance_prompt(&self, prompt: &str) -> Result<String, BackendError> {
        let r: EnhancedResponse = self.post("enhance-prompt", &PromptRequest { prompt }).await?;
        Ok(r.enhanced_prompt)
    }
}
