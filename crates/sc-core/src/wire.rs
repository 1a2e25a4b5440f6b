//! Persistence wire format.
//!
//! `WireProject` is the normalized group → screen → version tree exchanged
//! with the backend on save. On load the backend answers with its own
//! `StoredProject` shape (numeric database ids plus metadata blobs), which is
//! folded back into the frontend-id keyed `WireProject` by `From`.

use crate::model::{DEFAULT_FRAME_HEIGHT, DESKTOP_WIDTH, Point, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Encode/decode failures for saved projects and local drafts.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not encode draft: {0}")]
    DraftEncode(#[from] rmp_serde::encode::Error),

    #[error("could not decode draft: {0}")]
    DraftDecode(#[from] rmp_serde::decode::Error),
}

// ─── Frontend shape ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProject {
    pub groups: Vec<WireGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireGroup {
    /// `flow-…`, `IMAGE-…`, `version-group-…` or `single-…`.
    pub frontend_id: String,
    pub name: String,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    pub screens: Vec<WireScreen>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireScreen {
    pub base_frontend_id: String,
    pub title: String,
    pub position: Point,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_name: Option<String>,
    pub versions: Vec<WireVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVersion {
    pub id: String,
    pub title: String,
    pub html_content: String,
    /// 1-based; 1 is the original screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_number: Option<u32>,
}

impl WireProject {
    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compact binary encoding for local drafts.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, WireError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    /// Total number of versions across all groups.
    pub fn version_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.screens)
            .map(|s| s.versions.len())
            .sum()
    }
}

// ─── Server shape ────────────────────────────────────────────────────────
//
// Rows are the backend's database records (snake_case). The `metadata` blobs
// are what the frontend wrote on save and stay camelCase.

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredProject {
    pub project_id: i64,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub groups: Vec<StoredGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredGroup {
    pub id: i64,
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub metadata: Option<GroupMetadata>,
    #[serde(default)]
    pub screens: Vec<StoredScreen>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupMetadata {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub frontend_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScreen {
    pub id: i64,
    #[serde(default)]
    pub group_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub current_version_number: Option<u32>,
    #[serde(default)]
    pub current_html_content: Option<String>,
    #[serde(default)]
    pub metadata: Option<ScreenMetadata>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub updated_by: Option<i64>,
    #[serde(default)]
    pub versions: Vec<StoredVersion>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScreenMetadata {
    pub position: Option<Point>,
    pub size: Option<Size>,
    pub frontend_id: Option<String>,
    pub page_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVersion {
    pub id: i64,
    #[serde(default)]
    pub screen_id: i64,
    /// 1-based; 1 is the original screen.
    pub version_number: u32,
    pub html_content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub created_by: Option<i64>,
}

impl StoredProject {
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl From<StoredProject> for WireProject {
    fn from(stored: StoredProject) -> Self {
        WireProject {
            groups: stored.groups.into_iter().map(fold_group).collect(),
        }
    }
}

fn fold_group(group: StoredGroup) -> WireGroup {
    let meta = group.metadata.unwrap_or_default();
    let frontend_id = meta.frontend_id.unwrap_or_else(|| {
        log::warn!("stored group {} has no frontend id", group.id);
        format!("db-{}", group.id)
    });
    WireGroup {
        frontend_id,
        name: group.name.unwrap_or_default(),
        position: meta.position.unwrap_or_default(),
        size: meta.size,
        screens: group.screens.into_iter().map(fold_screen).collect(),
    }
}

fn fold_screen(screen: StoredScreen) -> WireScreen {
    let meta = screen.metadata.unwrap_or_default();
    let base_frontend_id = meta.frontend_id.unwrap_or_else(|| {
        log::warn!("stored screen {} has no frontend id", screen.id);
        format!("db-{}", screen.id)
    });
    let size = meta
        .size
        .unwrap_or(Size::new(DESKTOP_WIDTH, DEFAULT_FRAME_HEIGHT));

    // Version rows carry no title; the number alone orders them.
    let mut versions: Vec<WireVersion> = screen
        .versions
        .into_iter()
        .map(|v| WireVersion {
            id: v.id.to_string(),
            title: String::new(),
            html_content: v.html_content,
            version_number: Some(v.version_number),
        })
        .collect();
    if versions.is_empty()
        && let Some(html) = screen.current_html_content
    {
        versions.push(WireVersion {
            id: base_frontend_id.clone(),
            title: String::new(),
            html_content: html,
            version_number: screen.current_version_number,
        });
    }

    WireScreen {
        base_frontend_id,
        title: screen.title.unwrap_or_default(),
        position: meta.position.unwrap_or_default(),
        width: size.width,
        height: size.height,
        page_name: meta.page_name,
        versions,
    }
}
