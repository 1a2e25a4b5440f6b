//! Core data model for the canvas.
//!
//! A project is a flat list of `Screen`s, each one generated design artifact
//! with a canvas position. Groups are never stored: they are derived from the
//! screens on every read by the classifier (`crate::classify`). Sizes reported
//! by rendered frames live in a separate `SizeTable` (`crate::sizes`) and take
//! precedence over the size declared when a screen was created.

use crate::id::ScreenId;
use crate::sizes::SizeTable;
use crate::title::Title;
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Constants ───────────────────────────────────────────────────────────

/// Width of the desktop preview.
pub const DESKTOP_WIDTH: f32 = 1440.0;
/// Width of the mobile preview.
pub const MOBILE_WIDTH: f32 = 390.0;
/// Placeholder height reported before a frame has been measured.
pub const DEFAULT_FRAME_HEIGHT: f32 = 600.0;

// ─── Geometry ────────────────────────────────────────────────────────────

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size assumed for a screen with neither a report nor a declaration.
    pub const DEFAULT: Size = Size::new(DESKTOP_WIDTH, DEFAULT_FRAME_HEIGHT);

    /// Both dimensions are finite and strictly positive.
    pub fn is_usable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Degenerate rect returned for empty member lists. Not rendered.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if two rectangles overlap (AABB, touching edges do not count).
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Every dimension differs from `other` by less than `epsilon`.
    pub fn approx_eq(&self, other: &Rect, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.width - other.width).abs() < epsilon
            && (self.height - other.height).abs() < epsilon
    }
}

// ─── Screens ─────────────────────────────────────────────────────────────

/// One generated design artifact on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    /// Stable id; for version chains the base screen's id keys the group.
    pub id: ScreenId,

    /// Base title plus optional version number.
    pub title: Title,

    /// Opaque markup payload. Passed through untouched.
    pub content: String,

    /// Top-left corner in canvas coordinates.
    pub position: Point,

    /// Size declared at creation, used until a frame reports a real one.
    pub declared_size: Option<Size>,

    /// Explicit group (`flow-…`, `IMAGE-…`). `None` still allows an
    /// inferred version-group membership.
    pub group_id: Option<String>,

    /// Page name inside a multi-page flow.
    pub page_name: Option<String>,
}

impl Screen {
    pub fn new(id: ScreenId, title: Title, content: impl Into<String>) -> Self {
        Self {
            id,
            title,
            content: content.into(),
            position: Point::default(),
            declared_size: None,
            group_id: None,
            page_name: None,
        }
    }

    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    #[must_use]
    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.declared_size = Some(Size::new(width, height));
        self
    }

    #[must_use]
    pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    #[must_use]
    pub fn page(mut self, page_name: impl Into<String>) -> Self {
        self.page_name = Some(page_name.into());
        self
    }

    /// Size used for layout: last reported, else declared, else default.
    pub fn effective_size(&self, sizes: &SizeTable) -> Size {
        sizes
            .get(self.id)
            .or(self.declared_size)
            .unwrap_or(Size::DEFAULT)
    }

    /// Layout rectangle of this screen (no padding).
    pub fn rect(&self, sizes: &SizeTable) -> Rect {
        let size = self.effective_size(sizes);
        Rect::new(self.position.x, self.position.y, size.width, size.height)
    }

    /// Whether this screen may anchor an inferred version group.
    pub fn is_inference_base(&self) -> bool {
        self.group_id.is_none() && !self.title.is_versioned()
    }
}

// ─── Group keys ──────────────────────────────────────────────────────────

const VERSION_GROUP_PREFIX: &str = "version-group-";
const FLOW_PREFIX: &str = "flow-";
const IMAGE_PREFIX: &str = "IMAGE-";
const SINGLE_PREFIX: &str = "single-";

/// Key of a derived group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// An explicit group id carried by the members (`flow-…`, `IMAGE-…`).
    Explicit(String),
    /// A version chain inferred from titles, keyed by its base screen.
    Versions(ScreenId),
}

/// What produced a group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Flow,
    Image,
    Versions,
    /// Wire-only wrapper around an ungrouped screen.
    Single,
    Custom,
}

impl GroupKey {
    /// Key for a new multi-page flow.
    pub fn new_flow() -> Self {
        GroupKey::Explicit(format!("{FLOW_PREFIX}{}", crate::id::next_stamp()))
    }

    /// Key for a new image-derived generation.
    pub fn new_image() -> Self {
        GroupKey::Explicit(format!("{IMAGE_PREFIX}{}", crate::id::next_stamp()))
    }

    /// Parse a key string. Anything not in `version-group-<id>` form is explicit.
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix(VERSION_GROUP_PREFIX) {
            Some(id) if !id.is_empty() => GroupKey::Versions(ScreenId::intern(id)),
            _ => GroupKey::Explicit(s.to_string()),
        }
    }

    pub fn kind(&self) -> GroupKind {
        match self {
            GroupKey::Versions(_) => GroupKind::Versions,
            GroupKey::Explicit(id) => kind_of_explicit(id),
        }
    }

    /// The explicit id stored on member screens, if any.
    pub fn explicit_id(&self) -> Option<&str> {
        match self {
            GroupKey::Explicit(id) => Some(id),
            GroupKey::Versions(_) => None,
        }
    }
}

/// Wire key for an ungrouped screen.
pub fn single_key(id: ScreenId) -> String {
    format!("{SINGLE_PREFIX}{id}")
}

/// Classify a raw key string as it appears on the wire.
pub fn kind_of_key(key: &str) -> GroupKind {
    GroupKey::parse(key).kind()
}

fn kind_of_explicit(id: &str) -> GroupKind {
    if id.starts_with(FLOW_PREFIX) {
        GroupKind::Flow
    } else if id.starts_with(IMAGE_PREFIX) {
        GroupKind::Image
    } else if id.starts_with(SINGLE_PREFIX) {
        GroupKind::Single
    } else {
        GroupKind::Custom
    }
}

impl GroupKind {
    /// Name shown when the user has not renamed the group.
    pub fn default_name(&self) -> &'static str {
        match self {
            GroupKind::Flow => "Multi-page Flow",
            GroupKind::Image => "Image Design",
            GroupKind::Versions => "Version Group",
            GroupKind::Single => "Screen",
            GroupKind::Custom => "Group",
        }
    }

    /// Keys of this kind are restored onto `Screen::group_id` after a load.
    pub fn is_explicit(&self) -> bool {
        matches!(self, GroupKind::Flow | GroupKind::Image | GroupKind::Custom)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Explicit(id) => f.write_str(id),
            GroupKey::Versions(base) => write!(f, "{VERSION_GROUP_PREFIX}{base}"),
        }
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey::parse(s)
    }
}
