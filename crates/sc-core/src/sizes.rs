//! Size reconciliation between rendered frames and the screen model.
//!
//! Each screen is rendered inside a sandboxed frame that measures its content
//! and reports `(width, height)` back up. The reports land in a `SizeTable`,
//! which is authoritative over any size declared at creation time.
//!
//! A `FrameSizer` holds the per-frame side of the protocol:
//!
//! 1. `mount`: provisional report with the placeholder height, so layout can
//!    proceed before the content is measured.
//! 2. `settle`: the measured size once content finished loading. An
//!    unreadable measurement still produces a report (placeholder height).
//! 3. `toggle_width`: explicit desktop/mobile switch, reported as the new width with the
//!    last known height, corrected on the next `settle`.
//!
//! Reports carry no sequence token; for one screen the latest report wins.

use crate::id::ScreenId;
use crate::model::{DESKTOP_WIDTH, DEFAULT_FRAME_HEIGHT, MOBILE_WIDTH, Size};
use std::collections::HashMap;

/// Measured sizes keyed by screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeTable {
    entries: HashMap<ScreenId, Size>,
}

impl SizeTable {
    /// Record a report. Returns `true` if the stored size changed.
    pub fn report(&mut self, id: ScreenId, size: Size) -> bool {
        self.entries.insert(id, size) != Some(size)
    }

    pub fn get(&self, id: ScreenId) -> Option<Size> {
        self.entries.get(&id).copied()
    }

    pub fn remove(&mut self, id: ScreenId) -> Option<Size> {
        self.entries.remove(&id)
    }

    /// Drop entries for screens that no longer exist.
    pub fn retain(&mut self, mut keep: impl FnMut(ScreenId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScreenId, Size)> + '_ {
        self.entries.iter().map(|(id, size)| (*id, *size))
    }
}

impl FromIterator<(ScreenId, Size)> for SizeTable {
    fn from_iter<T: IntoIterator<Item = (ScreenId, Size)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ─── Frame protocol ──────────────────────────────────────────────────────

/// Named preview widths for the width toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewWidth {
    #[default]
    Desktop,
    Mobile,
}

impl PreviewWidth {
    pub fn px(&self) -> f32 {
        match self {
            PreviewWidth::Desktop => DESKTOP_WIDTH,
            PreviewWidth::Mobile => MOBILE_WIDTH,
        }
    }
}

/// Why a frame emitted a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Provisional,
    Settled,
    WidthToggle,
}

/// A size report travelling from a frame to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeReport {
    pub screen: ScreenId,
    pub size: Size,
    pub kind: ReportKind,
}

/// Per-frame reporting state.
#[derive(Debug, Clone)]
pub struct FrameSizer {
    screen: ScreenId,
    requested_width: f32,
    last_height: f32,
    settled: bool,
}

impl FrameSizer {
    /// Mount a frame for `screen` at `requested_width` and emit the
    /// provisional report.
    pub fn mount(screen: ScreenId, requested_width: f32) -> (Self, SizeReport) {
        let mut sizer = Self {
            screen,
            requested_width: sane_width(requested_width),
            last_height: DEFAULT_FRAME_HEIGHT,
            settled: false,
        };
        let report = sizer.provisional();
        (sizer, report)
    }

    /// Content was reassigned: measurements start over.
    pub fn reload(&mut self) -> SizeReport {
        self.settled = false;
        self.provisional()
    }

    /// Content finished loading. `measured` is `None` when the frame could
    /// not be read (cross-origin failure, content error).
    pub fn settle(&mut self, measured: Option<Size>) -> SizeReport {
        let size = match measured {
            Some(size) if size.is_usable() => size,
            Some(size) => {
                log::warn!(
                    "frame {} measured unusable size {}x{}; using placeholder",
                    self.screen,
                    size.width,
                    size.height
                );
                Size::new(self.requested_width, DEFAULT_FRAME_HEIGHT)
            }
            None => {
                log::warn!("frame {} could not be measured; using placeholder", self.screen);
                Size::new(self.requested_width, DEFAULT_FRAME_HEIGHT)
            }
        };
        self.last_height = size.height;
        self.settled = true;
        self.emit(size, ReportKind::Settled)
    }

    /// Switch preview width. Height is the last known one until the next settle.
    pub fn toggle_width(&mut self, width: f32) -> SizeReport {
        self.requested_width = sane_width(width);
        self.emit(
            Size::new(self.requested_width, self.last_height),
            ReportKind::WidthToggle,
        )
    }

    pub fn screen(&self) -> ScreenId {
        self.screen
    }

    pub fn requested_width(&self) -> f32 {
        self.requested_width
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    fn provisional(&mut self) -> SizeReport {
        self.last_height = DEFAULT_FRAME_HEIGHT;
        self.emit(
            Size::new(self.requested_width, DEFAULT_FRAME_HEIGHT),
            ReportKind::Provisional,
        )
    }

    fn emit(&self, size: Size, kind: ReportKind) -> SizeReport {
        log::trace!(
            "frame {} reports {:?} {}x{}",
            self.screen,
            kind,
            size.width,
            size.height
        );
        SizeReport {
            screen: self.screen,
            size,
            kind,
        }
    }
}

fn sane_width(width: f32) -> f32 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        DESKTOP_WIDTH
    }
}
