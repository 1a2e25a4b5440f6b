//! Placement allocator for newly generated screens.
//!
//! - Unrelated content stacks vertically below everything already placed.
//! - Pages of a multi-page flow run left to right on a shared row.
//! - A new version goes right of a reference screen, on the row of the
//!   screen it was regenerated from.
//!
//! All constants are whole canvas units; given identical inputs `place`
//! returns identical positions.

use crate::classify::lineage;
use crate::id::ScreenId;
use crate::model::{Point, Screen};
use crate::sizes::SizeTable;

/// Left edge for new rows.
pub const LEFT_MARGIN: f32 = 100.0;
/// Top edge of the first row on an empty canvas.
pub const TOP_MARGIN: f32 = 100.0;
/// Gap between stacked rows. Larger than two group paddings so padded
/// group rectangles never touch, even before frames report real heights.
pub const VERTICAL_SPACING: f32 = 500.0;
/// Gap between pages of a flow.
pub const FLOW_PAGE_SPACING: f32 = 80.0;
/// Gap between a screen and its next version.
pub const VERSION_SPACING: f32 = 200.0;

/// Reference screen a new version is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionAnchor {
    /// Right of the most recently added screen in the whole collection.
    #[default]
    Latest,
    /// Right of the rightmost screen in the source's own lineage.
    Lineage,
}

/// What is being placed. Incoming screens have their positions overwritten.
#[derive(Debug, Clone)]
pub enum Placement {
    /// One unrelated screen (single or image-derived generation).
    Single(Screen),
    /// Ordered pages of a flow.
    Flow(Vec<Screen>),
    /// A regenerated version of `source`.
    Version {
        source: ScreenId,
        screen: Screen,
        anchor: VersionAnchor,
    },
}

/// Assign canvas positions to the screens in `request`.
#[must_use]
pub fn place(existing: &[Screen], sizes: &SizeTable, request: Placement) -> Vec<Screen> {
    match request {
        Placement::Single(mut screen) => {
            screen.position = Point::new(LEFT_MARGIN, next_row_top(existing, sizes));
            vec![screen]
        }
        Placement::Flow(mut pages) => {
            let top = next_row_top(existing, sizes);
            let mut x = LEFT_MARGIN;
            for page in &mut pages {
                page.position = Point::new(x, top);
                x += page.effective_size(sizes).width + FLOW_PAGE_SPACING;
            }
            pages
        }
        Placement::Version {
            source,
            mut screen,
            anchor,
        } => {
            let Some(src) = existing.iter().find(|s| s.id == source) else {
                log::warn!("version source {source} not found; stacking as new row");
                screen.position = Point::new(LEFT_MARGIN, next_row_top(existing, sizes));
                return vec![screen];
            };
            let reference = match anchor {
                VersionAnchor::Latest => existing.last(),
                VersionAnchor::Lineage => lineage(existing, src)
                    .into_iter()
                    .max_by(|a, b| a.rect(sizes).right().total_cmp(&b.rect(sizes).right())),
            }
            .unwrap_or(src);
            let right = reference.rect(sizes).right();
            screen.position = Point::new(right + VERSION_SPACING, src.position.y);
            vec![screen]
        }
    }
}

/// Top edge for content that must not overlap anything in `existing`.
pub fn next_row_top(existing: &[Screen], sizes: &SizeTable) -> f32 {
    existing
        .iter()
        .map(|s| s.rect(sizes).bottom())
        .reduce(f32::max)
        .map_or(TOP_MARGIN, |bottom| bottom + VERTICAL_SPACING)
}
