//! Bounds engine: padded rectangle enclosing a set of screens.

use crate::classify::Grouping;
use crate::model::{GroupKey, Rect, Screen};
use crate::sizes::SizeTable;

/// Padding around group rectangles.
pub const GROUP_PADDING: f32 = 50.0;

/// Bounds changes smaller than this in every dimension are not re-rendered.
pub const BOUNDS_EPSILON: f32 = 1.0;

/// Minimal rectangle enclosing `members`, grown by `padding` on every side.
///
/// Sizes come from the table, then the declared size, then the default.
/// An empty member list yields `Rect::ZERO`, which callers treat as
/// "do not render".
pub fn compute_bounds(members: &[&Screen], sizes: &SizeTable, padding: f32) -> Rect {
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;

    for screen in members {
        let r = screen.rect(sizes);
        min_x = min_x.min(r.x);
        min_y = min_y.min(r.y);
        max_x = max_x.max(r.right());
        max_y = max_y.max(r.bottom());
    }

    if min_x > max_x || min_y > max_y {
        return Rect::ZERO;
    }

    Rect {
        x: min_x - padding,
        y: min_y - padding,
        width: (max_x - min_x) + 2.0 * padding,
        height: (max_y - min_y) + 2.0 * padding,
    }
}

/// Padded bounds of every group in `grouping`, in group order.
pub fn group_bounds(grouping: &Grouping<'_>, sizes: &SizeTable) -> Vec<(GroupKey, Rect)> {
    grouping
        .groups
        .iter()
        .map(|g| (g.key.clone(), compute_bounds(&g.members, sizes, GROUP_PADDING)))
        .collect()
}
