pub mod bounds;
pub mod classify;
pub mod id;
pub mod model;
pub mod persist;
pub mod place;
pub mod reflow;
pub mod sizes;
pub mod title;
pub mod wire;

pub use bounds::{GROUP_PADDING, compute_bounds, group_bounds};
pub use classify::{Group, Grouping, classify, lineage, next_version};
pub use id::ScreenId;
pub use model::*;
pub use persist::{GroupNames, Restored, deserialize, serialize};
pub use place::{Placement, VersionAnchor, place};
pub use reflow::{BoundsTracker, Debouncer, Reflow};
pub use sizes::{FrameSizer, PreviewWidth, ReportKind, SizeReport, SizeTable};
pub use title::Title;
pub use wire::{StoredProject, WireError, WireProject};
