//! Grouping classifier: flat screen list → groups + ungrouped.
//!
//! Three production rules, applied in order:
//!
//! 1. **Explicit**: A screen with `group_id` belongs to that group.
//! 2. **Inferred version chain**: An un-grouped screen whose title carries a
//!    version suffix joins `version-group-<base>`, where `<base>` is the first
//!    un-grouped, un-suffixed screen with the same base title. The base is
//!    seeded into the group.
//! 3. **None**: Everything else is ungrouped, including versioned screens
//!    whose base no longer exists.
//!
//! Title collisions between unrelated screens are not disambiguated: the first
//! matching base wins.
//!
//! The classifier is pure and cheap; callers re-run it on every read instead
//! of caching a partition.

use crate::id::ScreenId;
use crate::model::{GroupKey, Screen};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// A derived group and its ordered members.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: GroupKey,
    pub members: SmallVec<[&'a Screen; 4]>,
}

impl<'a> Group<'a> {
    pub fn contains(&self, id: ScreenId) -> bool {
        self.members.iter().any(|s| s.id == id)
    }

    /// First member in sorted order; anchors saved group metadata.
    pub fn first(&self) -> Option<&'a Screen> {
        self.members.first().copied()
    }
}

/// Result of `classify`.
#[derive(Debug, Clone, Default)]
pub struct Grouping<'a> {
    /// Groups in order of first appearance in the input.
    pub groups: Vec<Group<'a>>,
    /// Screens in no group, in input order.
    pub ungrouped: Vec<&'a Screen>,
}

impl<'a> Grouping<'a> {
    pub fn group(&self, key: &GroupKey) -> Option<&Group<'a>> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// The group containing `id`, if it is grouped.
    pub fn group_of(&self, id: ScreenId) -> Option<&Group<'a>> {
        self.groups.iter().find(|g| g.contains(id))
    }

    /// All screens: group members (sorted) followed by ungrouped ones.
    pub fn flatten(&self) -> Vec<&'a Screen> {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter().copied())
            .chain(self.ungrouped.iter().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.ungrouped.is_empty()
    }
}

/// Partition `screens` into explicit groups, inferred version groups, and
/// ungrouped screens.
#[must_use]
pub fn classify(screens: &[Screen]) -> Grouping<'_> {
    // Base title → first screen that can anchor a version chain for it.
    let mut anchors: HashMap<&str, ScreenId> = HashMap::new();
    for screen in screens.iter().filter(|s| s.is_inference_base()) {
        anchors.entry(screen.title.base()).or_insert(screen.id);
    }

    // Anchors that actually have at least one version pointing at them.
    let referenced: HashSet<ScreenId> = screens
        .iter()
        .filter(|s| s.group_id.is_none() && s.title.is_versioned())
        .filter_map(|s| anchors.get(s.title.base()).copied())
        .collect();

    let mut grouping = Grouping::default();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for screen in screens {
        let key = if let Some(explicit) = &screen.group_id {
            Some(GroupKey::Explicit(explicit.clone()))
        } else if screen.title.is_versioned() {
            anchors
                .get(screen.title.base())
                .map(|base| GroupKey::Versions(*base))
        } else if referenced.contains(&screen.id) {
            Some(GroupKey::Versions(screen.id))
        } else {
            None
        };

        match key {
            Some(key) => {
                let slot = *index.entry(key.clone()).or_insert_with(|| {
                    grouping.groups.push(Group {
                        key,
                        members: SmallVec::new(),
                    });
                    grouping.groups.len() - 1
                });
                grouping.groups[slot].members.push(screen);
            }
            None => grouping.ungrouped.push(screen),
        }
    }

    for group in &mut grouping.groups {
        sort_members(group);
    }

    log::trace!(
        "classified {} screens into {} groups, {} ungrouped",
        screens.len(),
        grouping.groups.len(),
        grouping.ungrouped.len()
    );
    grouping
}

fn sort_members(group: &mut Group<'_>) {
    match group.key {
        GroupKey::Versions(_) => group.members.sort_by_key(|s| s.title.ordinal()),
        GroupKey::Explicit(_) => group.members.sort_by(|a, b| {
            a.page_name
                .cmp(&b.page_name)
                .then(a.title.ordinal().cmp(&b.title.ordinal()))
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        }),
    }
}

// ─── Lineage ─────────────────────────────────────────────────────────────

/// Screens that share `source`'s version lineage, `source` included.
///
/// Explicitly grouped screens share a lineage with members of the same group,
/// page and base title. Un-grouped screens share one with every un-grouped
/// screen of the same base title.
pub fn lineage<'a>(screens: &'a [Screen], source: &Screen) -> Vec<&'a Screen> {
    screens
        .iter()
        .filter(|s| {
            s.group_id == source.group_id
                && s.title.base() == source.title.base()
                && (source.group_id.is_none() || s.page_name == source.page_name)
        })
        .collect()
}

/// Version number the next regeneration of `source` should receive.
///
/// One past the highest version in the lineage, so repeated regenerations
/// number 1..N without gaps.
pub fn next_version(screens: &[Screen], source: &Screen) -> u32 {
    lineage(screens, source)
        .iter()
        .map(|s| s.title.ordinal())
        .max()
        .unwrap_or(source.title.ordinal())
        + 1
}
