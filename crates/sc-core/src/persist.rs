//! Persistence mapper: screens ⇄ `WireProject`.
//!
//! **Save** re-classifies the screens and emits one wire group per derived
//! group (ungrouped screens become `single-<id>` groups). Inside a group,
//! each version lineage becomes one wire screen keyed by its base, carrying
//! every version of that lineage in ascending order.
//!
//! **Load** ignores saved absolute Y coordinates. Groups keep their saved
//! vertical order but are re-stacked with the current spacing, then version
//! siblings are re-spaced horizontally from their base. The two passes are
//! independent: vertical order comes from saved group positions, horizontal
//! order from version numbers.
//!
//! Malformed saved state degrades: nothing with content is ever dropped.

use crate::bounds::compute_bounds;
use crate::classify::{Group, classify};
use crate::id::ScreenId;
use crate::model::{GroupKey, GroupKind, Point, Screen, Size, kind_of_key, single_key};
use crate::place::{TOP_MARGIN, VERSION_SPACING, VERTICAL_SPACING};
use crate::sizes::SizeTable;
use crate::title::Title;
use crate::wire::{WireGroup, WireProject, WireScreen, WireVersion};
use std::collections::{HashMap, HashSet};

/// User-set group names keyed by group key string.
pub type GroupNames = HashMap<String, String>;

/// Model reconstructed from a saved project.
#[derive(Debug, Clone, Default)]
pub struct Restored {
    pub screens: Vec<Screen>,
    pub sizes: SizeTable,
    /// Only names that differ from the derived default.
    pub group_names: GroupNames,
}

// ─── Save ────────────────────────────────────────────────────────────────

/// Flatten the model into the wire format.
#[must_use]
pub fn serialize(screens: &[Screen], sizes: &SizeTable, names: &GroupNames) -> WireProject {
    let grouping = classify(screens);
    let mut groups = Vec::with_capacity(grouping.groups.len() + grouping.ungrouped.len());

    for group in &grouping.groups {
        let Some(first) = group.first() else {
            continue;
        };
        let key = group.key.to_string();
        let name = names
            .get(&key)
            .cloned()
            .unwrap_or_else(|| group.key.kind().default_name().to_string());
        groups.push(WireGroup {
            frontend_id: key,
            name,
            position: first.position,
            size: Some(aggregate_size(&group.members, sizes)),
            screens: wire_screens(group, sizes),
        });
    }

    for &screen in &grouping.ungrouped {
        let key = single_key(screen.id);
        let name = names
            .get(&key)
            .cloned()
            .unwrap_or_else(|| GroupKind::Single.default_name().to_string());
        groups.push(WireGroup {
            frontend_id: key,
            name,
            position: screen.position,
            size: Some(screen.effective_size(sizes)),
            screens: vec![wire_screen(screen, &[screen], sizes)],
        });
    }

    log::debug!(
        "serialized {} screens into {} wire groups",
        screens.len(),
        groups.len()
    );
    WireProject { groups }
}

fn aggregate_size(members: &[&Screen], sizes: &SizeTable) -> Size {
    let r = compute_bounds(members, sizes, 0.0);
    Size::new(r.width, r.height)
}

/// Split a group into lineages and emit one wire screen per base.
fn wire_screens(group: &Group<'_>, sizes: &SizeTable) -> Vec<WireScreen> {
    match &group.key {
        GroupKey::Versions(anchor) => {
            let base = group
                .members
                .iter()
                .find(|s| s.id == *anchor)
                .or(group.members.first());
            base.map(|base| vec![wire_screen(base, &group.members, sizes)])
                .unwrap_or_default()
        }
        GroupKey::Explicit(_) => {
            let mut lineages: Vec<Vec<&Screen>> = Vec::new();
            for &member in &group.members {
                let slot = lineages.iter_mut().find(|l| {
                    l[0].page_name == member.page_name && l[0].title.base() == member.title.base()
                });
                match slot {
                    Some(lineage) => lineage.push(member),
                    None => lineages.push(vec![member]),
                }
            }
            lineages
                .into_iter()
                .map(|mut lineage| {
                    lineage.sort_by_key(|s| s.title.ordinal());
                    // Lowest version is the base; an un-suffixed member when present.
                    let base = lineage[0];
                    wire_screen(base, &lineage, sizes)
                })
                .collect()
        }
    }
}

fn wire_screen(base: &Screen, versions: &[&Screen], sizes: &SizeTable) -> WireScreen {
    let size = base.effective_size(sizes);
    WireScreen {
        base_frontend_id: base.id.to_string(),
        title: base.title.to_string(),
        position: base.position,
        width: size.width,
        height: size.height,
        page_name: base.page_name.clone(),
        versions: versions
            .iter()
            .map(|s| WireVersion {
                id: s.id.to_string(),
                title: s.title.to_string(),
                html_content: s.content.clone(),
                version_number: Some(s.title.ordinal() + 1),
            })
            .collect(),
    }
}

// ─── Load ────────────────────────────────────────────────────────────────

/// Rebuild screens, sizes and group names from a saved project.
#[must_use]
pub fn deserialize(project: &WireProject) -> Restored {
    let mut ordered: Vec<&WireGroup> = project.groups.iter().collect();
    ordered.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));

    let mut restored = Restored::default();
    let mut used: HashSet<ScreenId> = HashSet::new();
    let mut chains: Vec<Vec<usize>> = Vec::new();
    let mut cursor = TOP_MARGIN;

    for group in ordered {
        let kind = kind_of_key(&group.frontend_id);
        if !group.name.is_empty() && group.name != kind.default_name() {
            restored
                .group_names
                .insert(group.frontend_id.clone(), group.name.clone());
        }
        if group.screens.is_empty() {
            log::warn!("saved group {} has no screens", group.frontend_id);
            continue;
        }

        let group_id = kind.is_explicit().then(|| group.frontend_id.clone());
        let mut row_height: f32 = 0.0;
        for wire in &group.screens {
            let chain = restore_chain(wire, group_id.as_deref(), cursor, &mut used, &mut restored);
            row_height = row_height.max(restored.screens[chain[0]].effective_size(&restored.sizes).height);
            chains.push(chain);
        }
        cursor += row_height + VERTICAL_SPACING;
    }

    // Horizontal pass: versions spread right of their base.
    for chain in &chains {
        let base = &restored.screens[chain[0]];
        let base_x = base.position.x;
        let step = base.effective_size(&restored.sizes).width + VERSION_SPACING;
        for (i, &idx) in chain.iter().enumerate().skip(1) {
            restored.screens[idx].position.x = base_x + i as f32 * step;
        }
    }

    log::debug!(
        "restored {} screens from {} wire groups",
        restored.screens.len(),
        project.groups.len()
    );
    restored
}

/// Restore one wire screen and its versions at row `top`. Returns indices
/// into `restored.screens`, base first, ascending by version.
fn restore_chain(
    wire: &WireScreen,
    group_id: Option<&str>,
    top: f32,
    used: &mut HashSet<ScreenId>,
    restored: &mut Restored,
) -> Vec<usize> {
    let size = Size::new(wire.width, wire.height);
    let size = if size.is_usable() {
        size
    } else {
        log::warn!("saved screen {} has unusable size; using default", wire.base_frontend_id);
        Size::DEFAULT
    };

    let mut versions: Vec<(u32, &WireVersion)> = wire
        .versions
        .iter()
        .enumerate()
        .map(|(i, v)| (frontend_version(v, i), v))
        .collect();
    versions.sort_by_key(|(n, _)| *n);

    let base_title = if wire.title.trim().is_empty() {
        versions
            .first()
            .map(|(_, v)| Title::parse(&v.title).base().to_string())
            .unwrap_or_default()
    } else {
        Title::parse(&wire.title).base().to_string()
    };
    let base_title = Title::new(base_title);

    // A version with no usable base reference becomes its own base.
    let base_ref = if !wire.base_frontend_id.is_empty() {
        ScreenId::intern(&wire.base_frontend_id)
    } else if let Some((_, first)) = versions.first().filter(|(_, v)| !v.id.is_empty()) {
        log::warn!("saved screen without base id; version {} becomes its own base", first.id);
        ScreenId::intern(&first.id)
    } else {
        log::warn!("saved screen without base id or versions; generating one");
        ScreenId::generate()
    };
    let base_id = claim(base_ref, used);

    let make = |id: ScreenId, title: Title, content: String| Screen {
        id,
        title,
        content,
        position: Point::new(wire.position.x, top),
        declared_size: Some(size),
        group_id: group_id.map(str::to_string),
        page_name: wire.page_name.clone(),
    };

    if versions.is_empty() {
        log::warn!("saved screen {base_id} has no versions; restoring it empty");
        let title = Title::parse(&wire.title);
        return vec![push(restored, make(base_id, title, String::new()), size)];
    }

    let mut chain = Vec::with_capacity(versions.len());
    for (i, (n, version)) in versions.into_iter().enumerate() {
        let id = if i == 0 {
            base_id
        } else {
            claim(base_id.version_of(n), used)
        };
        let screen = make(id, base_title.with_version(n), version.html_content.clone());
        chain.push(push(restored, screen, size));
    }
    chain
}

fn push(restored: &mut Restored, screen: Screen, size: Size) -> usize {
    restored.sizes.report(screen.id, size);
    restored.screens.push(screen);
    restored.screens.len() - 1
}

/// Frontend version number of a saved version: title suffix, else the
/// 1-based stored number, else its position in the list.
fn frontend_version(version: &WireVersion, index: usize) -> u32 {
    Title::parse(&version.title)
        .version()
        .or_else(|| version.version_number.map(|n| n.saturating_sub(1)))
        .unwrap_or(index as u32)
}

/// Reserve `id`, suffixing it when a malformed save reuses an id.
fn claim(id: ScreenId, used: &mut HashSet<ScreenId>) -> ScreenId {
    if used.insert(id) {
        return id;
    }
    let mut n = 1;
    loop {
        let candidate = ScreenId::intern(&format!("{id}-dup{n}"));
        if used.insert(candidate) {
            log::warn!("duplicate saved id {id}; restored as {candidate}");
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn screen(id: &str, title: &str, html: &str) -> Screen {
        Screen::new(ScreenId::intern(id), Title::parse(title), html)
    }

    #[test]
    fn version_group_becomes_one_wire_screen() {
        let screens = vec![
            screen("vg0", "Home", "<a/>").at(100.0, 100.0),
            screen("vg1", "Home (v1)", "<b/>").at(1690.0, 100.0),
            screen("vg2", "Home (v2)", "<c/>").at(3280.0, 100.0),
        ];
        let wire = serialize(&screens, &SizeTable::default(), &GroupNames::new());

        assert_eq!(wire.groups.len(), 1);
        let g = &wire.groups[0];
        assert_eq!(g.frontend_id, "version-group-vg0");
        assert_eq!(g.name, "Version Group");
        assert_eq!(g.position, Point::new(100.0, 100.0));
        assert_eq!(g.screens.len(), 1);
        let s = &g.screens[0];
        assert_eq!(s.base_frontend_id, "vg0");
        let titles: Vec<&str> = s.versions.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Home", "Home (v1)", "Home (v2)"]);
        let numbers: Vec<Option<u32>> = s.versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn aggregate_size_excludes_padding() {
        let screens = vec![
            screen("ag0", "Home", "").at(100.0, 100.0).sized(1000.0, 500.0),
            screen("ag1", "Home (v1)", "").at(1200.0, 100.0).sized(1000.0, 700.0),
        ];
        let wire = serialize(&screens, &SizeTable::default(), &GroupNames::new());
        assert_eq!(wire.groups[0].size, Some(Size::new(2100.0, 700.0)));
    }

    #[test]
    fn flow_pages_become_separate_bases() {
        let screens = vec![
            screen("fp0", "Home", "h").in_group("flow-5").page("Home"),
            screen("fp1", "About", "a").in_group("flow-5").page("About"),
            screen("fp2", "About (v1)", "a1").in_group("flow-5").page("About"),
        ];
        let wire = serialize(&screens, &SizeTable::default(), &GroupNames::new());
        let g = &wire.groups[0];
        assert_eq!(g.frontend_id, "flow-5");
        assert_eq!(g.name, "Multi-page Flow");
        let bases: Vec<(&str, usize)> = g
            .screens
            .iter()
            .map(|s| (s.base_frontend_id.as_str(), s.versions.len()))
            .collect();
        assert_eq!(bases, vec![("fp1", 2), ("fp0", 1)]);
    }

    #[test]
    fn flow_page_without_original_uses_lowest_version() {
        let screens = vec![screen("lo2", "Pricing (v2)", "p2")
            .in_group("flow-6")
            .page("Pricing")];
        let wire = serialize(&screens, &SizeTable::default(), &GroupNames::new());
        assert_eq!(wire.groups[0].screens[0].base_frontend_id, "lo2");
    }

    #[test]
    fn explicit_names_win() {
        let screens = vec![screen("nm", "Solo", "")];
        let mut names = GroupNames::new();
        names.insert("single-nm".into(), "Landing idea".into());
        let wire = serialize(&screens, &SizeTable::default(), &names);
        assert_eq!(wire.groups[0].frontend_id, "single-nm");
        assert_eq!(wire.groups[0].name, "Landing idea");
    }

    #[test]
    fn load_restacks_groups_in_saved_order() {
        let screens = vec![
            screen("lower", "Lower", "l").at(100.0, 5000.0),
            screen("upper", "Upper", "u").at(100.0, 10.0),
        ];
        let wire = serialize(&screens, &SizeTable::default(), &GroupNames::new());
        let restored = deserialize(&wire);

        let upper = restored.screens.iter().find(|s| s.id.as_str() == "upper").unwrap();
        let lower = restored.screens.iter().find(|s| s.id.as_str() == "lower").unwrap();
        assert_eq!(upper.position.y, TOP_MARGIN);
        assert_eq!(lower.position.y, TOP_MARGIN + Size::DEFAULT.height + VERTICAL_SPACING);
        assert!(upper.group_id.is_none() && lower.group_id.is_none());
    }

    #[test]
    fn load_synthesizes_version_ids_and_spacing() {
        let screens = vec![
            screen("sv0", "Home", "<a/>").at(100.0, 100.0).sized(1440.0, 900.0),
            screen("sv1", "Home (v1)", "<b/>").at(9000.0, 100.0),
            screen("sv2", "Home (v2)", "<c/>").at(200.0, 100.0),
        ];
        let restored = deserialize(&serialize(&screens, &SizeTable::default(), &GroupNames::new()));

        let ids: Vec<&str> = restored.screens.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["sv0", "sv0-v1", "sv0-v2"]);
        let xs: Vec<f32> = restored.screens.iter().map(|s| s.position.x).collect();
        let step = 1440.0 + VERSION_SPACING;
        assert_eq!(xs, vec![100.0, 100.0 + step, 100.0 + 2.0 * step]);
        assert_eq!(restored.sizes.get(ScreenId::intern("sv0-v2")), Some(Size::new(1440.0, 900.0)));
    }

    #[test]
    fn explicit_group_ids_survive_load() {
        let screens = vec![
            screen("ex0", "Home", "h").in_group("flow-77").page("Home"),
            screen("ex1", "Upload", "u").in_group("IMAGE-3").at(0.0, 2000.0),
        ];
        let restored = deserialize(&serialize(&screens, &SizeTable::default(), &GroupNames::new()));
        let ex0 = restored.screens.iter().find(|s| s.id.as_str() == "ex0").unwrap();
        assert_eq!(ex0.group_id.as_deref(), Some("flow-77"));
        assert_eq!(ex0.page_name.as_deref(), Some("Home"));
        let ex1 = restored.screens.iter().find(|s| s.id.as_str() == "ex1").unwrap();
        assert_eq!(ex1.group_id.as_deref(), Some("IMAGE-3"));
    }

    #[test]
    fn only_custom_names_are_restored() {
        let screens = vec![screen("cn0", "Home", ""), screen("cn1", "Other", "").at(0.0, 3000.0)];
        let mut names = GroupNames::new();
        names.insert("single-cn1".into(), "Keep me".into());
        let restored = deserialize(&serialize(&screens, &SizeTable::default(), &names));
        assert_eq!(restored.group_names.len(), 1);
        assert_eq!(restored.group_names["single-cn1"], "Keep me");
    }

    #[test]
    fn missing_base_id_falls_back_to_version() {
        let project = WireProject {
            groups: vec![WireGroup {
                frontend_id: "single-x".into(),
                name: String::new(),
                position: Point::default(),
                size: None,
                screens: vec![WireScreen {
                    base_frontend_id: String::new(),
                    title: String::new(),
                    position: Point::new(100.0, 0.0),
                    width: 0.0,
                    height: -1.0,
                    page_name: None,
                    versions: vec![WireVersion {
                        id: "orphan".into(),
                        title: "Blog (v3)".into(),
                        html_content: "<blog/>".into(),
                        version_number: None,
                    }],
                }],
            }],
        };
        let restored = deserialize(&project);
        assert_eq!(restored.screens.len(), 1);
        let s = &restored.screens[0];
        assert_eq!(s.id.as_str(), "orphan");
        assert_eq!(s.title.to_string(), "Blog (v3)");
        assert_eq!(s.content, "<blog/>");
        assert_eq!(s.effective_size(&restored.sizes), Size::DEFAULT);
    }

    #[test]
    fn empty_screen_is_restored_not_dropped() {
        let project = WireProject {
            groups: vec![WireGroup {
                frontend_id: "single-e".into(),
                name: "Screen".into(),
                position: Point::default(),
                size: None,
                screens: vec![WireScreen {
                    base_frontend_id: "e".into(),
                    title: "Empty".into(),
                    position: Point::default(),
                    width: 1440.0,
                    height: 800.0,
                    page_name: None,
                    versions: vec![],
                }],
            }],
        };
        let restored = deserialize(&project);
        assert_eq!(restored.screens.len(), 1);
        assert_eq!(restored.screens[0].title.to_string(), "Empty");
        assert!(restored.screens[0].content.is_empty());
    }

    #[test]
    fn duplicate_base_ids_are_made_unique() {
        let one = |y: f32| WireGroup {
            frontend_id: "single-d".into(),
            name: String::new(),
            position: Point::new(0.0, y),
            size: None,
            screens: vec![WireScreen {
                base_frontend_id: "d".into(),
                title: "Dup".into(),
                position: Point::default(),
                width: 1440.0,
                height: 800.0,
                page_name: None,
                versions: vec![WireVersion {
                    id: "d".into(),
                    title: "Dup".into(),
                    html_content: format!("<p>{y}</p>"),
                    version_number: Some(1),
                }],
            }],
        };
        let restored = deserialize(&WireProject {
            groups: vec![one(0.0), one(10.0)],
        });
        let ids: Vec<&str> = restored.screens.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "d-dup1"]);
        assert_eq!(restored.screens[1].content, "<p>10</p>");
    }

    #[test]
    fn empty_project_roundtrips_to_nothing() {
        let wire = serialize(&[], &SizeTable::default(), &GroupNames::new());
        assert!(wire.groups.is_empty());
        let restored = deserialize(&wire);
        assert!(restored.screens.is_empty());
        assert!(restored.sizes.is_empty());
    }
}
