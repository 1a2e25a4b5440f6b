//! Integration tests: generation, regeneration and in-place edits.

mod support;

use pretty_assertions::assert_eq;
use sc_canvas::{
    CanvasConfig, CanvasError, EditOutcome, EditTarget, Selection, Step, TextAction, UiState,
    VersionPlacement,
};
use sc_core::place::{LEFT_MARGIN, TOP_MARGIN, VERSION_SPACING, VERTICAL_SPACING};
use sc_core::{
    DEFAULT_FRAME_HEIGHT, GroupKey, GroupKind, ReportKind, ScreenId, Size, SizeReport, classify,
};
use std::time::Instant;
use support::{MockBackend, ready_canvas, ready_canvas_with};

fn names(pages: &[&str]) -> Vec<String> {
    pages.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn single_generation_is_placed_and_selected() {
    let canvas = ready_canvas();
    let first = canvas.generate_single("Bakery landing page").await.unwrap();
    let second = canvas.generate_single("Pricing table").await.unwrap();

    let a = canvas.screen(first).unwrap();
    let b = canvas.screen(second).unwrap();
    assert_eq!(a.title.to_string(), "Bakery landing page");
    assert_eq!((a.position.x, a.position.y), (LEFT_MARGIN, TOP_MARGIN));
    assert!(b.position.y >= a.position.y + DEFAULT_FRAME_HEIGHT + VERTICAL_SPACING);
    assert_eq!(canvas.selection(), Selection::Screen(second));
    assert_eq!(canvas.activity().generating, 0);
}

#[tokio::test]
async fn flow_page_count_mismatch_adds_nothing() {
    let canvas = ready_canvas();
    *canvas.backend().pages.borrow_mut() = Some(vec!["<main>only one</main>".into()]);

    let err = canvas
        .generate_flow("Coffee shop", &names(&["Home", "About"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CanvasError::PageCountMismatch {
            expected: 2,
            received: 1
        }
    ));
    assert!(canvas.screens().is_empty());
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn flow_pages_share_a_group_and_row() {
    let canvas = ready_canvas();
    let ids = canvas
        .generate_flow("Coffee shop", &names(&["Home", "Menu", "Contact"]))
        .await
        .unwrap();
    assert_eq!(ids.len(), 3);

    let screens = canvas.screens();
    let group_id = screens[0].group_id.clone().unwrap();
    assert!(group_id.starts_with("flow-"));
    assert!(screens.iter().all(|s| s.group_id.as_deref() == Some(group_id.as_str())));
    assert!(screens.iter().all(|s| s.position.y == TOP_MARGIN));
    let pages: Vec<&str> = screens.iter().filter_map(|s| s.page_name.as_deref()).collect();
    assert_eq!(pages, vec!["Home", "Menu", "Contact"]);

    match canvas.selection() {
        Selection::Group(key) => assert_eq!(key.kind(), GroupKind::Flow),
        other => panic!("expected group selection, got {other:?}"),
    }
}

#[tokio::test]
async fn image_generation_gets_its_own_group() {
    let canvas = ready_canvas();
    let a = canvas.generate_from_image("Like this", "iVBORw0KGgo=").await.unwrap();
    let b = canvas.generate_from_image("Like this", "iVBORw0KGgo=").await.unwrap();

    let ga = canvas.screen(a).unwrap().group_id.unwrap();
    let gb = canvas.screen(b).unwrap().group_id.unwrap();
    assert!(ga.starts_with("IMAGE-"));
    assert_ne!(ga, gb);

    let screens = canvas.screens();
    let grouping = classify(&screens);
    assert_eq!(grouping.groups.len(), 2);
    assert!(grouping.groups.iter().all(|g| g.members.len() == 1));
}

#[tokio::test]
async fn failed_generation_leaves_model_untouched() {
    let canvas = ready_canvas();
    canvas.generate_single("Keep me").await.unwrap();
    canvas.backend().fail_generation.set(true);

    let err = canvas.generate_single("Never lands").await.unwrap_err();
    assert!(matches!(err, CanvasError::Request(_)));
    assert_eq!(canvas.screens().len(), 1);
    assert_eq!(canvas.activity().generating, 0);
}

#[tokio::test]
async fn regenerations_number_versions_without_gaps() {
    let canvas = ready_canvas();
    let base = canvas.generate_single("Home").await.unwrap();

    for i in 1..=4u32 {
        let target = EditTarget::new(base, "Home");
        let outcome = canvas.regenerate_section(&target, "warmer hero").await.unwrap();
        let id = outcome.applied().expect("applied");
        assert_eq!(canvas.screen(id).unwrap().title.to_string(), format!("Home (v{i})"));
        // Unrelated work in between must not disturb the numbering.
        canvas.generate_single(&format!("Unrelated {i}")).await.unwrap();
    }

    let screens = canvas.screens();
    let grouping = classify(&screens);
    let chain = grouping
        .group(&sc_core::GroupKey::Versions(base))
        .expect("version group");
    let ordinals: Vec<u32> = chain.members.iter().map(|s| s.title.ordinal()).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn concurrent_regenerations_get_distinct_versions() {
    let canvas = ready_canvas();
    let base = canvas.generate_single("Landing").await.unwrap();

    let (a, b) = tokio::join!(
        canvas.regenerate_design(base, "dark"),
        canvas.regenerate_design(base, "light"),
    );
    let mut titles = vec![
        canvas.screen(a.unwrap().applied().unwrap()).unwrap().title.to_string(),
        canvas.screen(b.unwrap().applied().unwrap()).unwrap().title.to_string(),
    ];
    titles.sort();
    assert_eq!(titles, vec!["Landing (v1)", "Landing (v2)"]);
}

#[tokio::test]
async fn new_version_inherits_lineage_and_row() {
    let canvas = ready_canvas();
    let ids = canvas
        .generate_flow("Shop", &names(&["Cart", "Checkout"]))
        .await
        .unwrap();
    let cart = canvas.screen(ids[0]).unwrap();

    let outcome = canvas.regenerate_design(cart.id, "minimal").await.unwrap();
    let version = canvas.screen(outcome.applied().unwrap()).unwrap();

    assert_eq!(version.group_id, cart.group_id);
    assert_eq!(version.page_name.as_deref(), Some("Cart"));
    assert_eq!(version.title.to_string(), "Cart (v1)");
    assert_eq!(version.position.y, cart.position.y);
    assert_eq!(version.content, format!("<div class=\"minimal\">{}</div>", cart.content));
    assert_eq!(canvas.selection(), Selection::Screen(version.id));
}

fn narrow(canvas: &sc_canvas::Canvas<MockBackend>, id: ScreenId) {
    let report = SizeReport {
        screen: id,
        size: Size::new(390.0, 900.0),
        kind: ReportKind::Settled,
    };
    assert!(canvas.report_size(&report, Instant::now()));
}

#[tokio::test]
async fn version_placement_follows_config() {
    // Latest: right of the most recently added screen, even when unrelated.
    let latest = ready_canvas();
    let base = latest.generate_single("Home").await.unwrap();
    let other = latest.generate_single("Blog").await.unwrap();
    narrow(&latest, other);
    let v = latest.regenerate_design(base, "x").await.unwrap().applied().unwrap();
    let placed = latest.screen(v).unwrap().position;
    assert_eq!(placed.x, LEFT_MARGIN + 390.0 + VERSION_SPACING);
    assert_eq!(placed.y, TOP_MARGIN);

    // Lineage: right of the source's own chain.
    let lineage = ready_canvas_with(CanvasConfig {
        version_placement: VersionPlacement::AfterLineage,
        ..CanvasConfig::default()
    });
    let base = lineage.generate_single("Home").await.unwrap();
    let other = lineage.generate_single("Blog").await.unwrap();
    narrow(&lineage, other);
    let v = lineage.regenerate_design(base, "x").await.unwrap().applied().unwrap();
    assert_eq!(lineage.screen(v).unwrap().position.x, LEFT_MARGIN + 1440.0 + VERSION_SPACING);
}

#[tokio::test]
async fn regeneration_of_deleted_screen_is_a_no_op() {
    let canvas = ready_canvas();
    let base = canvas.generate_single("Doomed").await.unwrap();

    let (outcome, deleted) = tokio::join!(canvas.regenerate_design(base, "bold"), async {
        tokio::task::yield_now().await;
        canvas.delete_screen(base)
    });

    assert_eq!(deleted.unwrap(), vec![base]);
    assert_eq!(outcome.unwrap(), EditOutcome::TargetGone);
    assert!(canvas.screens().is_empty());
}

#[tokio::test]
async fn regenerating_unknown_screen_fails_fast() {
    let canvas = ready_canvas();
    let err = canvas
        .regenerate_design(ScreenId::intern("never-existed"), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, CanvasError::UnknownScreen(_)));
    assert!(canvas.backend().calls.borrow().is_empty());
}

#[tokio::test]
async fn content_update_checks_fragment() {
    let canvas = ready_canvas();
    let id = canvas.generate_single("Menu").await.unwrap();
    let original = canvas.screen(id).unwrap().content;

    let outcome = canvas
        .update_content(id, "<h1>gone</h1>", "<main>replaced</main>".into())
        .unwrap();
    assert_eq!(outcome, EditOutcome::ContentMismatch);
    assert_eq!(canvas.screen(id).unwrap().content, original);

    let outcome = canvas
        .update_content(id, "Menu", "<main>Seasonal menu</main>".into())
        .unwrap();
    assert_eq!(outcome, EditOutcome::Applied(id));
    let after = canvas.screen(id).unwrap();
    assert_eq!(after.content, "<main>Seasonal menu</main>");
    assert_eq!(after.title.to_string(), "Menu");

    canvas.delete_screen(id).unwrap();
    let outcome = canvas.update_content(id, "", String::new()).unwrap();
    assert_eq!(outcome, EditOutcome::TargetGone);
}

#[tokio::test]
async fn text_assist_tracks_activity() {
    let canvas = ready_canvas();
    let (text, during) = tokio::join!(
        canvas.assist_text("Fresh bread every single morning", TextAction::Shorten),
        async {
            tokio::task::yield_now().await;
            canvas.activity()
        }
    );
    assert_eq!(text.unwrap(), "Fresh bread");
    assert_eq!(during.updating_content, 1);
    assert_eq!(canvas.activity().updating_content, 0);
}

#[tokio::test]
async fn version_switcher_walks_the_chain_and_stops_at_both_ends() {
    let canvas = ready_canvas();
    let home = canvas.generate_single("Home").await.unwrap();
    let v1 = canvas.regenerate_design(home, "a").await.unwrap().applied().unwrap();
    let v2 = canvas.regenerate_design(v1, "b").await.unwrap().applied().unwrap();
    canvas.generate_single("Blog").await.unwrap();

    assert_eq!(canvas.version_chain(v1).unwrap(), vec![home, v1, v2]);

    canvas.select_screen(home).unwrap();
    assert_eq!(canvas.select_adjacent_version(home, Step::Prev).unwrap(), None);
    assert_eq!(canvas.selection(), Selection::Screen(home));

    assert_eq!(canvas.select_adjacent_version(home, Step::Next).unwrap(), Some(v1));
    assert_eq!(canvas.selection(), Selection::Screen(v1));
    assert_eq!(canvas.select_adjacent_version(v1, Step::Next).unwrap(), Some(v2));
    assert_eq!(canvas.select_adjacent_version(v2, Step::Next).unwrap(), None);
    assert_eq!(canvas.selection(), Selection::Screen(v2));
    assert_eq!(canvas.select_adjacent_version(v2, Step::Prev).unwrap(), Some(v1));
}

#[tokio::test]
async fn version_switcher_keeps_the_flow_group_selected() {
    let canvas = ready_canvas();
    let ids = canvas
        .generate_flow("Shop", &names(&["Cart", "Checkout"]))
        .await
        .unwrap();
    let cart = ids[0];
    let cart_v1 = canvas.regenerate_design(cart, "bold").await.unwrap().applied().unwrap();
    let group = canvas.screen(cart).unwrap().group_id.unwrap();

    assert_eq!(canvas.version_chain(cart).unwrap(), vec![cart, cart_v1]);
    assert_eq!(canvas.version_chain(ids[1]).unwrap(), vec![ids[1]]);

    canvas.clear_selection();
    assert_eq!(canvas.select_adjacent_version(cart_v1, Step::Prev).unwrap(), Some(cart));
    assert_eq!(canvas.selection(), Selection::Group(GroupKey::Explicit(group)));
    assert_eq!(canvas.select_adjacent_version(ids[1], Step::Next).unwrap(), None);

    let gone = ScreenId::intern("no-such-screen");
    assert!(matches!(
        canvas.version_chain(gone),
        Err(CanvasError::UnknownScreen(id)) if id == gone
    ));
}

#[tokio::test]
async fn deleting_target_resets_interaction() {
    let canvas = ready_canvas();
    let id = canvas.generate_single("Editable").await.unwrap();
    canvas
        .begin_interaction(UiState::EditingContent(EditTarget::new(id, "Editable")))
        .unwrap();
    assert!(!canvas.ui().is_idle());

    canvas.delete_screen(id).unwrap();
    assert_eq!(canvas.ui(), UiState::Idle);
    assert_eq!(canvas.selection(), Selection::None);
}

#[tokio::test]
async fn suggestions_and_enhancement_pass_through() {
    let canvas = ready_canvas();
    let pages = canvas.suggest_flow_pages("Cafe").await.unwrap();
    assert_eq!(pages, vec!["Home", "Menu", "Contact"]);
    let prompt = canvas.enhance_prompt("Cafe").await.unwrap();
    assert_eq!(prompt, "Cafe, modern, accessible");
    assert!(canvas.screens().is_empty());
}

#[tokio::test]
async fn operations_require_an_open_project() {
    let canvas = sc_canvas::Canvas::new(MockBackend::default(), CanvasConfig::default());
    let err = canvas.generate_single("x").await.unwrap_err();
    assert!(matches!(err, CanvasError::NotReady(sc_canvas::Phase::Idle)));
}
