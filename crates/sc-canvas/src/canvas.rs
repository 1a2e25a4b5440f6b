//! Canvas orchestrator.
//!
//! `Canvas` owns the screen collection, reported sizes, selection and the
//! interaction state, and drives the backend. All operations take `&self`:
//! state lives in a `RefCell` and no borrow is ever held across an `.await`,
//! so on a single-threaded executor the user can keep deleting, moving and
//! selecting while a generation or save is outstanding.
//!
//! Results that arrive after their target disappeared are dropped
//! (`EditOutcome::TargetGone`), and results that arrive after a different
//! project was opened are rejected (`CanvasError::Superseded`).

use crate::backend::{Backend, ProjectId, TextAction};
use crate::config::CanvasConfig;
use crate::error::{CanvasError, EditOutcome};
use crate::ui::{EditTarget, Selection, Step, UiState};
use sc_core::persist::GroupNames;
use sc_core::{
    BoundsTracker, GroupKey, GroupKind, Placement, Point, Rect, Reflow, Screen, ScreenId,
    SizeReport, SizeTable, Title, WireProject, classify, deserialize, group_bounds, lineage,
    next_version, place, serialize,
};
use std::cell::RefCell;
use std::fmt;
use std::time::Instant;

/// Longest title derived from a prompt.
const MAX_PROMPT_TITLE: usize = 40;

/// Lifecycle of the loaded project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    LoadFailed(String),
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::Loading => f.write_str("loading"),
            Phase::Ready => f.write_str("ready"),
            Phase::LoadFailed(_) => f.write_str("load failed"),
        }
    }
}

/// Requests currently in flight, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub generating: u32,
    pub saving: bool,
    pub updating_content: u32,
}

impl Activity {
    pub fn is_busy(&self) -> bool {
        self.generating > 0 || self.saving || self.updating_content > 0
    }
}

#[derive(Debug, Clone, Copy)]
enum ActivityKind {
    Generating,
    Saving,
    UpdatingContent,
}

struct State {
    phase: Phase,
    project: Option<ProjectId>,
    /// Bumped whenever the model is replaced wholesale.
    epoch: u64,
    screens: Vec<Screen>,
    sizes: SizeTable,
    group_names: GroupNames,
    selection: Selection,
    ui: UiState,
    tracker: BoundsTracker,
    activity: Activity,
}

pub struct Canvas<B: Backend> {
    backend: B,
    config: CanvasConfig,
    state: RefCell<State>,
}

/// Marks an activity for as long as it lives. Dropping the future of an
/// operation mid-request releases it too.
struct ActivityGuard<'a> {
    state: &'a RefCell<State>,
    kind: ActivityKind,
}

impl<'a> ActivityGuard<'a> {
    fn enter(state: &'a RefCell<State>, kind: ActivityKind) -> Self {
        let mut st = state.borrow_mut();
        match kind {
            ActivityKind::Generating => st.activity.generating += 1,
            ActivityKind::Saving => st.activity.saving = true,
            ActivityKind::UpdatingContent => st.activity.updating_content += 1,
        }
        Self { state, kind }
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.state.borrow_mut();
        match self.kind {
            ActivityKind::Generating => st.activity.generating -= 1,
            ActivityKind::Saving => st.activity.saving = false,
            ActivityKind::UpdatingContent => st.activity.updating_content -= 1,
        }
    }
}

impl<B: Backend> Canvas<B> {
    pub fn new(backend: B, config: CanvasConfig) -> Self {
        let tracker = BoundsTracker::new(config.reflow_window());
        Self {
            backend,
            config,
            state: RefCell::new(State {
                phase: Phase::Idle,
                project: None,
                epoch: 0,
                screens: Vec::new(),
                sizes: SizeTable::default(),
                group_names: GroupNames::new(),
                selection: Selection::None,
                ui: UiState::Idle,
                tracker,
                activity: Activity::default(),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // ─── Project lifecycle ───────────────────────────────────────────────

    /// Start an empty project.
    pub fn open_blank(&self, project: ProjectId) {
        let mut st = self.state.borrow_mut();
        st.replace_model(Vec::new(), SizeTable::default(), GroupNames::new());
        st.project = Some(project);
        st.phase = Phase::Ready;
        log::info!("opened blank project {project}");
    }

    /// Fetch and restore a saved project. The previous model is discarded
    /// immediately; on failure the canvas stays empty in `LoadFailed`.
    pub async fn load(&self, project: ProjectId) -> Result<(), CanvasError> {
        let epoch = {
            let mut st = self.state.borrow_mut();
            if st.phase == Phase::Loading {
                return Err(CanvasError::NotReady(Phase::Loading));
            }
            st.replace_model(Vec::new(), SizeTable::default(), GroupNames::new());
            st.project = Some(project);
            st.phase = Phase::Loading;
            st.epoch
        };
        log::debug!("loading project {project}");

        let result = self.backend.load_project(project).await;

        let mut st = self.state.borrow_mut();
        if st.epoch != epoch {
            log::debug!("load of project {project} superseded");
            return Err(CanvasError::Superseded);
        }
        match result {
            Ok(wire) => {
                let restored = deserialize(&wire);
                log::info!(
                    "loaded project {project}: {} screens in {} groups",
                    restored.screens.len(),
                    wire.groups.len()
                );
                st.replace_model(restored.screens, restored.sizes, restored.group_names);
                st.phase = Phase::Ready;
                Ok(())
            }
            Err(err) => {
                log::warn!("loading project {project} failed: {err}");
                let err = CanvasError::from(err);
                st.phase = Phase::LoadFailed(err.user_message());
                Err(err)
            }
        }
    }

    /// Persist the current model. A second call while one is outstanding is
    /// rejected with `AlreadySaving`.
    pub async fn save(&self) -> Result<(), CanvasError> {
        let (project, wire) = {
            let st = self.state.borrow();
            st.ensure_ready()?;
            if st.activity.saving {
                return Err(CanvasError::AlreadySaving);
            }
            let Some(project) = st.project else {
                return Err(CanvasError::NotReady(st.phase.clone()));
            };
            (project, serialize(&st.screens, &st.sizes, &st.group_names))
        };
        let _saving = ActivityGuard::enter(&self.state, ActivityKind::Saving);
        log::debug!(
            "saving project {project}: {} groups, {} versions",
            wire.groups.len(),
            wire.version_count()
        );
        self.backend.save_project(project, &wire).await.map_err(|err| {
            log::warn!("saving project {project} failed: {err}");
            CanvasError::from(err)
        })
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase.clone()
    }

    pub fn project(&self) -> Option<ProjectId> {
        self.state.borrow().project
    }

    pub fn activity(&self) -> Activity {
        self.state.borrow().activity
    }

    // ─── Generation ──────────────────────────────────────────────────────

    /// Generate one screen below everything else and select it.
    pub async fn generate_single(&self, prompt: &str) -> Result<ScreenId, CanvasError> {
        let epoch = self.begin_request()?;
        let _busy = ActivityGuard::enter(&self.state, ActivityKind::Generating);

        let html = self.backend.generate_single(prompt).await?;

        let screen = Screen::new(ScreenId::generate(), title_from_prompt(prompt), html);
        let id = screen.id;
        self.insert_fresh(epoch, Placement::Single(screen))?;
        Ok(id)
    }

    /// Generate one screen per page name as a new flow. The backend must
    /// answer with exactly one page per name; otherwise nothing is added.
    pub async fn generate_flow(
        &self,
        prompt: &str,
        pages: &[String],
    ) -> Result<Vec<ScreenId>, CanvasError> {
        let epoch = self.begin_request()?;
        if pages.is_empty() {
            log::debug!("flow generation with no pages");
            return Ok(Vec::new());
        }
        let _busy = ActivityGuard::enter(&self.state, ActivityKind::Generating);

        let html_pages = self.backend.generate_multiple(prompt, pages).await?;
        if html_pages.len() != pages.len() {
            log::warn!(
                "flow generation returned {} pages for {} names",
                html_pages.len(),
                pages.len()
            );
            return Err(CanvasError::PageCountMismatch {
                expected: pages.len(),
                received: html_pages.len(),
            });
        }

        let key = GroupKey::new_flow();
        let group_id = key.to_string();
        let screens = pages
            .iter()
            .zip(html_pages)
            .map(|(name, html)| {
                Screen::new(ScreenId::generate(), Title::parse(name.trim()), html)
                    .in_group(group_id.clone())
                    .page(name.trim())
            })
            .collect();
        let ids = self.insert_fresh(epoch, Placement::Flow(screens))?;
        self.state.borrow_mut().selection = Selection::Group(key);
        Ok(ids)
    }

    /// Generate one screen from a reference image, in its own image group.
    pub async fn generate_from_image(
        &self,
        prompt: &str,
        image_base64: &str,
    ) -> Result<ScreenId, CanvasError> {
        let epoch = self.begin_request()?;
        let _busy = ActivityGuard::enter(&self.state, ActivityKind::Generating);

        let html = self.backend.generate_from_image(prompt, image_base64).await?;

        let key = GroupKey::new_image();
        let screen = Screen::new(ScreenId::generate(), title_from_prompt(prompt), html)
            .in_group(key.to_string());
        let id = screen.id;
        self.insert_fresh(epoch, Placement::Single(screen))?;
        Ok(id)
    }

    /// Page names suggested for a flow prompt. Nothing is created.
    pub async fn suggest_flow_pages(&self, prompt: &str) -> Result<Vec<String>, CanvasError> {
        let names = self.backend.generate_flow_page_names(prompt).await?;
        Ok(names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect())
    }

    pub async fn enhance_prompt(&self, prompt: &str) -> Result<String, CanvasError> {
        Ok(self.backend.enhance_prompt(prompt).await?)
    }

    // ─── Regeneration and edits ──────────────────────────────────────────

    /// Regenerate `target.fragment` of a screen as a new version of it.
    pub async fn regenerate_section(
        &self,
        target: &EditTarget,
        prompt: &str,
    ) -> Result<EditOutcome, CanvasError> {
        let (epoch, full_html) = self.begin_edit(target.screen)?;
        let _busy = ActivityGuard::enter(&self.state, ActivityKind::Generating);

        let html = self
            .backend
            .regenerate_section(&full_html, &target.fragment, prompt)
            .await?;

        self.insert_version(epoch, target.screen, html)
    }

    /// Restyle a whole screen as a new version of it.
    pub async fn regenerate_design(
        &self,
        source: ScreenId,
        prompt: &str,
    ) -> Result<EditOutcome, CanvasError> {
        let (epoch, full_html) = self.begin_edit(source)?;
        let _busy = ActivityGuard::enter(&self.state, ActivityKind::Generating);

        let html = self.backend.regenerate_design(prompt, &full_html).await?;

        self.insert_version(epoch, source, html)
    }

    /// Rewrite a text fragment. The caller substitutes the result into the
    /// page and commits it with `update_content`.
    pub async fn assist_text(&self, text: &str, action: TextAction) -> Result<String, CanvasError> {
        self.state.borrow().ensure_ready()?;
        let _busy = ActivityGuard::enter(&self.state, ActivityKind::UpdatingContent);
        log::debug!("text assist: {action}");
        Ok(self.backend.process_text(text, action).await?)
    }

    /// Replace a screen's content in place. `expected_fragment` must still be
    /// present in the current content, otherwise nothing changes.
    pub fn update_content(
        &self,
        id: ScreenId,
        expected_fragment: &str,
        new_content: String,
    ) -> Result<EditOutcome, CanvasError> {
        let mut st = self.state.borrow_mut();
        st.ensure_ready()?;
        let Some(screen) = st.screens.iter_mut().find(|s| s.id == id) else {
            log::debug!("content update for deleted screen {id} dropped");
            return Ok(EditOutcome::TargetGone);
        };
        if !screen.content.contains(expected_fragment) {
            log::warn!("content update for {id}: fragment no longer present");
            return Ok(EditOutcome::ContentMismatch);
        }
        screen.content = new_content;
        if st.ui.targets(id) {
            st.ui = UiState::Idle;
        }
        Ok(EditOutcome::Applied(id))
    }

    // ─── Deletion ────────────────────────────────────────────────────────

    /// Delete a screen. An ungrouped original takes its whole version chain
    /// with it. Returns the removed ids.
    pub fn delete_screen(&self, id: ScreenId) -> Result<Vec<ScreenId>, CanvasError> {
        let mut st = self.state.borrow_mut();
        let Some(screen) = st.screens.iter().find(|s| s.id == id) else {
            return Err(CanvasError::UnknownScreen(id));
        };
        let doomed: Vec<ScreenId> = if screen.is_inference_base() {
            let grouping = classify(&st.screens);
            match grouping.group(&GroupKey::Versions(id)) {
                Some(group) => group.members.iter().map(|s| s.id).collect(),
                None => vec![id],
            }
        } else {
            vec![id]
        };
        st.remove_screens(&doomed);
        Ok(doomed)
    }

    /// Delete every member of a group.
    pub fn delete_group(&self, key: &GroupKey) -> Result<Vec<ScreenId>, CanvasError> {
        let mut st = self.state.borrow_mut();
        let doomed: Vec<ScreenId> = {
            let grouping = classify(&st.screens);
            let group = grouping
                .group(key)
                .ok_or_else(|| CanvasError::UnknownGroup(key.to_string()))?;
            group.members.iter().map(|s| s.id).collect()
        };
        st.group_names.remove(&key.to_string());
        st.remove_screens(&doomed);
        Ok(doomed)
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    pub fn move_screen(&self, id: ScreenId, to: Point) -> Result<(), CanvasError> {
        let mut st = self.state.borrow_mut();
        let screen = st
            .screens
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(CanvasError::UnknownScreen(id))?;
        screen.position = to;
        st.tracker.invalidate(Instant::now());
        Ok(())
    }

    /// Translate every member of a group.
    pub fn move_group(&self, key: &GroupKey, dx: f32, dy: f32) -> Result<(), CanvasError> {
        let mut st = self.state.borrow_mut();
        let members: Vec<ScreenId> = classify(&st.screens)
            .group(key)
            .ok_or_else(|| CanvasError::UnknownGroup(key.to_string()))?
            .members
            .iter()
            .map(|s| s.id)
            .collect();
        for screen in st.screens.iter_mut().filter(|s| members.contains(&s.id)) {
            screen.position.x += dx;
            screen.position.y += dy;
        }
        st.tracker.invalidate(Instant::now());
        Ok(())
    }

    /// Set a user-visible group name. An empty name restores the default.
    pub fn rename_group(&self, key: &GroupKey, name: &str) -> Result<(), CanvasError> {
        let mut st = self.state.borrow_mut();
        if !st.has_group(key) {
            return Err(CanvasError::UnknownGroup(key.to_string()));
        }
        let name = name.trim();
        if name.is_empty() || name == key.kind().default_name() {
            st.group_names.remove(&key.to_string());
        } else {
            st.group_names.insert(key.to_string(), name.to_string());
        }
        Ok(())
    }

    pub fn group_name(&self, key: &GroupKey) -> String {
        self.state
            .borrow()
            .group_names
            .get(&key.to_string())
            .cloned()
            .unwrap_or_else(|| key.kind().default_name().to_string())
    }

    /// A frame reported its rendered size. Reports for unknown screens
    /// (deleted while rendering) are ignored.
    pub fn report_size(&self, report: &SizeReport, now: Instant) -> bool {
        let mut st = self.state.borrow_mut();
        if !st.screens.iter().any(|s| s.id == report.screen) {
            log::trace!("size report for unknown screen {}", report.screen);
            return false;
        }
        let changed = st.sizes.report(report.screen, report.size);
        if changed {
            st.tracker.invalidate(now);
        }
        changed
    }

    /// Run the debounced bounds recompute if its window elapsed.
    pub fn poll_reflow(&self, now: Instant) -> Option<Reflow> {
        let mut st = self.state.borrow_mut();
        let State {
            tracker,
            screens,
            sizes,
            ..
        } = &mut *st;
        tracker.poll(now, screens, sizes)
    }

    /// Recompute group bounds now, regardless of the debounce window.
    pub fn flush_reflow(&self) -> Reflow {
        let mut st = self.state.borrow_mut();
        let State {
            tracker,
            screens,
            sizes,
            ..
        } = &mut *st;
        tracker.flush(screens, sizes)
    }

    /// Sleep until the pending recompute is due, then run it. Returns `None`
    /// when nothing is pending.
    pub async fn settle_reflow(&self) -> Option<Reflow> {
        let deadline = self.state.borrow().tracker.deadline()?;
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.poll_reflow(Instant::now().max(deadline))
    }

    pub fn reflow_deadline(&self) -> Option<Instant> {
        self.state.borrow().tracker.deadline()
    }

    /// Padded rectangle of every group, in classification order.
    pub fn group_bounds(&self) -> Vec<(GroupKey, Rect)> {
        let st = self.state.borrow();
        group_bounds(&classify(&st.screens), &st.sizes)
    }

    // ─── Selection and interaction ───────────────────────────────────────

    pub fn select_screen(&self, id: ScreenId) -> Result<(), CanvasError> {
        let mut st = self.state.borrow_mut();
        if !st.screens.iter().any(|s| s.id == id) {
            return Err(CanvasError::UnknownScreen(id));
        }
        st.selection = Selection::Screen(id);
        Ok(())
    }

    pub fn select_group(&self, key: &GroupKey) -> Result<(), CanvasError> {
        let mut st = self.state.borrow_mut();
        if !st.has_group(key) {
            return Err(CanvasError::UnknownGroup(key.to_string()));
        }
        st.selection = Selection::Group(key.clone());
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.state.borrow_mut().selection = Selection::None;
    }

    pub fn selection(&self) -> Selection {
        self.state.borrow().selection.clone()
    }

    /// Ids in `id`'s version chain, ascending by version.
    pub fn version_chain(&self, id: ScreenId) -> Result<Vec<ScreenId>, CanvasError> {
        let st = self.state.borrow();
        let source = st
            .screens
            .iter()
            .find(|s| s.id == id)
            .ok_or(CanvasError::UnknownScreen(id))?;
        let mut chain = lineage(&st.screens, source);
        chain.sort_by_key(|s| s.title.ordinal());
        Ok(chain.into_iter().map(|s| s.id).collect())
    }

    /// Select the version one `step` away from `id` in its chain.
    ///
    /// Returns `None` at either end of the chain and leaves the selection
    /// alone. A chain inside an explicit group keeps that group selected;
    /// otherwise the neighbouring screen becomes the selection.
    pub fn select_adjacent_version(
        &self,
        id: ScreenId,
        step: Step,
    ) -> Result<Option<ScreenId>, CanvasError> {
        let chain = self.version_chain(id)?;
        let at = chain.iter().position(|&c| c == id);
        let neighbour = match step {
            Step::Prev => at.and_then(|i| i.checked_sub(1)),
            Step::Next => at.map(|i| i + 1),
        };
        let Some(&target) = neighbour.and_then(|i| chain.get(i)) else {
            return Ok(None);
        };

        let mut st = self.state.borrow_mut();
        let group = st
            .screens
            .iter()
            .find(|s| s.id == target)
            .and_then(|s| s.group_id.clone());
        st.selection = match group {
            Some(group) => Selection::Group(GroupKey::Explicit(group)),
            None => Selection::Screen(target),
        };
        log::debug!("switched version {id} -> {target}");
        Ok(Some(target))
    }

    /// Open an interaction dialog. Replaces whatever was open.
    pub fn begin_interaction(&self, ui: UiState) -> Result<(), CanvasError> {
        let mut st = self.state.borrow_mut();
        if let Some(target) = ui.target() {
            if !st.screens.iter().any(|s| s.id == target.screen) {
                return Err(CanvasError::UnknownScreen(target.screen));
            }
        }
        st.ui = ui;
        Ok(())
    }

    pub fn end_interaction(&self) {
        self.state.borrow_mut().ui = UiState::Idle;
    }

    pub fn ui(&self) -> UiState {
        self.state.borrow().ui.clone()
    }

    // ─── Model access ────────────────────────────────────────────────────

    pub fn screens(&self) -> Vec<Screen> {
        self.state.borrow().screens.clone()
    }

    pub fn screen(&self, id: ScreenId) -> Option<Screen> {
        self.state.borrow().screens.iter().find(|s| s.id == id).cloned()
    }

    /// Run `f` against the current screens and sizes without cloning.
    pub fn with_model<R>(&self, f: impl FnOnce(&[Screen], &SizeTable) -> R) -> R {
        let st = self.state.borrow();
        f(&st.screens, &st.sizes)
    }

    /// The model as it would be saved.
    pub fn to_wire(&self) -> WireProject {
        let st = self.state.borrow();
        serialize(&st.screens, &st.sizes, &st.group_names)
    }

    // ─── Drafts ──────────────────────────────────────────────────────────

    /// Compact local snapshot of the current model.
    pub fn draft_snapshot(&self) -> Result<Vec<u8>, CanvasError> {
        Ok(self.to_wire().to_msgpack()?)
    }

    /// Replace the model with a local snapshot. The project id is kept.
    pub fn restore_draft(&self, bytes: &[u8]) -> Result<(), CanvasError> {
        let wire = WireProject::from_msgpack(bytes)?;
        let restored = deserialize(&wire);
        let mut st = self.state.borrow_mut();
        if st.phase == Phase::Loading {
            return Err(CanvasError::NotReady(Phase::Loading));
        }
        log::info!("restored draft with {} screens", restored.screens.len());
        st.replace_model(restored.screens, restored.sizes, restored.group_names);
        st.phase = Phase::Ready;
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn begin_request(&self) -> Result<u64, CanvasError> {
        let st = self.state.borrow();
        st.ensure_ready()?;
        Ok(st.epoch)
    }

    /// Check the source exists and snapshot its content for the request.
    fn begin_edit(&self, source: ScreenId) -> Result<(u64, String), CanvasError> {
        let st = self.state.borrow();
        st.ensure_ready()?;
        let screen = st
            .screens
            .iter()
            .find(|s| s.id == source)
            .ok_or(CanvasError::UnknownScreen(source))?;
        Ok((st.epoch, screen.content.clone()))
    }

    /// Place freshly generated screens, append them and select the first.
    fn insert_fresh(&self, epoch: u64, request: Placement) -> Result<Vec<ScreenId>, CanvasError> {
        let mut st = self.state.borrow_mut();
        if st.epoch != epoch {
            log::debug!("generation result for a replaced project dropped");
            return Err(CanvasError::Superseded);
        }
        let placed = place(&st.screens, &st.sizes, request);
        let ids: Vec<ScreenId> = placed.iter().map(|s| s.id).collect();
        log::debug!("placed {} new screens", placed.len());
        st.screens.extend(placed);
        if let Some(first) = ids.first() {
            st.selection = Selection::Screen(*first);
        }
        st.tracker.invalidate(Instant::now());
        Ok(ids)
    }

    /// Append `html` as the next version of `source`, numbered from the
    /// lineage as it is now.
    fn insert_version(
        &self,
        epoch: u64,
        source: ScreenId,
        html: String,
    ) -> Result<EditOutcome, CanvasError> {
        let mut st = self.state.borrow_mut();
        if st.epoch != epoch {
            return Err(CanvasError::Superseded);
        }
        let Some(src) = st.screens.iter().find(|s| s.id == source) else {
            log::debug!("regeneration result for deleted screen {source} dropped");
            return Ok(EditOutcome::TargetGone);
        };

        let n = next_version(&st.screens, src);
        let size = src.effective_size(&st.sizes);
        let mut screen = Screen::new(ScreenId::generate(), src.title.with_version(n), html);
        screen.declared_size = Some(size);
        screen.group_id = src.group_id.clone();
        screen.page_name = src.page_name.clone();

        let request = Placement::Version {
            source,
            screen,
            anchor: self.config.version_placement.anchor(),
        };
        let placed = place(&st.screens, &st.sizes, request);
        let Some(id) = placed.first().map(|s| s.id) else {
            return Ok(EditOutcome::TargetGone);
        };
        log::debug!("{source} regenerated as version {n} ({id})");
        st.screens.extend(placed);
        st.selection = Selection::Screen(id);
        if st.ui.targets(source) {
            st.ui = UiState::Idle;
        }
        st.tracker.invalidate(Instant::now());
        Ok(EditOutcome::Applied(id))
    }
}

impl State {
    fn ensure_ready(&self) -> Result<(), CanvasError> {
        match self.phase {
            Phase::Ready => Ok(()),
            ref other => Err(CanvasError::NotReady(other.clone())),
        }
    }

    fn replace_model(&mut self, screens: Vec<Screen>, sizes: SizeTable, names: GroupNames) {
        self.epoch += 1;
        self.screens = screens;
        self.sizes = sizes;
        self.group_names = names;
        self.selection = Selection::None;
        self.ui = UiState::Idle;
        self.tracker.reset();
    }

    fn has_group(&self, key: &GroupKey) -> bool {
        if key.kind() == GroupKind::Single {
            let id = key
                .explicit_id()
                .and_then(|k| k.strip_prefix("single-"))
                .unwrap_or_default();
            return self.screens.iter().any(|s| s.id.as_str() == id);
        }
        classify(&self.screens).group(key).is_some()
    }

    fn remove_screens(&mut self, doomed: &[ScreenId]) {
        self.screens.retain(|s| !doomed.contains(&s.id));
        self.sizes.retain(|id| !doomed.contains(&id));

        let selection_gone = match &self.selection {
            Selection::Screen(id) => doomed.contains(id),
            Selection::Group(key) => !self.has_group(key),
            Selection::None => false,
        };
        if selection_gone {
            self.selection = Selection::None;
        }
        if self.ui.target().is_some_and(|t| doomed.contains(&t.screen)) {
            self.ui = UiState::Idle;
        }
        log::debug!("removed {} screens", doomed.len());
        self.tracker.invalidate(Instant::now());
    }
}

/// Screen title for a prompt-driven generation. A trailing `" (vN)"` in the
/// prompt is read as a version number like any other title.
pub fn title_from_prompt(prompt: &str) -> Title {
    let line = prompt.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let title: String = line.chars().take(MAX_PROMPT_TITLE).collect();
    let title = title.trim_end();
    if title.is_empty() {
        Title::new("Untitled")
    } else {
        Title::parse(title)
    }
}
