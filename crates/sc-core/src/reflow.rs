//! Debounced recomputation of group bounds.
//!
//! Frames report sizes in bursts (one per animation frame while content
//! reflows). Every position or size change calls `BoundsTracker::invalidate`;
//! the actual recompute happens once per burst, when `poll` is called after
//! the debounce window elapsed. Time is passed in explicitly so the host
//! decides how to wait (`deadline()` is suitable for `tokio::time::sleep_until`).

use crate::bounds::{BOUNDS_EPSILON, group_bounds};
use crate::classify::classify;
use crate::model::{GroupKey, Rect, Screen};
use crate::sizes::SizeTable;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default coalescing window.
pub const REFLOW_WINDOW: Duration = Duration::from_millis(100);

// ─── Debouncer ───────────────────────────────────────────────────────────

/// Pending-token state machine: a new trigger replaces the pending one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    token: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            token: 0,
        }
    }

    /// Schedule (or reschedule) the pending task. Returns the new token.
    pub fn trigger(&mut self, now: Instant) -> u64 {
        self.token += 1;
        self.deadline = Some(now + self.window);
        self.token
    }

    /// Consume the pending task if its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Token of the most recent trigger.
    pub fn token(&self) -> u64 {
        self.token
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(REFLOW_WINDOW)
    }
}

// ─── Tracker ─────────────────────────────────────────────────────────────

/// Result of one coalesced recompute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reflow {
    /// Groups whose rectangle moved by at least the epsilon (or are new).
    pub changed: Vec<(GroupKey, Rect)>,
    /// Groups that no longer exist.
    pub removed: Vec<GroupKey>,
}

impl Reflow {
    /// Nothing to re-render.
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Holds the rendered group rectangles and schedules their recomputation.
#[derive(Debug, Clone, Default)]
pub struct BoundsTracker {
    debouncer: Debouncer,
    rendered: HashMap<GroupKey, Rect>,
    recomputes: u64,
}

impl BoundsTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(window),
            rendered: HashMap::new(),
            recomputes: 0,
        }
    }

    /// Positions or sizes changed; schedule a recompute.
    pub fn invalidate(&mut self, now: Instant) {
        self.debouncer.trigger(now);
    }

    /// Recompute if the debounce window elapsed. Returns `None` when no
    /// recompute ran.
    pub fn poll(&mut self, now: Instant, screens: &[Screen], sizes: &SizeTable) -> Option<Reflow> {
        if !self.debouncer.fire(now) {
            return None;
        }
        Some(self.recompute(screens, sizes))
    }

    /// Recompute immediately, bypassing the debounce window.
    pub fn flush(&mut self, screens: &[Screen], sizes: &SizeTable) -> Reflow {
        self.debouncer.cancel();
        self.recompute(screens, sizes)
    }

    fn recompute(&mut self, screens: &[Screen], sizes: &SizeTable) -> Reflow {
        self.recomputes += 1;
        let grouping = classify(screens);
        let fresh = group_bounds(&grouping, sizes);

        let mut reflow = Reflow::default();
        let mut next = HashMap::with_capacity(fresh.len());
        for (key, rect) in fresh {
            if rect.is_empty() {
                continue;
            }
            match self.rendered.get(&key) {
                Some(old) if old.approx_eq(&rect, BOUNDS_EPSILON) => {
                    next.insert(key, *old);
                }
                _ => {
                    reflow.changed.push((key.clone(), rect));
                    next.insert(key, rect);
                }
            }
        }
        reflow.removed = self
            .rendered
            .keys()
            .filter(|k| !next.contains_key(*k))
            .cloned()
            .collect();
        self.rendered = next;

        log::debug!(
            "reflow #{}: {} changed, {} removed",
            self.recomputes,
            reflow.changed.len(),
            reflow.removed.len()
        );
        reflow
    }

    /// Last rendered rectangle of a group.
    pub fn rendered(&self, key: &GroupKey) -> Option<Rect> {
        self.rendered.get(key).copied()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Number of recomputes performed so far.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    /// Forget everything (new project loaded).
    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.rendered.clear();
    }
}
