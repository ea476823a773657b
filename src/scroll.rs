//! Keeping the two document views in lock-step.
//!
//! Each view reports its top line when it scrolls. [`ScrollSync`] maps that
//! line into the partner document and asks the partner to scroll there. The
//! partner's own scroll handler may fire synchronously as a side effect; an
//! explicit guard state makes that echo a no-op, so propagation is a single
//! hop and never bounces back.
//!
//! Deliberate navigation ("jump to hunk") scrolls both views at once and uses
//! its own alignment, centered by default, to tell it apart from passive
//! following.

use crate::hunk::DiffResult;
use crate::line_map::{LineMapCache, LineMaps};
use crate::settings::SyncSettings;
use serde::Deserialize;
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, trace};

/// Where a requested line should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Top,
    Center,
    Nearest,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Nearest => "nearest",
        }
    }
}

/// The two views: left shows document A, right shows document B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Left,
    Right,
}

impl Pane {
    #[inline]
    pub fn partner(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// A view scrolled; `top_line` is the 0-based first visible line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    pub top_line: usize,
}

/// The capability the coordinator needs from a view.
pub trait ScrollView {
    type Error;

    /// Scrolls so that 0-based `line` lands at `align`.
    fn scroll_to_line(&self, line: usize, align: Align) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// A scroll request issued by the coordinator is in flight; scroll events
    /// arriving now are its echo and are ignored.
    Forwarding,
}

/// Where a hunk jump sends each view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTarget {
    pub hunk: usize,
    pub a_line: usize,
    pub b_line: usize,
}

pub struct ScrollSync<V> {
    left: V,
    right: V,
    settings: SyncSettings,
    cache: LineMapCache,
    maps: Arc<LineMaps>,
    /// First changed A line (0-based) of each hunk, in diff order.
    hunk_lines: Vec<usize>,
    linked: Cell<bool>,
    state: Cell<SyncState>,
    current_hunk: Cell<usize>,
}

impl<V: ScrollView> ScrollSync<V> {
    pub fn new(left: V, right: V, settings: SyncSettings) -> Self {
        let mut cache = LineMapCache::new();
        let maps = cache.get_or_build(None, 0, 0);
        Self {
            left,
            right,
            settings,
            cache,
            maps,
            hunk_lines: Vec::new(),
            linked: Cell::new(settings.link_scroll),
            state: Cell::new(SyncState::Idle),
            current_hunk: Cell::new(0),
        }
    }

    /// Installs a new diff (or none) and the current document lengths.
    /// Resets the hunk cursor to the first hunk.
    pub fn set_diff(&mut self, diff: Option<&DiffResult>, a_total: usize, b_total: usize) {
        self.maps = self.cache.get_or_build(diff, a_total, b_total);
        self.hunk_lines = diff
            .map(|d| d.hunks.iter().map(|h| h.a_start.saturating_sub(1)).collect())
            .unwrap_or_default();
        self.current_hunk.set(0);
    }

    pub fn maps(&self) -> &LineMaps {
        &self.maps
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    pub fn is_linked(&self) -> bool {
        self.linked.get()
    }

    pub fn set_linked(&self, linked: bool) {
        self.linked.set(linked);
    }

    /// Flips linking and returns the new value.
    pub fn toggle_linked(&self) -> bool {
        let linked = !self.linked.get();
        self.linked.set(linked);
        linked
    }

    pub fn current_hunk(&self) -> usize {
        self.current_hunk.get()
    }

    pub fn hunk_count(&self) -> usize {
        self.hunk_lines.len()
    }

    fn view(&self, pane: Pane) -> &V {
        match pane {
            Pane::Left => &self.left,
            Pane::Right => &self.right,
        }
    }

    /// Runs `scroll` with the guard held. The guard is released before any
    /// error is returned.
    fn guarded(&self, scroll: impl FnOnce() -> Result<(), V::Error>) -> Result<(), V::Error> {
        self.state.set(SyncState::Forwarding);
        let result = scroll();
        self.state.set(SyncState::Idle);
        result
    }

    pub fn on_left_scroll(&self, event: ScrollEvent) -> Result<bool, V::Error> {
        self.on_scroll(Pane::Left, event)
    }

    pub fn on_right_scroll(&self, event: ScrollEvent) -> Result<bool, V::Error> {
        self.on_scroll(Pane::Right, event)
    }

    /// Handles a scroll of `pane`. Returns whether the partner was scrolled.
    pub fn on_scroll(&self, pane: Pane, event: ScrollEvent) -> Result<bool, V::Error> {
        if !self.linked.get() {
            return Ok(false);
        }
        if self.state.get() == SyncState::Forwarding {
            trace!(?pane, top_line = event.top_line, "ignoring echoed scroll");
            return Ok(false);
        }
        // Until set_diff installs document lengths there is no line to map to.
        if self.maps.a_total() == 0 || self.maps.b_total() == 0 {
            trace!(?pane, top_line = event.top_line, "no documents installed");
            return Ok(false);
        }

        let target = match pane {
            Pane::Left => self.maps.a_to_b(event.top_line),
            Pane::Right => self.maps.b_to_a(event.top_line),
        };
        let partner = pane.partner();
        debug!(?pane, top_line = event.top_line, ?partner, target, "following scroll");

        let align = self.settings.follow_align;
        self.guarded(|| self.view(partner).scroll_to_line(target, align))?;
        Ok(true)
    }

    /// Where a jump to hunk `index` would send both views.
    pub fn navigation_target(&self, index: usize) -> Option<NavigationTarget> {
        let a_line = *self.hunk_lines.get(index)?;
        Some(NavigationTarget {
            hunk: index,
            a_line,
            b_line: self.maps.a_to_b(a_line),
        })
    }

    /// Centers both views on hunk `index` and makes it the current hunk.
    /// Does nothing for an index past the last hunk.
    pub fn jump_to_hunk(&self, index: usize) -> Result<Option<NavigationTarget>, V::Error> {
        let Some(target) = self.navigation_target(index) else {
            return Ok(None);
        };
        debug!(?target, "jumping to hunk");

        let align = self.settings.navigate_align;
        self.guarded(|| {
            self.left.scroll_to_line(target.a_line, align)?;
            self.right.scroll_to_line(target.b_line, align)
        })?;
        self.current_hunk.set(index);
        Ok(Some(target))
    }

    /// Jumps to the hunk after the current one, staying on the last hunk.
    pub fn next_hunk(&self) -> Result<Option<NavigationTarget>, V::Error> {
        let last = self.hunk_count().saturating_sub(1);
        self.jump_to_hunk((self.current_hunk.get() + 1).min(last))
    }

    /// Jumps to the hunk before the current one, staying on the first hunk.
    pub fn prev_hunk(&self) -> Result<Option<NavigationTarget>, V::Error> {
        self.jump_to_hunk(self.current_hunk.get().saturating_sub(1))
    }
}
