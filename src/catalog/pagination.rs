use super::{apply_filters, AssetRecord, FilterState};
use std::time::{Duration, Instant};

pub const DEFAULT_BATCH_SIZE: usize = 24;
pub const DEFAULT_REVEAL_COOLDOWN: Duration = Duration::from_millis(250);

/// Growing prefix of a result list.
#[derive(Debug, Clone)]
pub struct RevealWindow {
    batch_size: usize,
    revealed: usize,
    cooldown: Duration,
    last_advance: Option<Instant>,
}

impl RevealWindow {
    pub fn new(batch_size: usize, cooldown: Duration) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            batch_size,
            revealed: batch_size,
            cooldown,
            last_advance: None,
        }
    }

    pub fn visible(&self, total: usize) -> usize {
        self.revealed.min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.revealed < total
    }

    /// Handles one visibility signal. Returns whether another batch was
    /// revealed; signals inside the cooldown window are ignored.
    pub fn on_visible(&mut self, now: Instant, total: usize) -> bool {
        if !self.has_more(total) {
            return false;
        }
        if let Some(last) = self.last_advance {
            if now.saturating_duration_since(last) < self.cooldown {
                return false;
            }
        }
        self.revealed = self.revealed.saturating_add(self.batch_size);
        self.last_advance = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.revealed = self.batch_size;
        self.last_advance = None;
    }
}

impl Default for RevealWindow {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_REVEAL_COOLDOWN)
    }
}

/// Filter state plus reveal window for one browser view. Any change to the
/// filters or sort key rewinds the window.
#[derive(Debug, Clone, Default)]
pub struct PagedView {
    filters: FilterState,
    window: RevealWindow,
}

impl PagedView {
    pub fn new(window: RevealWindow) -> Self {
        Self {
            filters: FilterState::default(),
            window,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn update_filters(&mut self, filters: FilterState) {
        if filters != self.filters {
            self.filters = filters;
            self.window.reset();
        }
    }

    pub fn reset_filters(&mut self) {
        self.update_filters(FilterState::default());
    }

    pub fn on_visible(&mut self, now: Instant, total: usize) -> bool {
        self.window.on_visible(now, total)
    }

    /// The currently revealed prefix of the filtered, sorted list.
    pub fn page<'a>(&self, assets: &'a [AssetRecord]) -> Vec<&'a AssetRecord> {
        let mut selected = apply_filters(assets, &self.filters);
        selected.truncate(self.window.visible(selected.len()));
        selected
    }
}
