use crate::model::{Actions, FormatKind, LifecycleState};
use std::path::PathBuf;

/// UI-side view of the session. Owned by the UI thread only; everything here
/// is rebuilt from channel events, never mutated across threads.
pub struct UiState {
    pub state: LifecycleState,
    pub actions: Actions,
    pub source: Option<PathBuf>,
    pub kind: Option<FormatKind>,
    pub progress: u8,
    pub item_count: Option<usize>,
    pub last_export: Option<PathBuf>,

    pub log: Vec<String>,
    pub log_scroll: usize,
    /// Stick to the newest log lines until the user scrolls up.
    pub follow_log: bool,

    pub editing_path: bool,
    pub path_input: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            state: LifecycleState::Idle,
            actions: Actions::default(),
            source: None,
            kind: None,
            progress: 0,
            item_count: None,
            last_export: None,
            log: Vec::new(),
            log_scroll: 0,
            follow_log: true,
            editing_path: false,
            path_input: String::new(),
        }
    }
}

impl UiState {
    pub fn push_log(&mut self, line: String) {
        const MAX: usize = 2000;
        // Multi-line payloads become individual log rows so scrolling stays
        // line-accurate.
        for part in line.split('\n') {
            self.log.push(part.to_string());
        }
        if self.log.len() > MAX {
            let excess = self.log.len() - MAX;
            self.log.drain(0..excess);
            self.log_scroll = self.log_scroll.saturating_sub(excess);
        }
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
        self.log_scroll = 0;
        self.follow_log = true;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        if self.follow_log {
            // Leaving follow mode: anchor at the current bottom first.
            self.log_scroll = self.log.len();
            self.follow_log = false;
        }
        self.log_scroll = self.log_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.log_scroll = self.log_scroll.saturating_add(lines);
        if self.log_scroll >= self.log.len() {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.log_scroll = self.log.len();
        self.follow_log = true;
    }

    /// Top line index for a viewport of `height` rows.
    pub fn log_offset(&self, height: usize) -> usize {
        let max_offset = self.log.len().saturating_sub(height);
        if self.follow_log {
            max_offset
        } else {
            self.log_scroll.min(max_offset)
        }
    }
}
