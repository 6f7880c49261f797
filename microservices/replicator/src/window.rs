//! Replication windows
//!
//! Consecutive windows tile the timeline: each one starts exactly where the
//! previous one ended, and every window is non-empty.

use serde::Serialize;

/// Half-open interval `[start_ms, end_ms)` in milliseconds since epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Window {
    /// Returns `None` unless `end_ms > start_ms`
    pub fn new(start_ms: i64, end_ms: i64) -> Option<Self> {
        (end_ms > start_ms).then_some(Self { start_ms, end_ms })
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms - self.start_ms
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start_ms, self.end_ms)
    }
}

/// End of the last replicated window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCursor {
    position_ms: i64,
}

impl WindowCursor {
    pub fn new(position_ms: i64) -> Self {
        Self { position_ms }
    }

    pub fn position_ms(&self) -> i64 {
        self.position_ms
    }

    /// Window from the cursor up to `now_ms`, if any time has passed
    pub fn next_window(&self, now_ms: i64) -> Option<Window> {
        Window::new(self.position_ms, now_ms)
    }

    /// Move the cursor to the end of a window produced by `next_window`
    pub fn advance(&mut self, window: Window) {
        debug_assert_eq!(window.start_ms, self.position_ms);
        self.position_ms = window.end_ms;
    }
}
