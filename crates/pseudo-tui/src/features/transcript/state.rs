//! Transcript view state: scroll position, viewport and local notes.
//!
//! The messages themselves live in the conversation; this slice only holds
//! what the view adds on top of them.

use pseudo_core::transcript::MessageId;

use crate::mutations::TranscriptMutation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollMode {
    /// Stick to the newest content.
    FollowLatest,
    /// User scrolled away; `offset` is the first visible line.
    Anchored { offset: usize },
}

#[derive(Debug, Clone)]
pub struct ScrollState {
    pub mode: ScrollMode,
    /// Line count of the last layout pass.
    pub cached_line_count: usize,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::FollowLatest,
            cached_line_count: 0,
        }
    }
}

impl ScrollState {
    pub fn is_following(&self) -> bool {
        matches!(self.mode, ScrollMode::FollowLatest)
    }

    /// First visible line for a viewport of `viewport_height`.
    pub fn get_offset(&self, viewport_height: usize) -> usize {
        let max_offset = self.cached_line_count.saturating_sub(viewport_height);
        match self.mode {
            ScrollMode::FollowLatest => max_offset,
            ScrollMode::Anchored { offset } => offset.min(max_offset),
        }
    }

    pub fn scroll_up(&mut self, lines: usize, viewport_height: usize) {
        let offset = self.get_offset(viewport_height).saturating_sub(lines);
        self.mode = ScrollMode::Anchored { offset };
    }

    /// Scrolls down; reaching the bottom switches back to following.
    pub fn scroll_down(&mut self, lines: usize, viewport_height: usize) {
        if self.is_following() {
            return;
        }
        let max_offset = self.cached_line_count.saturating_sub(viewport_height);
        let offset = (self.get_offset(viewport_height) + lines).min(max_offset);
        self.mode = if offset >= max_offset {
            ScrollMode::FollowLatest
        } else {
            ScrollMode::Anchored { offset }
        };
    }

    pub fn scroll_to_top(&mut self) {
        self.mode = ScrollMode::Anchored { offset: 0 };
    }

    pub fn scroll_to_bottom(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }

    pub fn page_up(&mut self, viewport_height: usize) {
        self.scroll_up(viewport_height.max(1), viewport_height);
    }

    pub fn page_down(&mut self, viewport_height: usize) {
        self.scroll_down(viewport_height.max(1), viewport_height);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Coalesces mouse wheel events into one scroll per frame, with acceleration
/// while the wheel keeps turning the same way.
///
/// Positive deltas scroll down.
#[derive(Debug, Clone, Default)]
pub struct ScrollAccumulator {
    pending: i32,
    streak: u8,
    direction: i8,
}

impl ScrollAccumulator {
    pub fn accumulate(&mut self, delta: i32) {
        self.pending += delta;
    }

    /// Lines to scroll this frame (signed).
    ///
    /// One line for the first two frames of a streak, then
    /// `1 + floor(log2(streak - 1))`, never more than the raw delta.
    pub fn take_delta(&mut self) -> i32 {
        let raw = std::mem::take(&mut self.pending);
        if raw == 0 {
            self.streak = 0;
            self.direction = 0;
            return 0;
        }

        let direction = raw.signum() as i8;
        if direction == self.direction {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 1;
            self.direction = direction;
        }

        let boost = 1 + f64::from(self.streak.saturating_sub(1).max(1)).log2().floor() as u32;
        let lines = boost.min(raw.unsigned_abs().max(1)) as i32;
        lines * raw.signum()
    }
}

/// A client-side line in the transcript ("Request cancelled", errors, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNote {
    /// Message the note follows; `None` places it before the first message.
    pub after: Option<MessageId>,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct TranscriptState {
    pub scroll: ScrollState,
    pub scroll_accumulator: ScrollAccumulator,
    pub notes: Vec<SystemNote>,
    pub viewport_height: usize,
    pub terminal_size: (u16, u16),
}

impl TranscriptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a mutation; `last` is the newest message in the conversation.
    pub fn apply(&mut self, mutation: TranscriptMutation, last: Option<&MessageId>) {
        match mutation {
            TranscriptMutation::AppendSystemMessage(text) => self.push_note(last, text),
            TranscriptMutation::ScrollToBottom => self.scroll.scroll_to_bottom(),
        }
    }

    pub fn push_note(&mut self, after: Option<&MessageId>, text: impl Into<String>) {
        self.notes.push(SystemNote {
            after: after.cloned(),
            text: text.into(),
        });
        self.scroll.scroll_to_bottom();
    }

    /// Clears notes and scroll for a different conversation.
    pub fn reset(&mut self) {
        self.notes.clear();
        self.scroll.reset();
        self.scroll_accumulator = ScrollAccumulator::default();
    }

    pub fn update_layout(&mut self, terminal_size: (u16, u16), viewport_height: usize) {
        self.terminal_size = terminal_size;
        self.viewport_height = viewport_height;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll.scroll_up(lines, self.viewport_height);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll.scroll_down(lines, self.viewport_height);
    }

    pub fn page_up(&mut self) {
        self.scroll.page_up(self.viewport_height);
    }

    pub fn page_down(&mut self) {
        self.scroll.page_down(self.viewport_height);
    }
}
