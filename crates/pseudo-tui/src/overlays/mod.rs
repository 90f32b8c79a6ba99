//! Overlay modules for the TUI.
//!
//! Overlays are modal pickers that temporarily take over keyboard input.
//! Each one owns its state, key handler and render function, and reports
//! back through [`OverlayUpdate`] since it only sees `&TuiState`.
//!
//! - `model_picker.rs`: model selection (default model or per-message switch)
//! - `chat_picker.rs`: stored chat history (open, delete)
//! - `render_utils.rs`: shared rendering helpers

pub mod chat_picker;
pub mod model_picker;
pub mod render_utils;

pub use chat_picker::ChatPickerState;
use crossterm::event::KeyEvent;
pub use model_picker::{ModelPickerMode, ModelPickerState};
use pseudo_core::api::{ChatSummary, ModelOption};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::effects::UiEffect;
use crate::mutations::StateMutation;
use crate::state::TuiState;

// ============================================================================
// OverlayRequest / OverlayTransition / OverlayUpdate
// ============================================================================

/// Data needed to open an overlay. Pickers open once their list has loaded.
#[derive(Debug)]
pub enum OverlayRequest {
    ModelPicker {
        models: Vec<ModelOption>,
        mode: ModelPickerMode,
    },
    ChatPicker {
        chats: Vec<ChatSummary>,
    },
}

#[derive(Debug)]
pub enum OverlayTransition {
    Stay,
    Close,
}

/// Update returned by overlay key handlers.
#[derive(Debug)]
pub struct OverlayUpdate {
    pub transition: OverlayTransition,
    pub mutations: Vec<StateMutation>,
    pub effects: Vec<UiEffect>,
}

impl OverlayUpdate {
    fn new(transition: OverlayTransition) -> Self {
        Self {
            transition,
            mutations: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn stay() -> Self {
        Self::new(OverlayTransition::Stay)
    }

    pub fn close() -> Self {
        Self::new(OverlayTransition::Close)
    }

    #[must_use]
    pub fn with_mutations(mut self, mutations: Vec<StateMutation>) -> Self {
        self.mutations = mutations;
        self
    }

    #[must_use]
    pub fn with_ui_effects(mut self, effects: Vec<UiEffect>) -> Self {
        self.effects = effects;
        self
    }
}

// ============================================================================
// ListCursor
// ============================================================================

/// Selection and scroll offset of a picker list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListCursor {
    pub selected: usize,
    pub offset: usize,
}

impl ListCursor {
    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset = self.selected;
            }
        }
    }

    pub fn down(&mut self, total: usize, max_visible: usize) {
        if self.selected + 1 < total {
            self.selected += 1;
            let height = total.min(max_visible).max(1);
            if self.selected >= self.offset + height {
                self.offset = self.selected + 1 - height;
            }
        }
    }

    pub fn select(&mut self, index: usize, total: usize, max_visible: usize) {
        self.selected = index;
        self.offset = 0;
        self.clamp(total, max_visible);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Keeps the selection inside `total` items and in view.
    pub fn clamp(&mut self, total: usize, max_visible: usize) {
        if total == 0 {
            self.reset();
            return;
        }
        self.selected = self.selected.min(total - 1);
        let height = total.min(max_visible).max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
        self.offset = self.offset.min(total - height);
    }

    /// Row of the selection within the visible window.
    pub fn visible_selected(&self) -> usize {
        self.selected.saturating_sub(self.offset)
    }
}

// ============================================================================
// Overlay
// ============================================================================

#[derive(Debug)]
pub enum Overlay {
    ModelPicker(ModelPickerState),
    ChatPicker(ChatPickerState),
}

impl Overlay {
    /// Builds the overlay for a request.
    pub fn open(tui: &TuiState, request: OverlayRequest) -> Self {
        match request {
            OverlayRequest::ModelPicker { models, mode } => {
                let current = match &mode {
                    ModelPickerMode::SetDefault => tui.chat.conversation.model().to_string(),
                    ModelPickerMode::SwitchMessage(id) => tui
                        .chat
                        .conversation
                        .transcript()
                        .get(id)
                        .and_then(|m| m.current().model.clone())
                        .unwrap_or_else(|| tui.chat.conversation.model().to_string()),
                };
                Overlay::ModelPicker(ModelPickerState::open(models, mode, &current))
            }
            OverlayRequest::ChatPicker { chats } => Overlay::ChatPicker(ChatPickerState::open(
                chats,
                tui.chat.conversation.chat_id().map(str::to_string),
            )),
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, input_y: u16) {
        match self {
            Overlay::ModelPicker(p) => p.render(frame, area, input_y),
            Overlay::ChatPicker(p) => p.render(frame, area, input_y),
        }
    }

    pub fn handle_key(&mut self, tui: &TuiState, key: KeyEvent) -> OverlayUpdate {
        match self {
            Overlay::ModelPicker(p) => p.handle_key(tui, key),
            Overlay::ChatPicker(p) => p.handle_key(tui, key),
        }
    }
}

/// Routes a key to the open overlay. Returns `None` when no overlay is open.
pub fn handle_overlay_key(
    tui: &TuiState,
    overlay: &mut Option<Overlay>,
    key: KeyEvent,
) -> Option<OverlayUpdate> {
    overlay.as_mut().map(|o| o.handle_key(tui, key))
}

// ============================================================================
// OverlayExt - Extension trait for Option<Overlay>
// ============================================================================

pub trait OverlayExt {
    /// Renders the overlay if one is active.
    fn render(&self, frame: &mut Frame, area: Rect, input_y: u16);
}

impl OverlayExt for Option<Overlay> {
    fn render(&self, frame: &mut Frame, area: Rect, input_y: u16) {
        if let Some(overlay) = self {
            overlay.render(frame, area, input_y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_scrolls_window() {
        let mut cursor = ListCursor::default();
        for _ in 0..12 {
            cursor.down(20, 10);
        }
        assert_eq!(cursor.selected, 12);
        assert_eq!(cursor.offset, 3);
        assert_eq!(cursor.visible_selected(), 9);

        for _ in 0..5 {
            cursor.up();
        }
        assert_eq!(cursor.selected, 7);
        assert_eq!(cursor.offset, 3);
    }

    #[test]
    fn test_cursor_clamps_after_filter() {
        let mut cursor = ListCursor {
            selected: 15,
            offset: 8,
        };
        cursor.clamp(4, 10);
        assert_eq!(cursor, ListCursor { selected: 3, offset: 0 });
        cursor.clamp(0, 10);
        assert_eq!(cursor, ListCursor::default());
    }
}
