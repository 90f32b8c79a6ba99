use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pseudo_core::api::{ChatSummary, format_relative};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::ListItem;
use unicode_width::UnicodeWidthStr;

use super::render_utils::{
    InputHint, PICKER_CHROME_ROWS, calculate_overlay_area, clear_word_left, inner_area,
    render_empty_message, render_filter_line, render_hints, render_overlay_container,
    render_picker_list, render_separator,
};
use super::{ListCursor, OverlayUpdate};
use crate::common::truncate_with_ellipsis;
use crate::effects::UiEffect;
use crate::mutations::{ChatMutation, StateMutation};
use crate::state::TuiState;

pub const MAX_VISIBLE_CHATS: usize = 10;

const PICKER_WIDTH: u16 = 60;
const ACCENT: Color = Color::Magenta;

#[derive(Debug)]
pub struct ChatPickerState {
    chats: Vec<ChatSummary>,
    /// Backend id of the open chat, marked in the list.
    current_chat_id: Option<String>,
    pub filter: String,
    pub cursor: ListCursor,
}

impl ChatPickerState {
    /// Opens over `chats` sorted newest first.
    pub fn open(mut chats: Vec<ChatSummary>, current_chat_id: Option<String>) -> Self {
        chats.sort_by_key(|c| std::cmp::Reverse(c.updated()));
        Self {
            chats,
            current_chat_id,
            filter: String::new(),
            cursor: ListCursor::default(),
        }
    }

    pub fn visible_chats(&self) -> Vec<&ChatSummary> {
        self.chats
            .iter()
            .filter(|c| chat_matches_filter(c, &self.filter))
            .collect()
    }

    pub fn selected_chat(&self) -> Option<&ChatSummary> {
        self.visible_chats().get(self.cursor.selected).copied()
    }

    fn visible_len(&self) -> usize {
        self.visible_chats().len()
    }

    pub fn handle_key(&mut self, tui: &TuiState, key: KeyEvent) -> OverlayUpdate {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => OverlayUpdate::close(),
            KeyCode::Char('c') if ctrl => OverlayUpdate::close(),
            KeyCode::Up => {
                self.cursor.up();
                OverlayUpdate::stay()
            }
            KeyCode::Char('p') if ctrl => {
                self.cursor.up();
                OverlayUpdate::stay()
            }
            KeyCode::Down => {
                self.cursor.down(self.visible_len(), MAX_VISIBLE_CHATS);
                OverlayUpdate::stay()
            }
            KeyCode::Char('n') if ctrl => {
                self.cursor.down(self.visible_len(), MAX_VISIBLE_CHATS);
                OverlayUpdate::stay()
            }
            KeyCode::Enter => {
                let Some(chat) = self.selected_chat() else {
                    return OverlayUpdate::close();
                };
                if tui.tasks.chat_load.is_running() {
                    return OverlayUpdate::stay();
                }
                OverlayUpdate::close().with_mutations(vec![StateMutation::Chat(
                    ChatMutation::Open {
                        id: chat.id.clone(),
                    },
                )])
            }
            KeyCode::Delete => self.delete_selected(tui),
            KeyCode::Char('d') if ctrl => self.delete_selected(tui),
            KeyCode::Char('y') if ctrl => match self.selected_chat() {
                Some(chat) => OverlayUpdate::stay().with_ui_effects(vec![
                    UiEffect::CopyToClipboard {
                        text: chat.id.clone(),
                    },
                ]),
                None => OverlayUpdate::stay(),
            },
            KeyCode::Char('u') if ctrl => {
                self.filter.clear();
                self.cursor.clamp(self.visible_len(), MAX_VISIBLE_CHATS);
                OverlayUpdate::stay()
            }
            KeyCode::Backspace => {
                if alt {
                    clear_word_left(&mut self.filter);
                } else {
                    self.filter.pop();
                }
                self.cursor.clamp(self.visible_len(), MAX_VISIBLE_CHATS);
                OverlayUpdate::stay()
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                self.filter.push(c);
                self.cursor.reset();
                OverlayUpdate::stay()
            }
            _ => OverlayUpdate::stay(),
        }
    }

    /// Closes the picker and deletes the selected chat; the list reopens once
    /// the backend confirms.
    fn delete_selected(&self, tui: &TuiState) -> OverlayUpdate {
        let Some(chat) = self.selected_chat() else {
            return OverlayUpdate::stay();
        };
        if tui.tasks.chat_delete.is_running() {
            return OverlayUpdate::stay();
        }
        OverlayUpdate::close().with_mutations(vec![StateMutation::Chat(ChatMutation::Delete {
            id: chat.id.clone(),
        })])
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, input_y: u16) {
        let chats = self.visible_chats();
        let visible_count = chats.len().min(MAX_VISIBLE_CHATS);
        let height = (visible_count as u16 + PICKER_CHROME_ROWS + 3).max(9);

        let popup = calculate_overlay_area(area, input_y, PICKER_WIDTH, height);
        let title = if self.filter.is_empty() {
            format!("Chats ({})", self.chats.len())
        } else {
            format!("Chats ({}/{})", chats.len(), self.chats.len())
        };
        render_overlay_container(frame, popup, &title, ACCENT);

        let inner = inner_area(popup);
        render_filter_line(frame, inner, &self.filter, ACCENT);
        render_separator(frame, inner, 1);

        let list_height = inner.height.saturating_sub(PICKER_CHROME_ROWS);
        if chats.is_empty() {
            let message = if self.filter.is_empty() {
                "No chats found"
            } else {
                "No matching chats"
            };
            render_empty_message(frame, inner, message);
        } else {
            let now = Utc::now();
            let items = chats
                .iter()
                .skip(self.cursor.offset)
                .take(list_height as usize)
                .map(|c| self.build_item(c, inner.width, now))
                .collect();
            render_picker_list(frame, inner, items, self.cursor.visible_selected(), ACCENT);
        }
        render_separator(frame, inner, 2 + list_height);

        render_hints(
            frame,
            inner,
            &[
                InputHint::new("Enter", "open"),
                InputHint::new("Ctrl+D", "delete"),
                InputHint::new("Ctrl+Y", "copy id"),
                InputHint::new("Esc", "close"),
            ],
            ACCENT,
        );
    }

    fn build_item(
        &self,
        chat: &ChatSummary,
        inner_width: u16,
        now: chrono::DateTime<Utc>,
    ) -> ListItem<'static> {
        let when = chat
            .updated()
            .map_or_else(|| "-".to_string(), |t| format_relative(t, now));
        let meta = format!("{} msgs · {when}", chat.message_count);
        let is_current = self.current_chat_id.as_deref() == Some(chat.id.as_str());
        let current_label = if is_current { "(current) " } else { "" };

        let highlight_width = 3;
        let available = (inner_width as usize).saturating_sub(highlight_width);
        let title_max = available.saturating_sub(current_label.width() + meta.width() + 2);
        let title = truncate_with_ellipsis(&chat.title, title_max);
        let gap = available
            .saturating_sub(current_label.width() + title.width() + meta.width())
            .max(1);

        ListItem::new(Line::from(vec![
            Span::styled(current_label.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(title, Style::default().fg(Color::White)),
            Span::raw(" ".repeat(gap)),
            Span::styled(meta, Style::default().fg(Color::DarkGray)),
        ]))
    }
}

/// Case-insensitive match on title or id.
fn chat_matches_filter(chat: &ChatSummary, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let filter = filter.to_lowercase();
    chat.title.to_lowercase().contains(&filter) || chat.id.to_lowercase().contains(&filter)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pseudo_core::api::ApiClient;
    use pseudo_core::config::Config;
    use serde_json::json;

    use super::*;
    use crate::overlays::OverlayTransition;

    fn chats() -> Vec<ChatSummary> {
        serde_json::from_value(json!([
            {"id": "old", "title": "Rust lifetimes", "updated_at": "2024-01-01T10:00:00", "message_count": 4},
            {"id": "new", "title": "Cat pictures", "updated_at": "2024-03-01T10:00:00", "message_count": 2},
            {"id": "mid", "title": "Trip plan", "updated_at": "2024-02-01T10:00:00"}
        ]))
        .unwrap()
    }

    fn tui() -> TuiState {
        let client = ApiClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        TuiState::new(Config::default(), client)
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_sorted_newest_first() {
        let picker = ChatPickerState::open(chats(), None);
        let ids: Vec<_> = picker.visible_chats().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_enter_opens_filtered_selection() {
        let mut picker = ChatPickerState::open(chats(), Some("new".into()));
        let tui = tui();
        for c in "rust".chars() {
            let _ = picker.handle_key(&tui, key(KeyCode::Char(c), KeyModifiers::NONE));
        }
        let update = picker.handle_key(&tui, key(KeyCode::Enter, KeyModifiers::NONE));
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert!(matches!(
            update.mutations.as_slice(),
            [StateMutation::Chat(ChatMutation::Open { id })] if id == "old"
        ));
    }

    #[test]
    fn test_ctrl_d_deletes_selected() {
        let mut picker = ChatPickerState::open(chats(), None);
        let tui = tui();
        let _ = picker.handle_key(&tui, key(KeyCode::Down, KeyModifiers::NONE));
        let update = picker.handle_key(&tui, key(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert!(matches!(
            update.mutations.as_slice(),
            [StateMutation::Chat(ChatMutation::Delete { id })] if id == "mid"
        ));
    }

    #[test]
    fn test_no_match_enter_closes() {
        let mut picker = ChatPickerState::open(chats(), None);
        let tui = tui();
        let _ = picker.handle_key(&tui, key(KeyCode::Char('z'), KeyModifiers::NONE));
        assert!(picker.selected_chat().is_none());
        let update = picker.handle_key(&tui, key(KeyCode::Enter, KeyModifiers::NONE));
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert!(update.mutations.is_empty());
    }
}
