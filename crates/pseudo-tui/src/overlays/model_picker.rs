use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pseudo_core::api::ModelOption;
use pseudo_core::transcript::MessageId;
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
use crate::mutations::{ChatMutation, ConfigMutation, StateMutation, TranscriptMutation};
use crate::state::TuiState;

pub const MAX_VISIBLE_MODELS: usize = 10;

const PICKER_WIDTH: u16 = 64;
const ACCENT: Color = Color::Magenta;

/// What choosing a model does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelPickerMode {
    /// Set the model for later sends and persist it to the config file.
    SetDefault,
    /// Regenerate this assistant message with the chosen model.
    SwitchMessage(MessageId),
}

#[derive(Debug)]
pub struct ModelPickerState {
    options: Vec<ModelOption>,
    mode: ModelPickerMode,
    /// Model active when the picker opened (marked in the list).
    current: String,
    pub filter: String,
    pub cursor: ListCursor,
}

impl ModelPickerState {
    /// Opens with the current model selected when it is listed.
    pub fn open(options: Vec<ModelOption>, mode: ModelPickerMode, current: &str) -> Self {
        let mut state = Self {
            options,
            mode,
            current: current.to_string(),
            filter: String::new(),
            cursor: ListCursor::default(),
        };
        if let Some(index) = state.options.iter().position(|o| o.model == current) {
            state.cursor.select(index, state.visible_len(), MAX_VISIBLE_MODELS);
        }
        state
    }

    pub fn mode(&self) -> &ModelPickerMode {
        &self.mode
    }

    pub fn visible_models(&self) -> Vec<&ModelOption> {
        self.options
            .iter()
            .filter(|o| model_matches_filter(o, &self.filter))
            .collect()
    }

    pub fn selected_model(&self) -> Option<&ModelOption> {
        self.visible_models().get(self.cursor.selected).copied()
    }

    fn visible_len(&self) -> usize {
        self.visible_models().len()
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
                self.cursor.down(self.visible_len(), MAX_VISIBLE_MODELS);
                OverlayUpdate::stay()
            }
            KeyCode::Char('n') if ctrl => {
                self.cursor.down(self.visible_len(), MAX_VISIBLE_MODELS);
                OverlayUpdate::stay()
            }
            KeyCode::Enter => self.choose(tui),
            KeyCode::Char('u') if ctrl => {
                self.filter.clear();
                self.cursor.clamp(self.visible_len(), MAX_VISIBLE_MODELS);
                OverlayUpdate::stay()
            }
            KeyCode::Backspace => {
                if alt {
                    clear_word_left(&mut self.filter);
                } else {
                    self.filter.pop();
                }
                self.cursor.clamp(self.visible_len(), MAX_VISIBLE_MODELS);
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

    fn choose(&self, tui: &TuiState) -> OverlayUpdate {
        let Some(option) = self.selected_model() else {
            return OverlayUpdate::stay();
        };
        let model = option.model.clone();
        match &self.mode {
            ModelPickerMode::SetDefault => OverlayUpdate::close()
                .with_mutations(vec![
                    StateMutation::Config(ConfigMutation::SetModel(model.clone())),
                    StateMutation::Transcript(TranscriptMutation::AppendSystemMessage(format!(
                        "Model set to {model}"
                    ))),
                ])
                .with_ui_effects(vec![UiEffect::PersistModel { model }]),
            ModelPickerMode::SwitchMessage(message_id) => {
                if tui.is_awaiting_reply() {
                    return OverlayUpdate::stay().with_mutations(vec![StateMutation::Transcript(
                        TranscriptMutation::AppendSystemMessage(
                            "Wait for the current reply first.".to_string(),
                        ),
                    )]);
                }
                OverlayUpdate::close().with_mutations(vec![StateMutation::Chat(
                    ChatMutation::SwitchModel {
                        message_id: message_id.clone(),
                        model,
                    },
                )])
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, input_y: u16) {
        let models = self.visible_models();
        let visible_count = models.len().min(MAX_VISIBLE_MODELS);
        let height = (visible_count as u16 + PICKER_CHROME_ROWS + 3).max(9);

        let popup = calculate_overlay_area(area, input_y, PICKER_WIDTH, height);
        let title = match self.mode {
            ModelPickerMode::SetDefault => format!("Model ({})", models.len()),
            ModelPickerMode::SwitchMessage(_) => format!("Regenerate with ({})", models.len()),
        };
        render_overlay_container(frame, popup, &title, ACCENT);

        let inner = inner_area(popup);
        render_filter_line(frame, inner, &self.filter, ACCENT);
        render_separator(frame, inner, 1);

        let list_height = inner.height.saturating_sub(PICKER_CHROME_ROWS);
        if models.is_empty() {
            let message = if self.filter.is_empty() {
                "No models configured"
            } else {
                "No matching models"
            };
            render_empty_message(frame, inner, message);
        } else {
            let items = models
                .iter()
                .skip(self.cursor.offset)
                .take(list_height as usize)
                .map(|o| self.build_item(o, inner.width))
                .collect();
            render_picker_list(frame, inner, items, self.cursor.visible_selected(), ACCENT);
        }
        render_separator(frame, inner, 2 + list_height);

        render_hints(
            frame,
            inner,
            &[
                InputHint::new("↑↓", "navigate"),
                InputHint::new("Enter", "select"),
                InputHint::new("Esc", "cancel"),
            ],
            ACCENT,
        );
    }

    fn build_item(&self, option: &ModelOption, inner_width: u16) -> ListItem<'static> {
        let source = option.source_label();
        let current_label = if option.model == self.current {
            "(current) "
        } else {
            ""
        };

        let highlight_width = 3;
        let available = (inner_width as usize).saturating_sub(highlight_width);
        let name_max = available.saturating_sub(current_label.width() + source.width() + 2);
        let name = truncate_with_ellipsis(&option.model, name_max);
        let gap = available
            .saturating_sub(current_label.width() + name.width() + source.width())
            .max(1);

        ListItem::new(Line::from(vec![
            Span::styled(current_label.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled(name, Style::default().fg(Color::White)),
            Span::raw(" ".repeat(gap)),
            Span::styled(source, Style::default().fg(Color::DarkGray)),
        ]))
    }
}

/// Case-insensitive match on model, provider or mode.
fn model_matches_filter(option: &ModelOption, filter: &str) -> bool {
    if filter.is_empty() {
        return true;
    }
    let filter = filter.to_lowercase();
    [&option.model, &option.provider, &option.mode]
        .iter()
        .any(|field| field.to_lowercase().contains(&filter))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossterm::event::KeyEvent;
    use pseudo_core::api::ApiClient;
    use pseudo_core::config::Config;

    use super::*;
    use crate::overlays::OverlayTransition;

    fn options() -> Vec<ModelOption> {
        let option = |mode: &str, provider: &str, model: &str| ModelOption {
            mode: mode.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
        };
        vec![
            ModelOption::auto(),
            option("text", "anthropic", "claude-3-opus"),
            option("text", "openai", "gpt-4"),
            option("image", "openai", "dall-e-3"),
        ]
    }

    fn tui() -> TuiState {
        let client = ApiClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        TuiState::new(Config::default(), client)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_opens_on_current_model() {
        let picker = ModelPickerState::open(options(), ModelPickerMode::SetDefault, "gpt-4");
        assert_eq!(picker.selected_model().unwrap().model, "gpt-4");
    }

    #[test]
    fn test_filter_matches_provider() {
        let mut picker = ModelPickerState::open(options(), ModelPickerMode::SetDefault, "Auto");
        let tui = tui();
        for c in "OPENAI".chars() {
            let _ = picker.handle_key(&tui, key(KeyCode::Char(c)));
        }
        let names: Vec<_> = picker.visible_models().iter().map(|o| o.model.as_str()).collect();
        assert_eq!(names, vec!["gpt-4", "dall-e-3"]);
    }

    #[test]
    fn test_set_default_persists() {
        let mut picker = ModelPickerState::open(options(), ModelPickerMode::SetDefault, "gpt-4");
        let update = picker.handle_key(&tui(), key(KeyCode::Enter));
        assert!(matches!(update.transition, OverlayTransition::Close));
        assert!(matches!(
            update.mutations.first(),
            Some(StateMutation::Config(ConfigMutation::SetModel(m))) if m == "gpt-4"
        ));
        assert!(matches!(
            update.effects.as_slice(),
            [UiEffect::PersistModel { model }] if model == "gpt-4"
        ));
    }

    #[test]
    fn test_switch_message_requests_switch() {
        let id = MessageId::from("m1");
        let mut picker =
            ModelPickerState::open(options(), ModelPickerMode::SwitchMessage(id.clone()), "Auto");
        let tui = tui();
        let _ = picker.handle_key(&tui, key(KeyCode::Down));
        let update = picker.handle_key(&tui, key(KeyCode::Enter));
        assert!(matches!(
            update.mutations.as_slice(),
            [StateMutation::Chat(ChatMutation::SwitchModel { message_id, model })]
                if *message_id == id && model == "claude-3-opus"
        ));
        assert!(update.effects.is_empty());
    }
}
