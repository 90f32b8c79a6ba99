//! Input feature reducer.
//!
//! Maps key presses in the main view to draft edits and conversation
//! actions. Handlers are tried in order; the first that claims the key wins.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pseudo_core::transcript::Direction;

use crate::chat;
use crate::common::sanitize_for_display;
use crate::effects::UiEffect;
use crate::overlays::ModelPickerMode;
use crate::state::TuiState;

/// Inserts pasted text into the draft.
pub fn handle_paste(tui: &mut TuiState, text: &str) {
    tui.input.reset_navigation();
    tui.input.buffer.insert_str(&sanitize_for_display(text));
}

/// Handles a key press when no overlay is open.
pub fn handle_main_key(tui: &mut TuiState, key: KeyEvent) -> Vec<UiEffect> {
    let mods = Modifiers::from(&key);

    handle_control_keys(tui, key.code, &mods)
        .or_else(|| handle_conversation_keys(tui, key.code, &mods))
        .or_else(|| handle_scroll_keys(tui, key.code, &mods))
        .or_else(|| handle_editing(tui, key.code, &mods))
        .or_else(|| handle_navigation(tui, key.code, &mods))
        .unwrap_or_else(|| handle_default_input(tui, key.code, &mods))
}

/// Parsed key modifiers for cleaner pattern matching.
struct Modifiers {
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl Modifiers {
    fn from(key: &KeyEvent) -> Self {
        Self {
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            alt: key.modifiers.contains(KeyModifiers::ALT),
        }
    }

    fn none(&self) -> bool {
        !self.ctrl && !self.alt
    }

    fn only_ctrl(&self) -> bool {
        self.ctrl && !self.alt
    }

    fn only_alt(&self) -> bool {
        self.alt && !self.ctrl
    }
}

// Ctrl+C, Esc, Enter

fn handle_control_keys(
    tui: &mut TuiState,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<Vec<UiEffect>> {
    match code {
        KeyCode::Char('c') if mods.only_ctrl() => {
            if tui.input.buffer.is_empty() {
                Some(vec![UiEffect::Quit])
            } else {
                tui.input.clear();
                Some(vec![])
            }
        }
        KeyCode::Esc => {
            if tui.is_awaiting_reply() {
                Some(chat::cancel(tui))
            } else {
                tui.chat.focus = None;
                Some(vec![])
            }
        }
        KeyCode::Enter if mods.shift || mods.alt => {
            tui.input.buffer.insert_newline();
            Some(vec![])
        }
        KeyCode::Char('j') if mods.only_ctrl() => {
            tui.input.buffer.insert_newline();
            Some(vec![])
        }
        KeyCode::Enter if mods.none() => {
            if tui.is_awaiting_reply() || tui.input.is_blank() {
                return Some(vec![]);
            }
            Some(chat::send(tui))
        }
        _ => None,
    }
}

// Focus, variations, regenerate, pickers, clipboard

fn handle_conversation_keys(
    tui: &mut TuiState,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<Vec<UiEffect>> {
    match code {
        KeyCode::Up if mods.only_alt() => {
            tui.chat.focus_previous();
            Some(vec![])
        }
        KeyCode::Down if mods.only_alt() => {
            tui.chat.focus_next();
            Some(vec![])
        }
        KeyCode::Left if mods.only_alt() => {
            chat::navigate(tui, Direction::Previous);
            Some(vec![])
        }
        KeyCode::Right if mods.only_alt() => {
            chat::navigate(tui, Direction::Next);
            Some(vec![])
        }
        KeyCode::Char('r') if mods.only_ctrl() => Some(chat::regenerate(tui)),
        KeyCode::Char('t') if mods.only_ctrl() => {
            if tui.is_awaiting_reply() {
                return Some(vec![]);
            }
            let Some(target) = tui.chat.target().cloned() else {
                return Some(vec![]);
            };
            Some(vec![UiEffect::LoadModels {
                task: None,
                mode: ModelPickerMode::SwitchMessage(target),
            }])
        }
        KeyCode::Char('l') if mods.only_ctrl() => Some(vec![UiEffect::LoadModels {
            task: None,
            mode: ModelPickerMode::SetDefault,
        }]),
        KeyCode::Char('o') if mods.only_ctrl() => {
            Some(vec![UiEffect::LoadChatList { task: None }])
        }
        KeyCode::Char('n') if mods.only_ctrl() => Some(chat::new_chat(tui)),
        KeyCode::Char('y') if mods.only_ctrl() => Some(chat::copy_target(tui)),
        KeyCode::Char('g') if mods.only_ctrl() => Some(chat::open_target_media(tui)),
        KeyCode::Char('s') if mods.only_ctrl() => Some(chat::save_target_media(tui)),
        _ => None,
    }
}

fn handle_scroll_keys(
    tui: &mut TuiState,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<Vec<UiEffect>> {
    match code {
        KeyCode::PageUp => tui.transcript.page_up(),
        KeyCode::PageDown => tui.transcript.page_down(),
        KeyCode::Home if mods.only_ctrl() => tui.transcript.scroll.scroll_to_top(),
        KeyCode::End if mods.only_ctrl() => tui.transcript.scroll.scroll_to_bottom(),
        _ => return None,
    }
    Some(vec![])
}

// Ctrl+U, Ctrl+W, Alt+Backspace, Ctrl+A, Ctrl+E

fn handle_editing(tui: &mut TuiState, code: KeyCode, mods: &Modifiers) -> Option<Vec<UiEffect>> {
    let buffer = &mut tui.input.buffer;
    match code {
        KeyCode::Char('u') if mods.only_ctrl() => buffer.delete_to_line_start(),
        KeyCode::Char('w') if mods.only_ctrl() => buffer.delete_word_left(),
        KeyCode::Backspace if mods.only_alt() => buffer.delete_word_left(),
        KeyCode::Char('a') if mods.only_ctrl() => buffer.move_home(),
        KeyCode::Char('e') if mods.only_ctrl() => buffer.move_end(),
        _ => return None,
    }
    tui.input.reset_navigation();
    Some(vec![])
}

fn handle_navigation(
    tui: &mut TuiState,
    code: KeyCode,
    mods: &Modifiers,
) -> Option<Vec<UiEffect>> {
    if !mods.none() {
        return None;
    }
    let input = &mut tui.input;
    match code {
        KeyCode::Up => {
            if input.should_navigate_up() {
                input.navigate_up();
            } else {
                input.buffer.move_up();
            }
        }
        KeyCode::Down => {
            if input.should_navigate_down() {
                input.navigate_down();
            } else {
                input.buffer.move_down();
            }
        }
        KeyCode::Left => input.buffer.move_left(),
        KeyCode::Right => input.buffer.move_right(),
        KeyCode::Home => input.buffer.move_home(),
        KeyCode::End => input.buffer.move_end(),
        _ => return None,
    }
    Some(vec![])
}

fn handle_default_input(tui: &mut TuiState, code: KeyCode, mods: &Modifiers) -> Vec<UiEffect> {
    let input = &mut tui.input;
    match code {
        KeyCode::Char(c) if !mods.ctrl && !mods.alt => {
            input.reset_navigation();
            input.buffer.insert_char(c);
        }
        KeyCode::Backspace => {
            input.reset_navigation();
            input.buffer.backspace();
        }
        KeyCode::Delete => {
            input.reset_navigation();
            input.buffer.delete();
        }
        _ => {}
    }
    vec![]
}
