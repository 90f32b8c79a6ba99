//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyEvent, KeyEventKind};

use crate::effects::{UiEffect, begin_tasks};
use crate::events::{HistoryUiEvent, ModelsUiEvent, UiEvent};
use crate::mutations::{ChatMutation, ConfigMutation, StateMutation};
use crate::overlays::{self, Overlay, OverlayRequest};
use crate::state::{AppState, TuiState};
use crate::{chat, input, render, transcript};

/// The main reducer function.
///
/// Mutates state for `event` and returns effects for the runtime. Task
/// effects leave here with a fresh id that is already the active one for
/// their kind.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    let mut effects = reduce(app, event);
    begin_tasks(&mut app.tui.task_seq, &mut app.tui.tasks, &mut effects);
    effects
}

/// Effects that load the chat named on the command line before the first
/// frame.
pub fn startup(app: &mut AppState, chat_id: String) -> Vec<UiEffect> {
    let mut effects = chat::open_chat(chat_id);
    begin_tasks(&mut app.tui.task_seq, &mut app.tui.tasks, &mut effects);
    effects
}

fn reduce(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.tui.spinner_frame = app.tui.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Frame { width, height } => {
            handle_frame(&mut app.tui, width, height);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::TaskStarted { kind, started } => {
            if app.tui.tasks.state_mut(kind).on_started(&started) {
                return vec![];
            }
            // Cancelled or superseded before the runtime reported it.
            match started.cancel {
                Some(token) => vec![UiEffect::CancelTask {
                    kind,
                    token: Some(token),
                }],
                None => vec![],
            }
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.tui.tasks.state_mut(kind).finish_if_active(completed.id) {
                reduce(app, *completed.result)
            } else {
                tracing::debug!(?kind, id = completed.id.0, "dropping stale task result");
                vec![]
            }
        }
        UiEvent::ChatReplied { outcome } => chat::handle_reply(&mut app.tui, outcome),
        UiEvent::History(event) => handle_history_event(app, event),
        UiEvent::Models(event) => handle_models_event(app, event),
        UiEvent::ClipboardCopied => {
            push_note(&mut app.tui, "Copied to clipboard");
            vec![]
        }
        UiEvent::ClipboardFailed { error } => {
            push_note(&mut app.tui, format!("Copy failed: {error}"));
            vec![]
        }
        UiEvent::MediaSaved { path } => {
            push_note(&mut app.tui, format!("Saved to {}", path.display()));
            vec![]
        }
        UiEvent::MediaSaveFailed { error } => {
            push_note(&mut app.tui, format!("Save failed: {error}"));
            vec![]
        }
    }
}

fn handle_history_event(app: &mut AppState, event: HistoryUiEvent) -> Vec<UiEffect> {
    match event {
        HistoryUiEvent::ListLoaded { chats } => {
            if chats.is_empty() {
                push_note(&mut app.tui, "No saved chats");
            } else {
                open_overlay(app, OverlayRequest::ChatPicker { chats });
            }
            vec![]
        }
        HistoryUiEvent::ListFailed { error } => {
            push_note(&mut app.tui, format!("Failed to load chats: {error}"));
            vec![]
        }
        HistoryUiEvent::Loaded { record } => {
            app.overlay = None;
            chat::load_record(&mut app.tui, &record)
        }
        HistoryUiEvent::LoadFailed { id, error } => {
            push_note(&mut app.tui, format!("Failed to load chat {id}: {error}"));
            vec![]
        }
        HistoryUiEvent::Deleted { id } => chat::handle_deleted(&mut app.tui, &id),
        HistoryUiEvent::DeleteFailed { id, error } => {
            push_note(&mut app.tui, format!("Failed to delete chat {id}: {error}"));
            vec![]
        }
    }
}

fn handle_models_event(app: &mut AppState, event: ModelsUiEvent) -> Vec<UiEffect> {
    match event {
        ModelsUiEvent::Loaded { models, mode } => {
            open_overlay(app, OverlayRequest::ModelPicker { models, mode });
        }
        ModelsUiEvent::Failed { error } => {
            push_note(&mut app.tui, format!("Failed to load models: {error}"));
        }
    }
    vec![]
}

/// Appends a note after the newest message.
fn push_note(tui: &mut TuiState, text: impl Into<String>) {
    let last = tui
        .chat
        .conversation
        .transcript()
        .messages()
        .last()
        .map(|m| m.id.clone());
    tui.transcript.push_note(last.as_ref(), text);
}

fn open_overlay(app: &mut AppState, request: OverlayRequest) {
    app.overlay = Some(Overlay::open(&app.tui, request));
}

// ============================================================================
// StateMutation Dispatcher
// ============================================================================

fn apply_mutations(tui: &mut TuiState, mutations: Vec<StateMutation>) -> Vec<UiEffect> {
    let mut effects = Vec::new();
    for mutation in mutations {
        match mutation {
            StateMutation::Transcript(mutation) => {
                let last = tui
                    .chat
                    .conversation
                    .transcript()
                    .messages()
                    .last()
                    .map(|m| m.id.clone());
                tui.transcript.apply(mutation, last.as_ref());
            }
            StateMutation::Input(mutation) => tui.input.apply(mutation),
            StateMutation::Config(mutation) => apply_config_mutation(tui, mutation),
            StateMutation::Chat(mutation) => effects.extend(apply_chat_mutation(tui, mutation)),
        }
    }
    effects
}

fn apply_config_mutation(tui: &mut TuiState, mutation: ConfigMutation) {
    match mutation {
        ConfigMutation::SetModel(model) => {
            tui.chat.conversation.set_model(model.clone());
            tui.config.model = model;
        }
    }
}

fn apply_chat_mutation(tui: &mut TuiState, mutation: ChatMutation) -> Vec<UiEffect> {
    match mutation {
        ChatMutation::SwitchModel { message_id, model } => {
            chat::switch_model(tui, &message_id, &model)
        }
        ChatMutation::Open { id } => chat::open_chat(id),
        ChatMutation::Delete { id } => chat::delete_chat(id),
    }
}

fn apply_overlay_update(app: &mut AppState, update: overlays::OverlayUpdate) -> Vec<UiEffect> {
    let mut effects = apply_mutations(&mut app.tui, update.mutations);
    effects.extend(update.effects);
    match update.transition {
        overlays::OverlayTransition::Stay => {}
        overlays::OverlayTransition::Close => app.overlay = None,
    }
    effects
}

// ============================================================================
// Frame Handler (layout, scroll coalescing, focus reveal)
// ============================================================================

fn handle_frame(tui: &mut TuiState, width: u16, height: u16) {
    let viewport_height = render::calculate_transcript_height_with_state(tui, height);
    tui.transcript
        .update_layout((width, height), viewport_height);

    let built = transcript::build_lines(tui, render::transcript_width(width));
    tui.transcript.scroll.cached_line_count = built.lines.len();

    transcript::apply_scroll_delta(&mut tui.transcript);

    if tui.chat.reveal_focus {
        tui.chat.reveal_focus = false;
        match tui.chat.focused().and_then(|id| built.start_of(id)) {
            Some(line) => transcript::reveal_line(&mut tui.transcript, line),
            None => tui.transcript.scroll.scroll_to_bottom(),
        }
    }
}

// ============================================================================
// Terminal Event Handlers
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) => handle_key(app, key),
        Event::Mouse(mouse) => {
            if app.overlay.is_none() {
                transcript::handle_mouse(&mut app.tui.transcript, mouse);
            }
            vec![]
        }
        Event::Paste(text) => {
            if app.overlay.is_none() {
                input::handle_paste(&mut app.tui, &text);
            }
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    if key.kind == KeyEventKind::Release {
        return vec![];
    }

    if let Some(update) = overlays::handle_overlay_key(&app.tui, &mut app.overlay, key) {
        return apply_overlay_update(app, update);
    }

    input::handle_main_key(&mut app.tui, key)
}
