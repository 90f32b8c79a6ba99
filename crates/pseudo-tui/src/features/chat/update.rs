//! Conversation actions.
//!
//! Each action calls the matching `Conversation::begin_*` and, when the
//! conversation accepts it, returns the effect that performs the request.
//! Rejections are logged and otherwise ignored.

use pseudo_core::api::{ChatRecord, ChatResponse, MediaRef};
use pseudo_core::conversation::{Completion, Conversation, Rejected};
use pseudo_core::transcript::{Direction, MessageId};

use crate::common::TaskKind;
use crate::effects::UiEffect;
use crate::state::TuiState;

pub const CANCELLED_NOTE: &str = "Request cancelled";

/// Sends the draft in the input box.
pub fn send(tui: &mut TuiState) -> Vec<UiEffect> {
    let text = tui.input.text();
    match tui.chat.conversation.begin_send(&text) {
        Ok(pending) => {
            tui.input.remember(text.trim());
            tui.input.clear();
            tui.chat.focus = None;
            tui.transcript.scroll.scroll_to_bottom();
            vec![UiEffect::SendChat {
                task: None,
                request: pending.request,
            }]
        }
        Err(rejected) => {
            log_rejected("send", rejected);
            vec![]
        }
    }
}

pub fn regenerate(tui: &mut TuiState) -> Vec<UiEffect> {
    let Some(id) = tui.chat.target().cloned() else {
        return vec![];
    };
    match tui.chat.conversation.begin_regenerate(&id) {
        Ok(pending) => vec![UiEffect::SendChat {
            task: None,
            request: pending.request,
        }],
        Err(rejected) => {
            log_rejected("regenerate", rejected);
            vec![]
        }
    }
}

pub fn switch_model(tui: &mut TuiState, id: &MessageId, model: &str) -> Vec<UiEffect> {
    match tui.chat.conversation.begin_switch_model(id, model) {
        Ok(pending) => vec![UiEffect::SendChat {
            task: None,
            request: pending.request,
        }],
        Err(rejected) => {
            log_rejected("switch model", rejected);
            vec![]
        }
    }
}

pub fn navigate(tui: &mut TuiState, direction: Direction) -> bool {
    let Some(id) = tui.chat.target().cloned() else {
        return false;
    };
    tui.chat.conversation.navigate_variation(&id, direction)
}

/// Abandons the outstanding request, if any.
///
/// The late response is dropped because the chat task is no longer active.
pub fn cancel(tui: &mut TuiState) -> Vec<UiEffect> {
    if !tui.chat.conversation.cancel_pending() {
        return vec![];
    }
    let token = tui.tasks.chat.take_cancel();
    let last = tui.chat.conversation.transcript().messages().last().map(|m| m.id.clone());
    tui.transcript.push_note(last.as_ref(), CANCELLED_NOTE);
    vec![UiEffect::CancelTask {
        kind: TaskKind::Chat,
        token,
    }]
}

/// Applies the chat task's result to the conversation.
pub fn handle_reply(tui: &mut TuiState, outcome: Result<ChatResponse, String>) -> Vec<UiEffect> {
    if let Err(error) = &outcome {
        tracing::warn!("chat request failed: {error}");
    }
    match tui.chat.conversation.complete(outcome) {
        Completion::Replied { .. } | Completion::ReplyFailed { .. } => {
            tui.transcript.scroll.scroll_to_bottom();
        }
        Completion::VariationAdded {
            message_id,
            truncated,
            ..
        } => {
            if truncated > 0 {
                tracing::debug!(%message_id, truncated, "dropped messages after new variation");
            }
        }
        Completion::VariationFailed { .. } => {}
        Completion::Dropped => tracing::debug!("chat reply arrived with nothing pending"),
    }
    vec![]
}

/// Starts a fresh local chat. The backend assigns its id on first send.
pub fn new_chat(tui: &mut TuiState) -> Vec<UiEffect> {
    let effects = abandon_requests(tui);
    let model = tui.chat.conversation.model().to_string();
    tui.chat.replace(Conversation::new(model));
    tui.transcript.reset();
    effects
}

pub fn open_chat(id: String) -> Vec<UiEffect> {
    vec![UiEffect::LoadChat { task: None, id }]
}

pub fn delete_chat(id: String) -> Vec<UiEffect> {
    vec![UiEffect::DeleteChat { task: None, id }]
}

/// Replaces the conversation with stored history.
pub fn load_record(tui: &mut TuiState, record: &ChatRecord) -> Vec<UiEffect> {
    let effects = abandon_requests(tui);
    let model = tui.chat.conversation.model().to_string();
    tui.chat.replace(Conversation::from_record(record, model));
    tui.transcript.reset();
    effects
}

/// Handles a confirmed deletion; deleting the open chat resets the view.
pub fn handle_deleted(tui: &mut TuiState, id: &str) -> Vec<UiEffect> {
    let mut effects = Vec::new();
    if tui.chat.conversation.chat_id() == Some(id) {
        effects = new_chat(tui);
    }
    let last = tui.chat.conversation.transcript().messages().last().map(|m| m.id.clone());
    tui.transcript.push_note(last.as_ref(), "Chat deleted");
    effects.push(UiEffect::LoadChatList { task: None });
    effects
}

/// Copies the current content of the targeted message.
pub fn copy_target(tui: &TuiState) -> Vec<UiEffect> {
    let transcript = tui.chat.conversation.transcript();
    let message = tui
        .chat
        .target()
        .and_then(|id| transcript.get(id))
        .or_else(|| transcript.messages().last());
    match message {
        Some(message) => vec![UiEffect::CopyToClipboard {
            text: message.content().to_string(),
        }],
        None => vec![],
    }
}

/// Opens the media of the targeted message with the system handler.
pub fn open_target_media(tui: &mut TuiState) -> Vec<UiEffect> {
    let url = target_media_url(tui).map(|url| tui.client.absolute_url(url));
    match url {
        Some(url) => vec![UiEffect::OpenBrowser { url }],
        None => {
            push_media_note(tui, NO_MEDIA_NOTE);
            vec![]
        }
    }
}

/// Downloads the media of the targeted message into the download directory.
pub fn save_target_media(tui: &mut TuiState) -> Vec<UiEffect> {
    let Some(url) = target_media_url(tui) else {
        push_media_note(tui, NO_MEDIA_NOTE);
        return vec![];
    };
    let Some(media) = MediaRef::parse(url) else {
        push_media_note(tui, "This media is not stored with the chat");
        return vec![];
    };
    if tui.tasks.media_save.is_running() {
        return vec![];
    }
    vec![UiEffect::SaveMedia {
        task: None,
        media,
        dir: tui.config.download_dir(),
    }]
}

const NO_MEDIA_NOTE: &str = "No image or audio on this message";

fn target_media_url(tui: &TuiState) -> Option<&str> {
    let transcript = tui.chat.conversation.transcript();
    tui.chat
        .target()
        .and_then(|id| transcript.get(id))
        .and_then(|m| m.current().media_url.as_deref())
}

fn push_media_note(tui: &mut TuiState, note: &str) {
    let last = tui
        .chat
        .conversation
        .transcript()
        .messages()
        .last()
        .map(|m| m.id.clone());
    tui.transcript.push_note(last.as_ref(), note);
}

/// Cancels the chat request and forgets loads that would replace the
/// conversation.
fn abandon_requests(tui: &mut TuiState) -> Vec<UiEffect> {
    let mut effects = Vec::new();
    tui.chat.conversation.cancel_pending();
    if tui.tasks.chat.is_running() {
        effects.push(UiEffect::CancelTask {
            kind: TaskKind::Chat,
            token: tui.tasks.chat.take_cancel(),
        });
    }
    tui.tasks.chat_load.clear();
    effects
}

fn log_rejected(action: &str, rejected: Rejected) {
    tracing::debug!(action, %rejected, "conversation rejected action");
}
