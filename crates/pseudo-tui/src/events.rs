//! UI event types.
//!
//! Every input the reducer sees is a `UiEvent`: terminal input, frame ticks
//! and the results of background work.
//!
//! ## Inbox Pattern
//!
//! Handlers never touch state. They return a `UiEvent` which the runtime
//! pushes into its inbox channel; the event loop drains the inbox each frame.
//!
//! ## Task Lifecycle Events
//!
//! - The runtime emits `UiEvent::TaskStarted` when it spawns a task
//! - The runtime emits `UiEvent::TaskCompleted` wrapping the handler's result
//! - The reducer is the only place that mutates `TaskState`
//!
//! ## Cancellation Convention
//!
//! Cancelable tasks get a `CancellationToken` carried in `TaskStarted`. The
//! task `select!`s on `token.cancelled()` against the request, and the
//! reducer cancels through `UiEffect::CancelTask`.

use std::path::PathBuf;

use crossterm::event::Event as CrosstermEvent;
use pseudo_core::api::{ChatRecord, ChatResponse, ChatSummary, ModelOption};

use crate::common::{TaskCompleted, TaskKind, TaskStarted};
use crate::overlays::ModelPickerMode;

#[derive(Debug)]
pub enum UiEvent {
    /// Animation and render cadence.
    Tick,

    /// Current terminal size, inserted before every batch of events.
    Frame { width: u16, height: u16 },

    Terminal(CrosstermEvent),

    TaskStarted {
        kind: TaskKind,
        started: TaskStarted,
    },

    TaskCompleted {
        kind: TaskKind,
        completed: TaskCompleted<Box<UiEvent>>,
    },

    /// Outcome of `POST /api/chat` for the pending send or variation.
    ChatReplied { outcome: Result<ChatResponse, String> },

    History(HistoryUiEvent),

    Models(ModelsUiEvent),

    ClipboardCopied,

    ClipboardFailed { error: String },

    MediaSaved { path: PathBuf },

    MediaSaveFailed { error: String },
}

/// Results of chat history requests.
#[derive(Debug)]
pub enum HistoryUiEvent {
    ListLoaded { chats: Vec<ChatSummary> },
    ListFailed { error: String },
    Loaded { record: ChatRecord },
    LoadFailed { id: String, error: String },
    Deleted { id: String },
    DeleteFailed { id: String, error: String },
}

#[derive(Debug)]
pub enum ModelsUiEvent {
    Loaded {
        models: Vec<ModelOption>,
        mode: ModelPickerMode,
    },
    Failed {
        error: String,
    },
}
