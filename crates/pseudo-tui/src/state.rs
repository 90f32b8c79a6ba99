//! Application state composition.
//!
//! ```text
//! AppState
//! ├── tui: TuiState
//! │   ├── input: InputState           (draft message)
//! │   ├── transcript: TranscriptState (scroll, viewport, notes)
//! │   ├── chat: ChatState             (conversation, focus)
//! │   ├── task_seq: TaskSeq           (async task id generator)
//! │   └── tasks: Tasks                (task lifecycle state)
//! └── overlay: Option<Overlay>        (pickers)
//! ```
//!
//! Overlays live beside `TuiState` so an overlay handler can hold
//! `&mut Overlay` and `&TuiState` at the same time.

use pseudo_core::api::ApiClient;
use pseudo_core::config::Config;

use crate::chat::ChatState;
use crate::common::{TaskKind, TaskSeq, Tasks};
use crate::input::InputState;
use crate::overlays::Overlay;
use crate::transcript::TranscriptState;

pub struct AppState {
    pub tui: TuiState,
    pub overlay: Option<Overlay>,
}

impl AppState {
    pub fn new(config: Config, client: ApiClient) -> Self {
        Self {
            tui: TuiState::new(config, client),
            overlay: None,
        }
    }
}

pub struct TuiState {
    pub should_quit: bool,
    pub input: InputState,
    pub transcript: TranscriptState,
    pub chat: ChatState,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
    /// Loaded configuration; `model` is the default for new chats.
    pub config: Config,
    /// Backend client. The reducer only reads it (URL resolution); the
    /// runtime clones it into tasks.
    pub client: ApiClient,
    pub spinner_frame: usize,
}

impl TuiState {
    pub fn new(config: Config, client: ApiClient) -> Self {
        let chat = ChatState::new(config.model.clone());
        Self {
            should_quit: false,
            input: InputState::new(),
            transcript: TranscriptState::new(),
            chat,
            task_seq: TaskSeq::default(),
            tasks: Tasks::default(),
            config,
            client,
            spinner_frame: 0,
        }
    }

    /// True while a chat request is outstanding.
    pub fn is_awaiting_reply(&self) -> bool {
        self.chat.conversation.is_awaiting()
    }

    /// Short description of background work for the status line.
    pub fn busy_label(&self) -> Option<&'static str> {
        if self.is_awaiting_reply() {
            return None;
        }
        [
            (TaskKind::ChatLoad, "Loading chat..."),
            (TaskKind::ChatList, "Loading chats..."),
            (TaskKind::ChatDelete, "Deleting chat..."),
            (TaskKind::Models, "Loading models..."),
            (TaskKind::MediaSave, "Saving media..."),
        ]
        .into_iter()
        .find(|(kind, _)| self.tasks.state(*kind).is_running())
        .map(|(_, label)| label)
    }
}
