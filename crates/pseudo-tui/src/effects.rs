//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They cover I/O and task spawning only; state changes stay in the reducer.
//!
//! Effects that start a task carry `task: Option<TaskId>`. Feature code emits
//! them with `None`; the reducer stamps a fresh id and marks it active before
//! handing them to the runtime, which skips unstamped ones.

use std::path::PathBuf;

use pseudo_core::api::{ChatRequest, MediaRef};
use tokio_util::sync::CancellationToken;

use crate::common::{TaskId, TaskKind, TaskSeq, Tasks};
use crate::overlays::ModelPickerMode;

#[derive(Debug)]
pub enum UiEffect {
    Quit,

    /// `POST /api/chat` for the request the conversation just began.
    SendChat {
        task: Option<TaskId>,
        request: ChatRequest,
    },

    /// Cancel an in-progress task by firing its token.
    CancelTask {
        kind: TaskKind,
        token: Option<CancellationToken>,
    },

    /// Fetch the chat list, then open the history picker.
    LoadChatList { task: Option<TaskId> },

    /// Fetch a stored chat and replace the conversation with it.
    LoadChat { task: Option<TaskId>, id: String },

    DeleteChat { task: Option<TaskId>, id: String },

    /// Fetch selectable models, then open the model picker in `mode`.
    LoadModels {
        task: Option<TaskId>,
        mode: ModelPickerMode,
    },

    /// Write the default model to the config file.
    PersistModel { model: String },

    CopyToClipboard { text: String },

    /// Open a URL (generated media) with the system handler.
    OpenBrowser { url: String },

    /// Download a media file into `dir`.
    SaveMedia {
        task: Option<TaskId>,
        media: MediaRef,
        dir: PathBuf,
    },
}

impl UiEffect {
    fn task_slot(&mut self) -> Option<(TaskKind, &mut Option<TaskId>)> {
        match self {
            UiEffect::SendChat { task, .. } => Some((TaskKind::Chat, task)),
            UiEffect::LoadChatList { task } => Some((TaskKind::ChatList, task)),
            UiEffect::LoadChat { task, .. } => Some((TaskKind::ChatLoad, task)),
            UiEffect::DeleteChat { task, .. } => Some((TaskKind::ChatDelete, task)),
            UiEffect::LoadModels { task, .. } => Some((TaskKind::Models, task)),
            UiEffect::SaveMedia { task, .. } => Some((TaskKind::MediaSave, task)),
            UiEffect::Quit
            | UiEffect::CancelTask { .. }
            | UiEffect::PersistModel { .. }
            | UiEffect::CopyToClipboard { .. }
            | UiEffect::OpenBrowser { .. } => None,
        }
    }
}

/// Gives every task-starting effect that lacks one a fresh id and makes it
/// the active task of its kind.
pub fn begin_tasks(seq: &mut TaskSeq, tasks: &mut Tasks, effects: &mut [UiEffect]) {
    for effect in effects {
        if let Some((kind, slot)) = effect.task_slot()
            && slot.is_none()
        {
            let id = seq.next_id();
            *slot = Some(id);
            tasks.state_mut(kind).begin(id);
        }
    }
}
