//! Background task bookkeeping.
//!
//! Every network call runs as a task with a fresh [`TaskId`]. The reducer
//! marks the id active when it emits the effect and applies a completion only
//! when its id is still the active one for that kind, so cancelled or
//! superseded results fall on the floor.

use std::time::Instant;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Chat,
    ChatList,
    ChatLoad,
    ChatDelete,
    Models,
    MediaSave,
}

#[derive(Debug, Clone, Default)]
pub enum TaskMeta {
    #[default]
    None,
    /// A chat request; `model` is what the status line shows while waiting.
    Chat { model: String },
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub cancel: Option<CancellationToken>,
    pub meta: TaskMeta,
}

#[derive(Debug)]
pub struct TaskCompleted<E> {
    pub id: TaskId,
    pub result: E,
}

/// Task lifecycle state (owned by the view state, mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub cancel: Option<CancellationToken>,
    pub meta: TaskMeta,
    pub started_at: Option<Instant>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Makes `id` the running task of this kind, superseding any other.
    pub fn begin(&mut self, id: TaskId) {
        self.clear();
        self.active = Some(id);
        self.started_at = Some(Instant::now());
    }

    /// Attaches the runtime's cancel token and metadata.
    ///
    /// Returns false when the task was cancelled or superseded before the
    /// runtime reported it.
    pub fn on_started(&mut self, started: &TaskStarted) -> bool {
        if self.active != Some(started.id) {
            return false;
        }
        self.cancel = started.cancel.clone();
        self.meta = started.meta.clone();
        true
    }

    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.clear();
        }
        ok
    }

    /// Forgets the active task and hands back its cancel token, if any.
    pub fn take_cancel(&mut self) -> Option<CancellationToken> {
        let token = self.cancel.take();
        self.clear();
        token
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.cancel = None;
        self.meta = TaskMeta::None;
        self.started_at = None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub chat: TaskState,
    pub chat_list: TaskState,
    pub chat_load: TaskState,
    pub chat_delete: TaskState,
    pub models: TaskState,
    pub media_save: TaskState,
}

impl Tasks {
    pub fn state(&self, kind: TaskKind) -> &TaskState {
        match kind {
            TaskKind::Chat => &self.chat,
            TaskKind::ChatList => &self.chat_list,
            TaskKind::ChatLoad => &self.chat_load,
            TaskKind::ChatDelete => &self.chat_delete,
            TaskKind::Models => &self.models,
            TaskKind::MediaSave => &self.media_save,
        }
    }

    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::Chat => &mut self.chat,
            TaskKind::ChatList => &mut self.chat_list,
            TaskKind::ChatLoad => &mut self.chat_load,
            TaskKind::ChatDelete => &mut self.chat_delete,
            TaskKind::Models => &mut self.models,
            TaskKind::MediaSave => &mut self.media_save,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.chat.is_running()
            || self.chat_list.is_running()
            || self.chat_load.is_running()
            || self.chat_delete.is_running()
            || self.models.is_running()
            || self.media_save.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: u64) -> TaskStarted {
        TaskStarted {
            id: TaskId(id),
            cancel: Some(CancellationToken::new()),
            meta: TaskMeta::Chat {
                model: "Auto".into(),
            },
        }
    }

    #[test]
    fn test_finish_only_matches_active_id() {
        let mut state = TaskState::default();
        state.begin(TaskId(1));
        state.begin(TaskId(2));
        assert!(!state.on_started(&started(1)));
        assert!(state.on_started(&started(2)));

        assert!(!state.finish_if_active(TaskId(1)));
        assert!(state.is_running());
        assert!(state.finish_if_active(TaskId(2)));
        assert!(!state.is_running());
        assert!(state.started_at.is_none());
    }

    #[test]
    fn test_take_cancel_clears_state() {
        let mut state = TaskState::default();
        state.begin(TaskId(7));
        assert!(state.on_started(&started(7)));

        let token = state.take_cancel();
        assert!(token.is_some());
        assert!(!state.is_running());
        assert!(!state.finish_if_active(TaskId(7)));
    }

    #[test]
    fn test_started_after_cancel_is_rejected() {
        let mut state = TaskState::default();
        state.begin(TaskId(3));
        assert!(state.take_cancel().is_none());
        assert!(!state.on_started(&started(3)));
        assert!(!state.is_running());
    }

    #[test]
    fn test_seq_is_monotonic() {
        let mut seq = TaskSeq::default();
        assert_eq!(seq.next_id(), TaskId(0));
        assert_eq!(seq.next_id(), TaskId(1));
    }
}
