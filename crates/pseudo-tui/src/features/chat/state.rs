use pseudo_core::conversation::Conversation;
use pseudo_core::transcript::MessageId;

#[derive(Debug, Default)]
pub struct ChatState {
    pub conversation: Conversation,
    /// Assistant message picked with Alt+↑/↓. `None` means "the last one".
    pub focus: Option<MessageId>,
    /// Set when focus moved; the next layout pass scrolls it into view.
    pub reveal_focus: bool,
}

impl ChatState {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(model),
            focus: None,
            reveal_focus: false,
        }
    }

    /// Replaces the conversation and drops focus.
    pub fn replace(&mut self, conversation: Conversation) {
        self.conversation = conversation;
        self.focus = None;
        self.reveal_focus = false;
    }

    /// Explicit focus, if it still names an assistant message.
    pub fn focused(&self) -> Option<&MessageId> {
        let transcript = self.conversation.transcript();
        self.focus
            .as_ref()
            .filter(|id| transcript.get(id).is_some_and(|m| m.is_assistant()))
    }

    /// Message that regenerate, switch, navigate and copy act on.
    pub fn target(&self) -> Option<&MessageId> {
        self.focused()
            .or_else(|| self.conversation.transcript().last_assistant_id())
    }

    /// Moves focus to the previous assistant message.
    ///
    /// Without explicit focus the walk starts at the last assistant message,
    /// which is what actions already target.
    pub fn focus_previous(&mut self) -> bool {
        let transcript = self.conversation.transcript();
        let Some(from) = self.target() else {
            return false;
        };
        let next = if self.focused().is_some() {
            transcript.previous_assistant_id(Some(from)).cloned()
        } else {
            transcript
                .previous_assistant_id(Some(from))
                .or(Some(from))
                .cloned()
        };
        self.set_focus(next)
    }

    /// Moves focus to the next assistant message; past the last one focus
    /// is released.
    pub fn focus_next(&mut self) -> bool {
        let Some(from) = self.focused() else {
            return false;
        };
        let next = self
            .conversation
            .transcript()
            .next_assistant_id(from)
            .cloned();
        if next.is_none() {
            self.focus = None;
            self.reveal_focus = true;
            return true;
        }
        self.set_focus(next)
    }

    fn set_focus(&mut self, next: Option<MessageId>) -> bool {
        if next.is_none() || next == self.focus {
            return false;
        }
        self.focus = next;
        self.reveal_focus = true;
        true
    }
}
