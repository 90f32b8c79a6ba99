use super::InputBuffer;
use crate::mutations::InputMutation;

/// Draft message plus the prompts sent in this session.
#[derive(Debug, Default)]
pub struct InputState {
    pub buffer: InputBuffer,
    history: Vec<String>,
    /// Position in `history` while browsing with ↑/↓.
    history_index: Option<usize>,
    /// Draft saved when browsing starts, restored past the newest entry.
    saved_draft: Option<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.buffer.text().to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.text().trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.reset_navigation();
    }

    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
    }

    pub fn apply(&mut self, mutation: InputMutation) {
        match mutation {
            InputMutation::Clear => self.clear(),
        }
    }

    /// Records a sent prompt; repeats of the newest entry are skipped.
    pub fn remember(&mut self, text: &str) {
        if self.history.last().is_some_and(|last| last == text) {
            return;
        }
        self.history.push(text.to_string());
    }

    pub fn reset_navigation(&mut self) {
        self.history_index = None;
        self.saved_draft = None;
    }

    /// ↑ browses history only from the first line of the draft.
    pub fn should_navigate_up(&self) -> bool {
        let text = self.buffer.text();
        !self.history.is_empty() && !text[..self.buffer.cursor()].contains('\n')
    }

    /// ↓ browses history only while browsing and on the last line.
    pub fn should_navigate_down(&self) -> bool {
        let text = self.buffer.text();
        self.history_index.is_some() && !text[self.buffer.cursor()..].contains('\n')
    }

    pub fn navigate_up(&mut self) {
        let index = match self.history_index {
            None => {
                self.saved_draft = Some(self.text());
                self.history.len().saturating_sub(1)
            }
            Some(0) => return,
            Some(i) => i - 1,
        };
        if let Some(entry) = self.history.get(index).cloned() {
            self.history_index = Some(index);
            self.buffer.set_text(&entry);
        }
    }

    pub fn navigate_down(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if let Some(entry) = self.history.get(index + 1).cloned() {
            self.history_index = Some(index + 1);
            self.buffer.set_text(&entry);
        } else {
            let draft = self.saved_draft.take().unwrap_or_default();
            self.history_index = None;
            self.buffer.set_text(&draft);
        }
    }
}
