//! Transcript model: messages, variations and the tail-truncation rule.
//!
//! A transcript is an ordered list of messages. Assistant messages own a
//! non-empty [`VariationSet`]; regenerating or switching model adds a
//! variation instead of a new message. User messages carry exactly one
//! variation holding their text.

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ChatRecord, ChatResponse, Mode};

/// Assistant text recorded when a send fails.
pub const SEND_FAILED_TEXT: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Variation text recorded when a regenerate or model switch fails.
pub const VARIATION_FAILED_TEXT: &str = "Failed to generate response";

/// Client-generated message id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One rendered content of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    pub content: String,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub mode: Option<Mode>,
    /// Server path or absolute URL of generated media.
    pub media_url: Option<String>,
    /// Set for the fixed failure texts.
    pub is_error: bool,
}

impl Variation {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            provider: None,
            mode: None,
            media_url: None,
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(content)
        }
    }

    pub fn from_response(response: &ChatResponse) -> Self {
        let mode = response.mode();
        let media_url = mode
            .filter(|m| m.is_media())
            .and(response.url.clone())
            .filter(|u| !u.trim().is_empty());
        Self {
            content: response.text(),
            model: response.model.clone().filter(|m| !m.is_empty()),
            provider: response.provider.clone().filter(|p| !p.is_empty()),
            mode,
            media_url,
            is_error: false,
        }
    }

    /// `"{Mode} | {provider} - {model}"`, degrading to whatever is known.
    pub fn attribution(&self) -> Option<String> {
        let source = match (self.provider.as_deref(), self.model.as_deref()) {
            (Some(provider), Some(model)) => Some(format!("{provider} - {model}")),
            (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
            (None, None) => None,
        };
        match (self.mode, source) {
            (Some(mode), Some(source)) => Some(format!("{mode} | {source}")),
            (Some(mode), None) => Some(mode.to_string()),
            (None, Some(source)) => Some(source),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Ordered alternatives with a current index. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationSet {
    items: Vec<Variation>,
    current: usize,
}

impl VariationSet {
    pub fn new(first: Variation) -> Self {
        Self {
            items: vec![first],
            current: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Variation {
        &self.items[self.current]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variation> {
        self.items.iter()
    }

    /// Appends a variation and makes it current. Returns its index.
    pub fn push(&mut self, variation: Variation) -> usize {
        self.items.push(variation);
        self.current = self.items.len() - 1;
        self.current
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        match direction {
            Direction::Previous => self.current > 0,
            Direction::Next => self.current + 1 < self.items.len(),
        }
    }

    /// Moves the current index by one, clamped. Returns whether it moved.
    pub fn navigate(&mut self, direction: Direction) -> bool {
        if !self.can_move(direction) {
            return false;
        }
        match direction {
            Direction::Previous => self.current -= 1,
            Direction::Next => self.current += 1,
        }
        true
    }

    /// One-based position indicator, e.g. `2 / 3`.
    pub fn indicator(&self) -> String {
        format!("{} / {}", self.current + 1, self.items.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    /// RFC 3339 creation time.
    pub timestamp: String,
    /// For assistant messages: the user message that prompted it.
    pub previous_message_id: Option<MessageId>,
    variations: VariationSet,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::User,
            timestamp: now_timestamp(),
            previous_message_id: None,
            variations: VariationSet::new(Variation::text(content)),
        }
    }

    pub fn assistant(variation: Variation, previous_message_id: Option<MessageId>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            timestamp: now_timestamp(),
            previous_message_id,
            variations: VariationSet::new(variation),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Content of the current variation.
    pub fn content(&self) -> &str {
        &self.variations.current().content
    }

    pub fn current(&self) -> &Variation {
        self.variations.current()
    }

    pub fn variations(&self) -> &VariationSet {
        &self.variations
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn to_record(&self) -> MessageRecord {
        MessageRecord {
            id: self.id.clone(),
            role: self.role,
            content: self.content().to_string(),
            timestamp: self.timestamp.clone(),
            previous_message_id: self.previous_message_id.clone(),
        }
    }
}

/// Flat, serializable view of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
    pub previous_message_id: Option<MessageId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a transcript from stored backend history.
    ///
    /// Each assistant message links to the closest preceding user message.
    /// Unknown roles are skipped.
    pub fn from_record(record: &ChatRecord) -> Self {
        let mut transcript = Self::new();
        let mut last_user: Option<MessageId> = None;

        for stored in &record.messages {
            let message = match stored.role.as_str() {
                "user" => {
                    let message = Message::user(&stored.content);
                    last_user = Some(message.id.clone());
                    message
                }
                "assistant" => {
                    let mode = stored.mode();
                    let variation = Variation {
                        content: stored.content.clone(),
                        model: stored.model.clone(),
                        provider: stored.provider.clone(),
                        mode,
                        media_url: stored.media_path(&record.id),
                        is_error: false,
                    };
                    Message::assistant(variation, last_user.clone())
                }
                other => {
                    tracing::debug!(role = other, "skipping stored message with unknown role");
                    continue;
                }
            };
            let message = match &stored.timestamp {
                Some(ts) if !ts.is_empty() => message.with_timestamp(ts.clone()),
                _ => message,
            };
            transcript.messages.push(message);
        }

        transcript
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    pub fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        let message = Message::user(content);
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    pub fn push_assistant(
        &mut self,
        variation: Variation,
        previous_message_id: Option<MessageId>,
    ) -> MessageId {
        let message = Message::assistant(variation, previous_message_id);
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// The user message an assistant message answers.
    ///
    /// `None` if `id` is unknown, not an assistant message, or its link does
    /// not point at an earlier user message.
    pub fn parent_of(&self, id: &MessageId) -> Option<&Message> {
        let pos = self.position(id)?;
        let message = &self.messages[pos];
        if !message.is_assistant() {
            return None;
        }
        let parent_id = message.previous_message_id.as_ref()?;
        self.messages[..pos]
            .iter()
            .find(|m| &m.id == parent_id && m.role == Role::User)
    }

    /// Appends a variation to an assistant message and makes it current.
    ///
    /// Returns the new variation index, or `None` if `id` is not an assistant message.
    pub fn add_variation(&mut self, id: &MessageId, variation: Variation) -> Option<usize> {
        let message = self
            .messages
            .iter_mut()
            .find(|m| &m.id == id && m.is_assistant())?;
        Some(message.variations.push(variation))
    }

    /// Drops every message after `id`. Returns how many were removed.
    pub fn truncate_after(&mut self, id: &MessageId) -> usize {
        let Some(pos) = self.position(id) else {
            return 0;
        };
        let removed = self.messages.len() - (pos + 1);
        self.messages.truncate(pos + 1);
        removed
    }

    /// Moves the current variation of `id`. Returns whether anything changed.
    pub fn navigate_variation(&mut self, id: &MessageId, direction: Direction) -> bool {
        self.messages
            .iter_mut()
            .find(|m| &m.id == id)
            .is_some_and(|m| m.variations.navigate(direction))
    }

    /// Removes a message only if it is the last one.
    pub fn pop_if_last(&mut self, id: &MessageId) -> bool {
        if self.messages.last().is_some_and(|m| &m.id == id) {
            self.messages.pop();
            true
        } else {
            false
        }
    }

    pub fn last_assistant_id(&self) -> Option<&MessageId> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| &m.id)
    }

    /// Nearest assistant message before `id` (or the last one if `id` is `None`).
    pub fn previous_assistant_id(&self, id: Option<&MessageId>) -> Option<&MessageId> {
        let end = match id {
            Some(id) => self.position(id)?,
            None => self.messages.len(),
        };
        self.messages[..end]
            .iter()
            .rev()
            .find(|m| m.is_assistant())
            .map(|m| &m.id)
    }

    /// Nearest assistant message after `id`.
    pub fn next_assistant_id(&self, id: &MessageId) -> Option<&MessageId> {
        let start = self.position(id)? + 1;
        self.messages[start..]
            .iter()
            .find(|m| m.is_assistant())
            .map(|m| &m.id)
    }

    pub fn to_records(&self) -> Vec<MessageRecord> {
        self.messages.iter().map(Message::to_record).collect()
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn exchange(t: &mut Transcript, user: &str, reply: &str) -> (MessageId, MessageId) {
        let u = t.push_user(user);
        let a = t.push_assistant(Variation::text(reply), Some(u.clone()));
        (u, a)
    }

    #[test]
    fn test_variation_set_navigation_is_clamped() {
        let mut set = VariationSet::new(Variation::text("a"));
        assert!(!set.navigate(Direction::Previous));
        assert!(!set.navigate(Direction::Next));
        assert_eq!(set.indicator(), "1 / 1");

        set.push(Variation::text("b"));
        set.push(Variation::text("c"));
        assert_eq!(set.current_index(), 2);
        assert!(!set.can_move(Direction::Next));
        assert!(!set.navigate(Direction::Next));

        assert!(set.navigate(Direction::Previous));
        assert!(set.navigate(Direction::Previous));
        assert!(!set.navigate(Direction::Previous));
        assert_eq!(set.current_index(), 0);
        assert_eq!(set.current().content, "a");
        assert_eq!(set.indicator(), "1 / 3");
    }

    #[test]
    fn test_parent_of_requires_earlier_user_message() {
        let mut t = Transcript::new();
        let (u, a) = exchange(&mut t, "Hello", "Hi");
        assert_eq!(t.parent_of(&a).map(|m| &m.id), Some(&u));
        assert!(t.parent_of(&u).is_none(), "user messages have no parent");
        assert!(t.parent_of(&MessageId::from("nope")).is_none());

        let orphan = t.push_assistant(Variation::text("?"), None);
        assert!(t.parent_of(&orphan).is_none());

        let dangling = t.push_assistant(Variation::text("?"), Some(MessageId::from("gone")));
        assert!(t.parent_of(&dangling).is_none());
    }

    #[test]
    fn test_add_variation_only_on_assistant() {
        let mut t = Transcript::new();
        let (u, a) = exchange(&mut t, "Hello", "Hi");
        assert_eq!(t.add_variation(&u, Variation::text("x")), None);
        assert_eq!(t.add_variation(&a, Variation::text("Hey")), Some(1));
        assert_eq!(t.get(&a).unwrap().content(), "Hey");
        assert_eq!(t.get(&a).unwrap().variations().count(), 2);
    }

    #[test]
    fn test_truncate_after_removes_tail() {
        let mut t = Transcript::new();
        let (_, a1) = exchange(&mut t, "one", "1");
        exchange(&mut t, "two", "2");
        exchange(&mut t, "three", "3");

        assert_eq!(t.truncate_after(&a1), 4);
        assert_eq!(t.len(), 2);
        assert_eq!(t.messages().last().unwrap().id, a1);
        assert_eq!(t.truncate_after(&MessageId::from("missing")), 0);
    }

    #[test]
    fn test_assistant_focus_walk() {
        let mut t = Transcript::new();
        let (u1, a1) = exchange(&mut t, "one", "1");
        let (_, a2) = exchange(&mut t, "two", "2");

        assert_eq!(t.last_assistant_id(), Some(&a2));
        assert_eq!(t.previous_assistant_id(None), Some(&a2));
        assert_eq!(t.previous_assistant_id(Some(&a2)), Some(&a1));
        assert_eq!(t.previous_assistant_id(Some(&a1)), None);
        assert_eq!(t.next_assistant_id(&a1), Some(&a2));
        assert_eq!(t.next_assistant_id(&u1), Some(&a1));
        assert_eq!(t.next_assistant_id(&a2), None);
    }

    #[test]
    fn test_pop_if_last() {
        let mut t = Transcript::new();
        let (u, a) = exchange(&mut t, "one", "1");
        assert!(!t.pop_if_last(&u));
        assert!(t.pop_if_last(&a));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_attribution_formats() {
        let mut v = Variation::text("x");
        assert_eq!(v.attribution(), None);
        v.mode = Some(Mode::Text);
        assert_eq!(v.attribution().as_deref(), Some("Text"));
        v.provider = Some("openai".to_string());
        assert_eq!(v.attribution().as_deref(), Some("Text | openai"));
        v.model = Some("gpt-4".to_string());
        assert_eq!(v.attribution().as_deref(), Some("Text | openai - gpt-4"));
        v.mode = None;
        assert_eq!(v.attribution().as_deref(), Some("openai - gpt-4"));
    }

    #[test]
    fn test_variation_from_media_response() {
        let response: ChatResponse = serde_json::from_value(json!({
            "type": "image",
            "url": "/chat_history/c1/media/image_1.png",
            "response": "Generated content",
            "chat_id": "c1"
        }))
        .unwrap();
        let v = Variation::from_response(&response);
        assert_eq!(v.mode, Some(Mode::Image));
        assert_eq!(
            v.media_url.as_deref(),
            Some("/chat_history/c1/media/image_1.png")
        );

        let text: ChatResponse = serde_json::from_value(
            json!({"response": "hi", "selected_mode": "text", "url": "/ignored"}),
        )
        .unwrap();
        assert_eq!(Variation::from_response(&text).media_url, None);
    }

    #[test]
    fn test_from_record_links_assistant_to_preceding_user() {
        let record: ChatRecord = serde_json::from_value(json!({
            "id": "c1",
            "title": "Hello",
            "messages": [
                {"role": "assistant", "content": "stray greeting"},
                {"role": "user", "content": "Hello", "timestamp": "2024-01-01T10:00:00"},
                {"role": "assistant", "content": "Hi", "mode": "text"},
                {"role": "system", "content": "ignored"},
                {"role": "user", "content": "Draw a cat"},
                {"role": "assistant", "content": "Generated content", "mode": "image", "media": "image_1.png"}
            ]
        }))
        .unwrap();

        let t = Transcript::from_record(&record);
        let msgs = t.messages();
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[0].previous_message_id, None);
        assert_eq!(msgs[1].timestamp, "2024-01-01T10:00:00");
        assert_eq!(msgs[2].previous_message_id.as_ref(), Some(&msgs[1].id));
        assert_eq!(msgs[4].previous_message_id.as_ref(), Some(&msgs[3].id));
        assert_eq!(
            msgs[4].current().media_url.as_deref(),
            Some("/chat_history/c1/media/image_1.png")
        );
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let mut t = Transcript::new();
        let (u, a) = exchange(&mut t, "Hello", "Hi");
        let records = t.to_records();
        let value = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "Hi");
        assert_eq!(value["previousMessageId"], u.as_str());
        assert_eq!(value["id"], a.as_str());
        assert!(serde_json::to_value(&records[0]).unwrap()["previousMessageId"].is_null());
    }
}
