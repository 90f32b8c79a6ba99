//! Conversation controller.
//!
//! Pure state transitions around a [`Transcript`]. Each user action is split
//! in two: `begin_*` validates it, mutates the transcript where needed and
//! returns the request to send; [`Conversation::complete`] applies whatever
//! the backend answered. Nothing here performs I/O, so the same functions back
//! both the terminal UI reducer and the awaitable [`crate::session::ChatSession`].

use std::fmt;

use crate::api::{AUTO_MODEL, ChatRecord, ChatRequest, ChatResponse, DEFAULT_CHAT_TITLE};
use crate::transcript::{
    Direction, MessageId, SEND_FAILED_TEXT, Transcript, VARIATION_FAILED_TEXT, Variation,
};

/// Longest title prefix kept when deriving a title from the first message.
const TITLE_MAX_CHARS: usize = 30;

/// Why a `begin_*` call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    EmptyInput,
    Busy,
    UnknownMessage,
    NotAssistant,
    MissingParent,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejected::EmptyInput => "message is empty",
            Rejected::Busy => "a request is already in progress",
            Rejected::UnknownMessage => "no such message",
            Rejected::NotAssistant => "not an assistant message",
            Rejected::MissingParent => "assistant message has no user message to answer",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Rejected {}

/// What an outstanding request will produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestTarget {
    /// A new assistant message answering `user_message_id`.
    Reply { user_message_id: MessageId },
    /// A new variation on an existing assistant message.
    Variation { assistant_message_id: MessageId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub target: RequestTarget,
    pub request: ChatRequest,
}

/// Result of applying a backend outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Replied {
        message_id: MessageId,
    },
    ReplyFailed {
        message_id: MessageId,
    },
    VariationAdded {
        message_id: MessageId,
        index: usize,
        truncated: usize,
    },
    VariationFailed {
        message_id: MessageId,
        index: usize,
    },
    /// Nothing was pending (cancelled) or the target is gone.
    Dropped,
}

impl Completion {
    /// Message the completion touched, if any.
    pub fn message_id(&self) -> Option<&MessageId> {
        match self {
            Completion::Replied { message_id }
            | Completion::ReplyFailed { message_id }
            | Completion::VariationAdded { message_id, .. }
            | Completion::VariationFailed { message_id, .. } => Some(message_id),
            Completion::Dropped => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Completion::ReplyFailed { .. } | Completion::VariationFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    transcript: Transcript,
    chat_id: Option<String>,
    title: Option<String>,
    model: String,
    pending: Option<RequestTarget>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(AUTO_MODEL)
    }
}

impl Conversation {
    /// Empty, local conversation. The backend assigns a chat id on first send.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(),
            chat_id: None,
            title: None,
            model: model.into(),
            pending: None,
        }
    }

    /// Conversation rebuilt from stored backend history.
    pub fn from_record(record: &ChatRecord, model: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::from_record(record),
            chat_id: Some(record.id.clone()),
            title: Some(record.title.clone()),
            model: model.into(),
            pending: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    /// Display title; `New Chat` until one is known.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_CHAT_TITLE)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn pending(&self) -> Option<&RequestTarget> {
        self.pending.as_ref()
    }

    pub fn is_awaiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Appends the user message and returns the request to send.
    ///
    /// # Errors
    /// `EmptyInput` for blank text, `Busy` while another request is pending.
    /// The transcript is unchanged on error.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingRequest, Rejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejected::EmptyInput);
        }
        if self.pending.is_some() {
            return Err(Rejected::Busy);
        }

        let user_message_id = self.transcript.push_user(text);
        if self.title.is_none() && self.chat_id.is_none() {
            self.title = Some(derive_title(text));
        }

        let target = RequestTarget::Reply { user_message_id };
        self.pending = Some(target.clone());
        Ok(PendingRequest {
            target,
            request: ChatRequest {
                message: text.to_string(),
                model: self.model.clone(),
                chat_id: self.chat_id.clone(),
                regenerate: false,
            },
        })
    }

    /// Re-asks the parent question of an assistant message with the current model.
    ///
    /// # Errors
    /// See [`Rejected`]. The transcript is unchanged on error.
    pub fn begin_regenerate(&mut self, id: &MessageId) -> Result<PendingRequest, Rejected> {
        let model = self.model.clone();
        self.begin_variation(id, model)
    }

    /// Like [`Self::begin_regenerate`] with `model`, which also becomes the
    /// conversation model for later sends.
    ///
    /// # Errors
    /// See [`Rejected`]. Neither the transcript nor the model change on error.
    pub fn begin_switch_model(
        &mut self,
        id: &MessageId,
        model: &str,
    ) -> Result<PendingRequest, Rejected> {
        let pending = self.begin_variation(id, model.to_string())?;
        self.model = model.to_string();
        Ok(pending)
    }

    fn begin_variation(
        &mut self,
        id: &MessageId,
        model: String,
    ) -> Result<PendingRequest, Rejected> {
        if self.pending.is_some() {
            return Err(Rejected::Busy);
        }
        let message = self.transcript.get(id).ok_or(Rejected::UnknownMessage)?;
        if !message.is_assistant() {
            return Err(Rejected::NotAssistant);
        }
        let parent = self
            .transcript
            .parent_of(id)
            .ok_or(Rejected::MissingParent)?;

        let request = ChatRequest {
            message: parent.content().to_string(),
            model,
            chat_id: self.chat_id.clone(),
            regenerate: true,
        };
        let target = RequestTarget::Variation {
            assistant_message_id: id.clone(),
        };
        self.pending = Some(target.clone());
        Ok(PendingRequest { target, request })
    }

    /// Applies the backend outcome of the pending request.
    ///
    /// Success on a reply appends an assistant message; success on a variation
    /// appends it, makes it current and drops every later message. Failures
    /// are recorded with the fixed texts and never truncate.
    pub fn complete<E: fmt::Display>(&mut self, outcome: Result<ChatResponse, E>) -> Completion {
        let Some(target) = self.pending.take() else {
            tracing::debug!("dropping chat outcome with nothing pending");
            return Completion::Dropped;
        };

        if let Err(err) = &outcome {
            tracing::debug!(error = %err, "chat request failed");
        }

        match (target, outcome) {
            (RequestTarget::Reply { user_message_id }, Ok(response)) => {
                self.adopt_identity(&response);
                let message_id = self
                    .transcript
                    .push_assistant(Variation::from_response(&response), Some(user_message_id));
                Completion::Replied { message_id }
            }
            (RequestTarget::Reply { user_message_id }, Err(_)) => {
                let message_id = self
                    .transcript
                    .push_assistant(Variation::error(SEND_FAILED_TEXT), Some(user_message_id));
                Completion::ReplyFailed { message_id }
            }
            (
                RequestTarget::Variation {
                    assistant_message_id,
                },
                Ok(response),
            ) => {
                let Some(index) = self
                    .transcript
                    .add_variation(&assistant_message_id, Variation::from_response(&response))
                else {
                    return Completion::Dropped;
                };
                self.adopt_identity(&response);
                let truncated = self.transcript.truncate_after(&assistant_message_id);
                Completion::VariationAdded {
                    message_id: assistant_message_id,
                    index,
                    truncated,
                }
            }
            (
                RequestTarget::Variation {
                    assistant_message_id,
                },
                Err(_),
            ) => {
                let Some(index) = self
                    .transcript
                    .add_variation(&assistant_message_id, Variation::error(VARIATION_FAILED_TEXT))
                else {
                    return Completion::Dropped;
                };
                Completion::VariationFailed {
                    message_id: assistant_message_id,
                    index,
                }
            }
        }
    }

    /// Forgets the pending request. A later [`Self::complete`] is dropped.
    ///
    /// The user message of a cancelled send stays in the transcript.
    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn navigate_variation(&mut self, id: &MessageId, direction: Direction) -> bool {
        self.transcript.navigate_variation(id, direction)
    }

    fn adopt_identity(&mut self, response: &ChatResponse) {
        if let Some(chat_id) = response.chat_id.as_deref().filter(|id| !id.is_empty()) {
            self.chat_id = Some(chat_id.to_string());
        }
        if let Some(title) = response.title.as_deref().filter(|t| !t.trim().is_empty()) {
            self.title = Some(title.to_string());
        }
    }
}

/// Chat title from the first user message: 30 characters, then `...`.
pub fn derive_title(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::transcript::Role;

    fn reply(text: &str) -> ChatResponse {
        serde_json::from_value(json!({
            "response": text,
            "chat_id": "c1",
            "selected_mode": "text",
            "provider": "openai",
            "model": "gpt-4"
        }))
        .unwrap()
    }

    fn failed() -> Result<ChatResponse, &'static str> {
        Err("connection refused")
    }

    fn said_hello(conv: &mut Conversation) -> MessageId {
        conv.begin_send("Hello").unwrap();
        conv.complete(Ok::<_, &str>(reply("Hi there")))
            .message_id()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_send_appends_user_then_assistant() {
        let mut conv = Conversation::default();
        let pending = conv.begin_send("Hello").unwrap();
        assert_eq!(pending.request.message, "Hello");
        assert_eq!(pending.request.model, AUTO_MODEL);
        assert_eq!(pending.request.chat_id, None);
        assert!(!pending.request.regenerate);
        assert_eq!(conv.transcript().len(), 1);
        assert!(conv.is_awaiting());

        let done = conv.complete(Ok::<_, &str>(reply("Hi there")));
        assert!(matches!(done, Completion::Replied { .. }));

        let msgs = conv.transcript().messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::User);
        assert_eq!(msgs[0].content(), "Hello");
        assert_eq!(msgs[1].role, Role::Assistant);
        assert_eq!(msgs[1].content(), "Hi there");
        assert_eq!(msgs[1].previous_message_id.as_ref(), Some(&msgs[0].id));
        assert_eq!(conv.chat_id(), Some("c1"));
        assert!(!conv.is_awaiting());
    }

    #[test]
    fn test_blank_input_is_rejected() {
        let mut conv = Conversation::default();
        assert_eq!(conv.begin_send(""), Err(Rejected::EmptyInput));
        assert_eq!(conv.begin_send("  \n\t"), Err(Rejected::EmptyInput));
        assert!(conv.transcript().is_empty());
        assert!(!conv.is_awaiting());
    }

    #[test]
    fn test_send_trims_surrounding_whitespace() {
        let mut conv = Conversation::default();
        let pending = conv.begin_send("  Hello \n").unwrap();
        assert_eq!(pending.request.message, "Hello");
        assert_eq!(conv.transcript().messages()[0].content(), "Hello");
        assert_eq!(conv.title(), "Hello");
    }

    #[test]
    fn test_busy_rejects_second_request() {
        let mut conv = Conversation::default();
        let a = said_hello(&mut conv);
        conv.begin_send("Again").unwrap();
        let before = conv.transcript().clone();

        assert_eq!(conv.begin_send("Third"), Err(Rejected::Busy));
        assert_eq!(conv.begin_regenerate(&a), Err(Rejected::Busy));
        assert_eq!(conv.begin_switch_model(&a, "gpt-4"), Err(Rejected::Busy));
        assert_eq!(conv.transcript(), &before);
    }

    #[test]
    fn test_send_failure_records_fixed_text() {
        let mut conv = Conversation::default();
        conv.begin_send("Hello").unwrap();
        let done = conv.complete(failed());
        assert!(done.is_failure());

        let msgs = conv.transcript().messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].content(), SEND_FAILED_TEXT);
        assert!(msgs[1].current().is_error);
        assert_eq!(conv.chat_id(), None);
    }

    #[test]
    fn test_regenerate_adds_variation_and_truncates() {
        let mut conv = Conversation::default();
        let first = said_hello(&mut conv);
        conv.begin_send("Tell me more").unwrap();
        conv.complete(Ok::<_, &str>(reply("More")));
        assert_eq!(conv.transcript().len(), 4);

        let pending = conv.begin_regenerate(&first).unwrap();
        assert_eq!(pending.request.message, "Hello");
        assert_eq!(pending.request.chat_id.as_deref(), Some("c1"));
        assert!(pending.request.regenerate);

        let done = conv.complete(Ok::<_, &str>(reply("Hey!")));
        assert_eq!(
            done,
            Completion::VariationAdded {
                message_id: first.clone(),
                index: 1,
                truncated: 2,
            }
        );

        let t = conv.transcript();
        assert_eq!(t.len(), 2);
        let msg = t.get(&first).unwrap();
        assert_eq!(msg.variations().count(), 2);
        assert_eq!(msg.variations().current_index(), 1);
        assert_eq!(msg.content(), "Hey!");
    }

    #[test]
    fn test_failed_regenerate_keeps_tail() {
        let mut conv = Conversation::default();
        let first = said_hello(&mut conv);
        conv.begin_send("Tell me more").unwrap();
        conv.complete(Ok::<_, &str>(reply("More")));

        conv.begin_regenerate(&first).unwrap();
        let done = conv.complete(failed());
        assert_eq!(
            done,
            Completion::VariationFailed {
                message_id: first.clone(),
                index: 1,
            }
        );
        let t = conv.transcript();
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(&first).unwrap().content(), VARIATION_FAILED_TEXT);
        assert!(t.get(&first).unwrap().current().is_error);
    }

    #[test]
    fn test_regenerate_rejections() {
        let mut conv = Conversation::default();
        let a = said_hello(&mut conv);
        let user = conv.transcript().messages()[0].id.clone();

        assert_eq!(
            conv.begin_regenerate(&MessageId::from("missing")),
            Err(Rejected::UnknownMessage)
        );
        assert_eq!(conv.begin_regenerate(&user), Err(Rejected::NotAssistant));
        assert!(!conv.is_awaiting());

        let record: ChatRecord = serde_json::from_value(json!({
            "id": "c2",
            "messages": [{"role": "assistant", "content": "orphan"}]
        }))
        .unwrap();
        let mut loaded = Conversation::from_record(&record, AUTO_MODEL);
        let orphan = loaded.transcript().messages()[0].id.clone();
        assert_eq!(
            loaded.begin_regenerate(&orphan),
            Err(Rejected::MissingParent)
        );
        assert!(conv.begin_regenerate(&a).is_ok());
    }

    #[test]
    fn test_switch_model_sends_new_model_and_keeps_it() {
        let mut conv = Conversation::new("gpt-4");
        let a = said_hello(&mut conv);

        let pending = conv.begin_switch_model(&a, "claude-3-opus-20240229").unwrap();
        assert_eq!(pending.request.model, "claude-3-opus-20240229");
        assert!(pending.request.regenerate);
        assert_eq!(conv.model(), "claude-3-opus-20240229");

        conv.complete(Ok::<_, &str>(reply("Bonjour")));
        let next = conv.begin_send("Next").unwrap();
        assert_eq!(next.request.model, "claude-3-opus-20240229");
    }

    #[test]
    fn test_rejected_switch_keeps_model() {
        let mut conv = Conversation::new("gpt-4");
        said_hello(&mut conv);
        let user = conv.transcript().messages()[0].id.clone();
        assert_eq!(
            conv.begin_switch_model(&user, "other"),
            Err(Rejected::NotAssistant)
        );
        assert_eq!(conv.model(), "gpt-4");
    }

    #[test]
    fn test_cancelled_request_is_dropped() {
        let mut conv = Conversation::default();
        conv.begin_send("Hello").unwrap();
        assert!(conv.cancel_pending());
        assert!(!conv.cancel_pending());

        assert_eq!(conv.complete(Ok::<_, &str>(reply("late"))), Completion::Dropped);
        let msgs = conv.transcript().messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::User);
    }

    #[test]
    fn test_navigate_variation_is_clamped() {
        let mut conv = Conversation::default();
        let a = said_hello(&mut conv);
        conv.begin_regenerate(&a).unwrap();
        conv.complete(Ok::<_, &str>(reply("second")));

        assert!(!conv.navigate_variation(&a, Direction::Next));
        assert!(conv.navigate_variation(&a, Direction::Previous));
        assert_eq!(conv.transcript().get(&a).unwrap().content(), "Hi there");
        assert!(!conv.navigate_variation(&a, Direction::Previous));
        assert_eq!(
            conv.transcript().get(&a).unwrap().variations().indicator(),
            "1 / 2"
        );
    }

    #[test]
    fn test_title_derivation_and_adoption() {
        assert_eq!(derive_title("  short  "), "short");
        assert_eq!(
            derive_title("This is a rather long first message for a title"),
            "This is a rather long first me..."
        );

        let mut conv = Conversation::default();
        assert_eq!(conv.title(), DEFAULT_CHAT_TITLE);
        conv.begin_send("Hello").unwrap();
        assert_eq!(conv.title(), "Hello");

        let mut titled = reply("Hi");
        titled.title = Some("Greetings".to_string());
        conv.complete(Ok::<_, &str>(titled));
        assert_eq!(conv.title(), "Greetings");
    }

    #[test]
    fn test_from_record_adopts_identity() {
        let record: ChatRecord = serde_json::from_value(json!({
            "id": "c9",
            "title": "Old chat",
            "messages": [
                {"role": "user", "content": "Hello"},
                {"role": "assistant", "content": "Hi"}
            ]
        }))
        .unwrap();
        let mut conv = Conversation::from_record(&record, "gpt-4");
        assert_eq!(conv.chat_id(), Some("c9"));
        assert_eq!(conv.title(), "Old chat");

        let pending = conv.begin_send("Again").unwrap();
        assert_eq!(pending.request.chat_id.as_deref(), Some("c9"));
        assert_eq!(conv.title(), "Old chat");
    }
}
