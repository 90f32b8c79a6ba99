//! Awaitable chat driver.
//!
//! [`ChatSession`] pairs a [`Conversation`] with a [`ChatBackend`] and runs
//! each action to completion: `begin_*`, one backend call, `complete`.

use std::future::Future;

use anyhow::Result;

use crate::api::{ApiClient, ApiError, ChatRequest, ChatResponse};
use crate::conversation::{Completion, Conversation, Rejected};
use crate::transcript::{Direction, MessageId};

/// Something that answers chat requests.
pub trait ChatBackend: Send + Sync {
    fn send_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse>> + Send;
}

impl ChatBackend for ApiClient {
    fn send_chat(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatResponse>> + Send {
        ApiClient::send_chat(self, request)
    }
}

pub struct ChatSession<B> {
    backend: B,
    conversation: Conversation,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B, conversation: Conversation) -> Self {
        Self {
            backend,
            conversation,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    /// Sends `text` and waits for the reply (or the recorded failure).
    ///
    /// # Errors
    /// Only the [`Rejected`] precondition failures; backend errors are recorded
    /// in the transcript.
    pub async fn send_message(&mut self, text: &str) -> Result<Completion, Rejected> {
        let pending = self.conversation.begin_send(text)?;
        Ok(self.run(&pending.request).await)
    }

    /// # Errors
    /// See [`Conversation::begin_regenerate`].
    pub async fn regenerate(&mut self, id: &MessageId) -> Result<Completion, Rejected> {
        let pending = self.conversation.begin_regenerate(id)?;
        Ok(self.run(&pending.request).await)
    }

    /// # Errors
    /// See [`Conversation::begin_switch_model`].
    pub async fn switch_model(
        &mut self,
        id: &MessageId,
        model: &str,
    ) -> Result<Completion, Rejected> {
        let pending = self.conversation.begin_switch_model(id, model)?;
        Ok(self.run(&pending.request).await)
    }

    pub fn navigate_variation(&mut self, id: &MessageId, direction: Direction) -> bool {
        self.conversation.navigate_variation(id, direction)
    }

    async fn run(&mut self, request: &ChatRequest) -> Completion {
        let outcome = self.backend.send_chat(request).await;
        if let Err(err) = &outcome {
            match err.downcast_ref::<ApiError>() {
                Some(api) => tracing::warn!(kind = %api.kind, "chat request failed: {err:#}"),
                None => tracing::warn!("chat request failed: {err:#}"),
            }
        }
        self.conversation.complete(outcome.map_err(|e| format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::AUTO_MODEL;
    use crate::transcript::{Role, SEND_FAILED_TEXT, VARIATION_FAILED_TEXT};

    /// Backend that replays scripted outcomes and records requests.
    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<ChatResponse>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Scripted {
        fn reply(self, text: &str) -> Self {
            let response = serde_json::from_value(json!({
                "response": text,
                "chat_id": "c1",
                "selected_mode": "text"
            }))
            .unwrap();
            self.replies.lock().unwrap().push_back(Ok(response));
            self
        }

        fn fail(self) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(anyhow::anyhow!("connection refused")));
            self
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ChatBackend for Scripted {
        fn send_chat(
            &self,
            request: &ChatRequest,
        ) -> impl Future<Output = Result<ChatResponse>> + Send {
            self.seen.lock().unwrap().push(request.clone());
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")));
            async move { next }
        }
    }

    #[tokio::test]
    async fn test_send_then_regenerate() {
        let backend = Scripted::default().reply("Hi").reply("Hello!");
        let mut session = ChatSession::new(backend, Conversation::default());

        let done = session.send_message("Hello").await.unwrap();
        let assistant = done.message_id().cloned().unwrap();

        let msgs = session.conversation().transcript().messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::User);
        assert_eq!(msgs[1].content(), "Hi");

        session.regenerate(&assistant).await.unwrap();
        let msg = session.conversation().transcript().get(&assistant).unwrap();
        assert_eq!(msg.variations().count(), 2);
        assert_eq!(msg.variations().current_index(), 1);
        assert_eq!(msg.content(), "Hello!");

        let requests = session.backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].message, "Hello");
        assert_eq!(requests[1].chat_id.as_deref(), Some("c1"));
        assert!(requests[1].regenerate);
    }

    #[tokio::test]
    async fn test_failures_use_fixed_texts() {
        let backend = Scripted::default().fail().fail();
        let mut session = ChatSession::new(backend, Conversation::default());

        let done = session.send_message("Hello").await.unwrap();
        assert!(done.is_failure());
        let assistant = done.message_id().cloned().unwrap();
        assert_eq!(
            session.conversation().transcript().messages()[1].content(),
            SEND_FAILED_TEXT
        );

        session.regenerate(&assistant).await.unwrap();
        let msg = session.conversation().transcript().get(&assistant).unwrap();
        assert_eq!(msg.content(), VARIATION_FAILED_TEXT);
        assert_eq!(session.conversation().transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_rejections_skip_backend() {
        let backend = Scripted::default();
        let mut session = ChatSession::new(backend, Conversation::default());

        assert_eq!(session.send_message("   ").await, Err(Rejected::EmptyInput));
        assert_eq!(
            session.regenerate(&MessageId::from("nope")).await,
            Err(Rejected::UnknownMessage)
        );
        assert!(session.backend.requests().is_empty());
        assert!(session.conversation().transcript().is_empty());
    }

    #[tokio::test]
    async fn test_switch_model_truncates_tail() {
        let backend = Scripted::default().reply("one").reply("two").reply("uno");
        let mut session = ChatSession::new(backend, Conversation::new(AUTO_MODEL));

        let first = session
            .send_message("first")
            .await
            .unwrap()
            .message_id()
            .cloned()
            .unwrap();
        session.send_message("second").await.unwrap();
        assert_eq!(session.conversation().transcript().len(), 4);

        session.switch_model(&first, "gpt-4").await.unwrap();
        let t = session.conversation().transcript();
        assert_eq!(t.len(), 2);
        assert_eq!(t.messages().last().unwrap().id, first);
        assert_eq!(session.conversation().model(), "gpt-4");
        assert_eq!(session.backend.requests()[2].model, "gpt-4");
    }

    #[tokio::test]
    async fn test_session_against_http_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({"message": "Hello", "model": "Auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Hi from the server",
                "chat_id": "abc",
                "title": "Hello",
                "selected_mode": "text",
                "provider": "openai",
                "model": "gpt-4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let mut session = ChatSession::new(client, Conversation::default());
        session.send_message("Hello").await.unwrap();

        let conv = session.conversation();
        assert_eq!(conv.chat_id(), Some("abc"));
        let reply = &conv.transcript().messages()[1];
        assert_eq!(reply.content(), "Hi from the server");
        assert_eq!(
            reply.current().attribution().as_deref(),
            Some("Text | openai - gpt-4")
        );
    }

    #[tokio::test]
    async fn test_http_error_becomes_fixed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "provider down"})),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let mut session = ChatSession::new(client, Conversation::default());
        let done = session.send_message("Hello").await.unwrap();

        assert!(done.is_failure());
        let msgs = session.into_conversation().transcript().messages().to_vec();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].content(), SEND_FAILED_TEXT);
    }
}
