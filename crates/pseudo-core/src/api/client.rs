use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::ApiError;
use super::types::{
    ChatList, ChatRecord, ChatRequest, ChatResponse, ChatSummary, ConfigsResponse, DeleteAck,
    ModelOption, NewChat,
};
use crate::config::Config;

/// Standard User-Agent header for pseudo requests.
pub const USER_AGENT: &str = concat!("pseudo/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the chat backend.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid server URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Server URL cannot carry paths: {base_url}");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { base_url, http })
    }

    /// Creates a client from the resolved config (env overrides applied).
    ///
    /// # Errors
    /// Returns an error if the configured URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.resolve_server_url()?;
        Self::new(&url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Resolves a server-relative path (e.g. a media URL) to an absolute URL.
    ///
    /// Absolute inputs are returned unchanged.
    pub fn absolute_url(&self, path: &str) -> String {
        if Url::parse(path).is_ok() {
            return path.to_string();
        }
        self.base_url
            .join(path)
            .map_or_else(|_| path.to_string(), String::from)
    }

    /// `POST /api/chat`
    ///
    /// # Errors
    /// Returns an [`ApiError`] (inside `anyhow`) for network, status or parse failures.
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        tracing::debug!(
            model = %request.model,
            chat_id = ?request.chat_id,
            regenerate = request.regenerate,
            "sending chat message"
        );
        let url = self.endpoint(&["api", "chat"])?;
        let response: ChatResponse = self
            .execute(self.http.post(url).json(request))
            .await
            .context("send chat message")?;
        tracing::debug!(
            chat_id = ?response.chat_id,
            mode = ?response.mode(),
            "chat reply received"
        );
        Ok(response)
    }

    /// `POST /api/chats/new`
    ///
    /// # Errors
    /// Returns an error if the backend call fails.
    pub async fn new_chat(&self) -> Result<NewChat> {
        let url = self.endpoint(&["api", "chats", "new"])?;
        self.execute(self.http.post(url))
            .await
            .context("create chat")
    }

    /// `GET /api/chats`, newest first.
    ///
    /// # Errors
    /// Returns an error if the backend call fails.
    pub async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        let url = self.endpoint(&["api", "chats"])?;
        let mut list: ChatList = self
            .execute(self.http.get(url))
            .await
            .context("list chats")?;
        // Unparseable timestamps are `None` and sort last.
        list.chats.sort_by_key(|c| std::cmp::Reverse(c.updated()));
        Ok(list.chats)
    }

    /// `GET /api/chats/{id}`
    ///
    /// # Errors
    /// Returns an error if the chat does not exist or the call fails.
    pub async fn get_chat(&self, id: &str) -> Result<ChatRecord> {
        let url = self.endpoint(&["api", "chats", id])?;
        self.execute(self.http.get(url))
            .await
            .with_context(|| format!("load chat '{id}'"))
    }

    /// `DELETE /api/chats/{id}`
    ///
    /// # Errors
    /// Returns an error if the call fails or the server does not confirm.
    pub async fn delete_chat(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "chats", id])?;
        let ack: DeleteAck = self
            .execute(self.http.delete(url))
            .await
            .with_context(|| format!("delete chat '{id}'"))?;
        if !ack.success {
            anyhow::bail!("Server did not confirm deletion of chat '{id}'");
        }
        Ok(())
    }

    /// `GET /api/configs`, flattened into selectable models.
    ///
    /// # Errors
    /// Returns an error if the backend call fails.
    pub async fn list_models(&self) -> Result<Vec<ModelOption>> {
        let url = self.endpoint(&["api", "configs"])?;
        let configs: ConfigsResponse = self
            .execute(self.http.get(url))
            .await
            .context("load model list")?;
        Ok(configs.model_options())
    }

    /// `GET /download/chat_history/{chat_id}/media/{file}`, raw bytes.
    ///
    /// # Errors
    /// Returns an [`ApiError`] (inside `anyhow`) for network or status failures.
    pub async fn download_media(&self, chat_id: &str, file: &str) -> Result<Vec<u8>> {
        let mut segments = vec!["download", "chat_history", chat_id, "media"];
        segments.extend(file.split('/').filter(|s| !s.is_empty()));
        let url = self.endpoint(&segments)?;
        tracing::debug!(%url, "downloading media");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))
            .with_context(|| format!("download media '{file}'"))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))
            .with_context(|| format!("download media '{file}'"))?;

        if !status.is_success() {
            let err = ApiError::http_status(status.as_u16(), &String::from_utf8_lossy(&body));
            tracing::warn!(kind = %err.kind, "media download failed: {}", err.message);
            return Err(anyhow::Error::from(err).context(format!("download media '{file}'")));
        }
        Ok(body.to_vec())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("Server URL cannot carry paths: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        if !status.is_success() {
            let err = ApiError::http_status(status.as_u16(), &body);
            tracing::warn!(kind = %err.kind, "backend returned {}", err.message);
            return Err(err.into());
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(format!("Invalid JSON from server: {e}"), &body).into())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{ApiErrorKind, Mode};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_send_chat_posts_expected_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({"message": "Hello", "model": "Auto", "chat_id": "c1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Hi there",
                "chat_id": "c1",
                "selected_mode": "text",
                "model": "gpt-4",
                "provider": "openai"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server)
            .send_chat(&ChatRequest {
                message: "Hello".to_string(),
                model: "Auto".to_string(),
                chat_id: Some("c1".to_string()),
                regenerate: false,
            })
            .await
            .unwrap();

        assert_eq!(reply.text(), "Hi there");
        assert_eq!(reply.mode(), Some(Mode::Text));
        assert_eq!(reply.provider.as_deref(), Some("openai"));
    }

    #[tokio::test]
    async fn test_send_chat_maps_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "No message provided"})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .send_chat(&ChatRequest {
                message: String::new(),
                model: "Auto".to_string(),
                chat_id: None,
                regenerate: false,
            })
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().expect("ApiError in chain");
        assert_eq!(api_err.kind, ApiErrorKind::HttpStatus);
        assert!(api_err.message.contains("No message provided"));
    }

    #[tokio::test]
    async fn test_send_chat_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "late"}))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let client = ApiClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let err = client
            .send_chat(&ChatRequest {
                message: "Hello".to_string(),
                model: "Auto".to_string(),
                chat_id: None,
                regenerate: false,
            })
            .await
            .unwrap_err();

        let api_err = err.downcast_ref::<ApiError>().expect("ApiError in chain");
        assert_eq!(api_err.kind, ApiErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client(&server).list_chats().await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().expect("ApiError in chain");
        assert_eq!(api_err.kind, ApiErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_list_chats_sorted_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chats": [
                {"id": "old", "title": "Old", "updated_at": "2024-01-01T10:00:00", "message_count": 2},
                {"id": "new", "title": "New", "updated_at": "2024-03-01T10:00:00", "message_count": 4}
            ]})))
            .mount(&server)
            .await;

        let chats = client(&server).list_chats().await.unwrap();
        let ids: Vec<&str> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_list_chats_unparseable_timestamps_last() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chats": [
                {"id": "broken", "title": "Broken", "updated_at": "garbage"},
                {"id": "missing", "title": "Missing"},
                {"id": "old", "title": "Old", "updated_at": "2024-01-01T10:00:00"},
                {"id": "new", "title": "New", "updated_at": "2024-03-01T10:00:00"}
            ]})))
            .mount(&server)
            .await;

        let chats = client(&server).list_chats().await.unwrap();
        let ids: Vec<&str> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(&ids[..2], ["new", "old"]);
        assert!(ids[2..].contains(&"broken"));
        assert!(ids[2..].contains(&"missing"));
    }

    #[tokio::test]
    async fn test_download_media_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/chat_history/c1/media/image_1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = client(&server)
            .download_media("c1", "image_1.png")
            .await
            .unwrap();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[tokio::test]
    async fn test_download_media_missing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download/chat_history/c1/media/gone.mp3"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .download_media("c1", "gone.mp3")
            .await
            .unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().expect("ApiError in chain");
        assert_eq!(api_err.kind, ApiErrorKind::HttpStatus);
        assert!(format!("{err:#}").contains("download media 'gone.mp3'"));
    }

    #[tokio::test]
    async fn test_get_chat_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Chat not found"})))
            .mount(&server)
            .await;

        let err = client(&server).get_chat("missing").await.unwrap_err();
        assert!(format!("{err:#}").contains("Chat not found"));
        assert!(format!("{err:#}").contains("load chat 'missing'"));
    }

    #[tokio::test]
    async fn test_delete_and_new_chat() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/chats/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chats/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chat_id": "fresh"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client.delete_chat("c1").await.unwrap();
        assert_eq!(client.new_chat().await.unwrap().chat_id, "fresh");
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/prefix/api/configs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"modes": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            ApiClient::new(&format!("{}/prefix/", server.uri()), Duration::from_secs(5)).unwrap();
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 1);
        assert!(models[0].is_auto());
    }

    #[test]
    fn test_absolute_url() {
        let client = ApiClient::new("http://localhost:5000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.absolute_url("/chat_history/c1/media/a.png"),
            "http://localhost:5000/chat_history/c1/media/a.png"
        );
        assert_eq!(
            client.absolute_url("https://cdn.test/x.png"),
            "https://cdn.test/x.png"
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
    }
}
