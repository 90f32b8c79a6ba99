//! REST client for the chat backend.
//!
//! Endpoints consumed: `/api/chat`, `/api/chats`, `/api/chats/{id}`,
//! `/api/chats/new`, `/api/configs` (model listing only) and
//! `/download/chat_history/{id}/media/{file}`.

mod client;
mod error;
mod types;

pub use client::{ApiClient, USER_AGENT};
pub use error::{ApiError, ApiErrorKind};
pub use types::{
    AUTO_MODEL, ChatRecord, ChatRequest, ChatResponse, ChatSummary, ConfigsResponse,
    DEFAULT_CHAT_TITLE, MediaRef, Mode, ModeConfig, ModelOption, NewChat, ProviderModels,
    StoredMessage, format_relative, parse_timestamp,
};
