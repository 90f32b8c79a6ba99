//! Wire types for the chat backend.
//!
//! Fields the client never uses (credentials in `/api/configs`, file names in
//! media replies) are left out; serde ignores unknown keys.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model value that lets the server choose a provider.
pub const AUTO_MODEL: &str = "Auto";

/// Title the backend gives chats before the first message.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Kind of content a model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Text,
    Image,
    Audio,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Mode::Text),
            "image" => Some(Mode::Image),
            "audio" => Some(Mode::Audio),
            _ => None,
        }
    }

    /// Capitalized name used in attribution lines.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Text => "Text",
            Mode::Image => "Image",
            Mode::Audio => "Audio",
        }
    }

    pub fn is_media(self) -> bool {
        matches!(self, Mode::Image | Mode::Audio)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// POST /api/chat
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub regenerate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatResponse {
    /// Reply text; some backends send non-string JSON here.
    #[serde(default)]
    pub response: Option<Value>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// `image` or `audio` when the reply is media.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub selected_mode: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl ChatResponse {
    /// Reply text for display.
    pub fn text(&self) -> String {
        match &self.response {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Mode reported by the backend (`type` wins over `selected_mode`).
    pub fn mode(&self) -> Option<Mode> {
        self.kind
            .as_deref()
            .and_then(Mode::parse)
            .or_else(|| self.selected_mode.as_deref().and_then(Mode::parse))
    }
}

// ============================================================================
// Chat history
// ============================================================================

fn default_title() -> String {
    DEFAULT_CHAT_TITLE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatList {
    #[serde(default)]
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatSummary {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub message_count: usize,
}

impl ChatSummary {
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

/// Parses a backend timestamp.
///
/// The server writes naive local ISO 8601 (`2024-05-01T09:30:00.123456`);
/// RFC 3339 with an offset is accepted too.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `just now`, `5m ago`, `3h ago`, `2d ago`, then the date.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        0..60 => "just now".to_string(),
        60..3_600 => format!("{}m ago", secs / 60),
        3_600..86_400 => format!("{}h ago", secs / 3_600),
        86_400..604_800 => format!("{}d ago", secs / 86_400),
        _ => then.with_timezone(&Local).format("%Y-%m-%d").to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    /// Media file name inside the chat's media directory.
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

impl StoredMessage {
    /// Server path of the stored media file, if any.
    pub fn media_path(&self, chat_id: &str) -> Option<String> {
        self.media
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(|file| format!("/chat_history/{chat_id}/media/{file}"))
    }

    pub fn mode(&self) -> Option<Mode> {
        self.mode.as_deref().and_then(Mode::parse)
    }
}

/// A media file stored with a chat, as named by its server path
/// `/chat_history/{chat_id}/media/{file}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub chat_id: String,
    pub file: String,
}

impl MediaRef {
    const PREFIX: &'static str = "/chat_history/";

    /// Extracts the chat and file name from a media path or absolute URL.
    pub fn parse(url: &str) -> Option<Self> {
        let start = url.find(Self::PREFIX)? + Self::PREFIX.len();
        let rest = url[start..].split(['?', '#']).next()?;
        let (chat_id, file) = rest.split_once("/media/")?;
        if chat_id.is_empty() || chat_id.contains('/') || file.is_empty() {
            return None;
        }
        Some(Self {
            chat_id: chat_id.to_string(),
            file: file.to_string(),
        })
    }

    /// Last path component of the file, safe to use as a local file name.
    pub fn file_name(&self) -> &str {
        self.file.rsplit('/').next().unwrap_or(&self.file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewChat {
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct DeleteAck {
    #[serde(default)]
    pub success: bool,
}

// ============================================================================
// GET /api/configs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConfigsResponse {
    #[serde(default)]
    pub modes: BTreeMap<String, ModeConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModeConfig {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderModels>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderModels {
    #[serde(default)]
    pub models: Vec<String>,
}

/// One selectable model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOption {
    /// Raw mode key from the server (`text`, `image`, ...).
    pub mode: String,
    pub provider: String,
    pub model: String,
}

impl ModelOption {
    pub fn auto() -> Self {
        Self {
            mode: String::new(),
            provider: String::new(),
            model: AUTO_MODEL.to_string(),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.model == AUTO_MODEL
    }

    /// `Text | openai` style label; empty for `Auto`.
    pub fn source_label(&self) -> String {
        if self.is_auto() {
            return String::new();
        }
        let mode = Mode::parse(&self.mode).map_or_else(|| self.mode.clone(), |m| m.to_string());
        format!("{mode} | {}", self.provider)
    }
}

impl ConfigsResponse {
    /// Flattens modes and providers into a picker list with `Auto` first.
    ///
    /// Ordered by mode (text, image, audio, then unknown), then provider name;
    /// models keep the server's order. Blank model names are skipped.
    pub fn model_options(&self) -> Vec<ModelOption> {
        let mut options: Vec<ModelOption> = self
            .modes
            .iter()
            .flat_map(|(mode, config)| {
                config.providers.iter().flat_map(move |(provider, models)| {
                    models
                        .models
                        .iter()
                        .filter(|m| !m.trim().is_empty())
                        .map(move |model| ModelOption {
                            mode: mode.clone(),
                            provider: provider.clone(),
                            model: model.clone(),
                        })
                })
            })
            .collect();

        options.sort_by(|a, b| {
            let rank = |o: &ModelOption| Mode::parse(&o.mode).map_or(u8::MAX, |m| m as u8);
            rank(a)
                .cmp(&rank(b))
                .then_with(|| a.mode.cmp(&b.mode))
                .then_with(|| a.provider.cmp(&b.provider))
        });

        let mut all = Vec::with_capacity(options.len() + 1);
        all.push(ModelOption::auto());
        all.extend(options);
        all
    }
}
