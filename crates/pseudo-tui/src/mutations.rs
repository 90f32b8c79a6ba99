//! Cross-slice state mutations.
//!
//! Overlays only see `&TuiState`; they return these mutations and the main
//! reducer applies them in order.

use pseudo_core::transcript::MessageId;

#[derive(Debug)]
pub enum StateMutation {
    Transcript(TranscriptMutation),
    Input(InputMutation),
    Config(ConfigMutation),
    Chat(ChatMutation),
}

#[derive(Debug)]
pub enum TranscriptMutation {
    AppendSystemMessage(String),
    ScrollToBottom,
}

#[derive(Debug)]
pub enum InputMutation {
    Clear,
}

#[derive(Debug)]
pub enum ConfigMutation {
    /// Default model for new requests (also applied to the open conversation).
    SetModel(String),
}

/// Conversation actions requested from overlays.
///
/// Unlike the other mutations these can start requests, so applying them
/// yields effects.
#[derive(Debug)]
pub enum ChatMutation {
    SwitchModel { message_id: MessageId, model: String },
    Open { id: String },
    Delete { id: String },
}
