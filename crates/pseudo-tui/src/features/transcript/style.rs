//! Terminal-agnostic styling for transcript lines.
//!
//! Line building produces these; `render.rs` maps them to ratatui styles.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: Style,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Semantic style identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    /// User message gutter (`│ `).
    UserPrefix,
    User,
    /// Assistant gutter; shown as a bar when the message is focused.
    AssistantPrefix,
    FocusPrefix,
    Assistant,
    /// Fixed failure texts.
    Error,
    /// `[Image] url` / `[Audio] url`.
    Media,
    /// `‹` / `›` when navigation in that direction is possible.
    VariationArrow,
    VariationArrowDisabled,
    VariationIndex,
    /// `Text | openai - gpt-4`.
    Attribution,
    Thinking,
    SystemPrefix,
    System,
}
