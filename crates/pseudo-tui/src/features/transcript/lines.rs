//! Transcript line building.
//!
//! Turns the conversation plus client-side notes into styled, wrapped lines.
//! Everything here is pure; `render.rs` converts the result to ratatui.

use pseudo_core::conversation::RequestTarget;
use pseudo_core::transcript::{Direction, Message, MessageId, Role};

use super::state::SystemNote;
use super::style::{Style, StyledLine, StyledSpan};
use crate::common::sanitize_for_display;
use crate::common::text::wrap_text;
use crate::state::TuiState;

/// Spinner animation frames (quarter circles).
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Ticks per spinner frame.
const SPINNER_SPEED_DIVISOR: usize = 6;

const GUTTER_WIDTH: usize = 2;

/// Spinner glyph for the given tick count.
pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[(frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len()]
}

/// Built transcript plus where each message starts.
#[derive(Debug, Default)]
pub struct TranscriptLines {
    pub lines: Vec<StyledLine>,
    pub message_starts: Vec<(MessageId, usize)>,
}

impl TranscriptLines {
    pub fn start_of(&self, id: &MessageId) -> Option<usize> {
        self.message_starts
            .iter()
            .find(|(m, _)| m == id)
            .map(|(_, line)| *line)
    }

    fn push(&mut self, line: StyledLine) {
        self.lines.push(line);
    }

    fn push_blank(&mut self) {
        self.lines.push(StyledLine::empty());
    }
}

/// Builds every transcript line for a viewport `width` columns wide.
pub fn build_lines(tui: &TuiState, width: usize) -> TranscriptLines {
    let conversation = &tui.chat.conversation;
    let messages = conversation.transcript().messages();
    let notes = &tui.transcript.notes;
    let focused = tui.chat.focused();
    let body_width = width.saturating_sub(GUTTER_WIDTH).max(1);
    let mut out = TranscriptLines::default();

    for note in notes.iter().filter(|n| n.after.is_none()) {
        push_note(&mut out, note, body_width);
    }

    for message in messages {
        out.message_starts.push((message.id.clone(), out.lines.len()));
        match message.role {
            Role::User => push_user(&mut out, message, body_width),
            Role::Assistant => {
                let is_focused = focused == Some(&message.id);
                push_assistant(&mut out, tui, message, is_focused, body_width);
            }
        }

        if let Some(RequestTarget::Variation {
            assistant_message_id,
        }) = conversation.pending()
            && *assistant_message_id == message.id
        {
            push_thinking(&mut out, tui.spinner_frame, "Regenerating...");
        }
        out.push_blank();

        for note in notes
            .iter()
            .filter(|n| n.after.as_ref() == Some(&message.id))
        {
            push_note(&mut out, note, body_width);
        }
    }

    if let Some(RequestTarget::Reply { .. }) = conversation.pending() {
        push_thinking(&mut out, tui.spinner_frame, "Thinking...");
        out.push_blank();
    }

    out
}

fn push_user(out: &mut TranscriptLines, message: &Message, width: usize) {
    let content = sanitize_for_display(message.content());
    for row in wrap_text(&content, width) {
        out.push(StyledLine {
            spans: vec![
                StyledSpan::new("│ ", Style::UserPrefix),
                StyledSpan::new(row, Style::User),
            ],
        });
    }
}

fn push_assistant(
    out: &mut TranscriptLines,
    tui: &TuiState,
    message: &Message,
    focused: bool,
    width: usize,
) {
    let (gutter, gutter_style) = if focused {
        ("▌ ", Style::FocusPrefix)
    } else {
        ("  ", Style::AssistantPrefix)
    };
    let gutter_line = |spans: Vec<StyledSpan>| {
        let mut all = vec![StyledSpan::new(gutter, gutter_style)];
        all.extend(spans);
        StyledLine { spans: all }
    };

    let variation = message.current();
    let body_style = if variation.is_error {
        Style::Error
    } else {
        Style::Assistant
    };
    let content = sanitize_for_display(&variation.content);
    if !content.is_empty() {
        for row in wrap_text(&content, width) {
            out.push(gutter_line(vec![StyledSpan::new(row, body_style)]));
        }
    }

    if let Some(url) = &variation.media_url {
        let label = match variation.mode {
            Some(pseudo_core::api::Mode::Audio) => "[Audio]",
            _ => "[Image]",
        };
        let text = format!("{label} {}", tui.client.absolute_url(url));
        for row in wrap_text(&text, width) {
            out.push(gutter_line(vec![StyledSpan::new(row, Style::Media)]));
        }
    }

    let mut footer = Vec::new();
    let variations = message.variations();
    if variations.count() > 1 {
        let arrow = |glyph: &str, direction: Direction| {
            let style = if variations.can_move(direction) {
                Style::VariationArrow
            } else {
                Style::VariationArrowDisabled
            };
            StyledSpan::new(glyph.to_string(), style)
        };
        footer.push(arrow("‹", Direction::Previous));
        footer.push(StyledSpan::new(
            format!(" {} ", variations.indicator()),
            Style::VariationIndex,
        ));
        footer.push(arrow("›", Direction::Next));
    }
    if let Some(attribution) = variation.attribution() {
        if !footer.is_empty() {
            footer.push(StyledSpan::new("  ", Style::Plain));
        }
        footer.push(StyledSpan::new(attribution, Style::Attribution));
    }
    if !footer.is_empty() {
        out.push(gutter_line(footer));
    }
}

fn push_thinking(out: &mut TranscriptLines, spinner_frame: usize, label: &str) {
    out.push(StyledLine {
        spans: vec![
            StyledSpan::new("  ", Style::Plain),
            StyledSpan::new(format!("{} {label}", spinner(spinner_frame)), Style::Thinking),
        ],
    });
}

fn push_note(out: &mut TranscriptLines, note: &SystemNote, width: usize) {
    for row in wrap_text(&sanitize_for_display(&note.text), width) {
        out.push(StyledLine {
            spans: vec![
                StyledSpan::new("• ", Style::SystemPrefix),
                StyledSpan::new(row, Style::System),
            ],
        });
    }
    out.push_blank();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pseudo_core::api::{ApiClient, ChatResponse};
    use pseudo_core::config::Config;
    use pseudo_core::transcript::SEND_FAILED_TEXT;
    use serde_json::json;

    use super::*;

    fn tui() -> TuiState {
        let client = ApiClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        TuiState::new(Config::default(), client)
    }

    fn response(value: serde_json::Value) -> ChatResponse {
        serde_json::from_value(value).unwrap()
    }

    fn texts(lines: &TranscriptLines) -> Vec<String> {
        lines.lines.iter().map(StyledLine::text).collect()
    }

    #[test]
    fn test_exchange_renders_gutters_and_attribution() {
        let mut tui = tui();
        tui.chat.conversation.begin_send("Hello").unwrap();
        tui.chat.conversation.complete::<String>(Ok(response(json!({
            "response": "Hi there",
            "chat_id": "c1",
            "selected_mode": "text",
            "provider": "openai",
            "model": "gpt-4"
        }))));

        let built = build_lines(&tui, 40);
        assert_eq!(
            texts(&built),
            vec!["│ Hello", "", "  Hi there", "  Text | openai - gpt-4", ""]
        );
        assert_eq!(built.message_starts[1].1, 2);
    }

    #[test]
    fn test_pending_reply_shows_thinking() {
        let mut tui = tui();
        tui.chat.conversation.begin_send("Hello").unwrap();
        let text = texts(&build_lines(&tui, 40));
        assert_eq!(text[2], "  ◐ Thinking...");
    }

    #[test]
    fn test_variation_indicator_and_disabled_arrow() {
        let mut tui = tui();
        tui.chat.conversation.begin_send("Hello").unwrap();
        let id = tui
            .chat
            .conversation
            .complete::<String>(Ok(response(json!({"response": "one", "chat_id": "c1"}))))
            .message_id()
            .cloned()
            .unwrap();
        tui.chat.conversation.begin_regenerate(&id).unwrap();
        tui.chat
            .conversation
            .complete::<String>(Ok(response(json!({"response": "two", "chat_id": "c1"}))));

        let built = build_lines(&tui, 40);
        let footer = &built.lines[3];
        assert_eq!(footer.text(), "  ‹ 2 / 2 ›");
        assert_eq!(footer.spans[1].style, Style::VariationArrow);
        assert_eq!(footer.spans[3].style, Style::VariationArrowDisabled);
    }

    #[test]
    fn test_failure_uses_error_style() {
        let mut tui = tui();
        tui.chat.conversation.begin_send("Hello").unwrap();
        tui.chat.conversation.complete::<String>(Err("boom".into()));

        let built = build_lines(&tui, 200);
        let line = &built.lines[2];
        assert_eq!(line.spans[1].text, SEND_FAILED_TEXT);
        assert_eq!(line.spans[1].style, Style::Error);
    }

    #[test]
    fn test_media_url_is_absolute() {
        let mut tui = tui();
        tui.chat.conversation.begin_send("draw a cat").unwrap();
        tui.chat.conversation.complete::<String>(Ok(response(json!({
            "response": "",
            "chat_id": "c1",
            "type": "image",
            "url": "/static/cat.png"
        }))));

        let text = texts(&build_lines(&tui, 80));
        assert!(
            text.iter()
                .any(|l| l == "  [Image] http://localhost:5000/static/cat.png")
        );
    }

    #[test]
    fn test_notes_follow_their_anchor() {
        let mut tui = tui();
        tui.transcript.push_note(None, "Welcome");
        tui.chat.conversation.begin_send("Hello").unwrap();
        let user = tui.chat.conversation.transcript().messages()[0].id.clone();
        tui.transcript.push_note(Some(&user), "Request cancelled");
        tui.chat.conversation.cancel_pending();

        let text = texts(&build_lines(&tui, 40));
        assert_eq!(
            text,
            vec!["• Welcome", "", "│ Hello", "", "• Request cancelled", ""]
        );
    }
}
