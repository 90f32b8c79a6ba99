//! Transcript view.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::lines::build_lines;
use super::style::{Style as TranscriptStyle, StyledLine};
use crate::state::TuiState;

/// Renders the transcript as ratatui lines for a viewport `width` wide.
pub fn render_transcript(state: &TuiState, width: usize) -> Vec<Line<'static>> {
    build_lines(state, width)
        .lines
        .into_iter()
        .map(convert_styled_line)
        .collect()
}

fn convert_styled_line(styled_line: StyledLine) -> Line<'static> {
    let spans: Vec<Span<'static>> = styled_line
        .spans
        .into_iter()
        .map(|s| Span::styled(s.text, convert_style(s.style)))
        .collect();
    Line::from(spans)
}

fn convert_style(style: TranscriptStyle) -> Style {
    match style {
        TranscriptStyle::Plain => Style::default(),
        TranscriptStyle::UserPrefix => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        TranscriptStyle::User => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::ITALIC),
        TranscriptStyle::AssistantPrefix => Style::default(),
        TranscriptStyle::FocusPrefix => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        TranscriptStyle::Assistant => Style::default().fg(Color::White),
        TranscriptStyle::Error => Style::default().fg(Color::Red),
        TranscriptStyle::Media => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::UNDERLINED),
        TranscriptStyle::VariationArrow => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        TranscriptStyle::VariationArrowDisabled => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),
        TranscriptStyle::VariationIndex => Style::default().fg(Color::Cyan),
        TranscriptStyle::Attribution => Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
        TranscriptStyle::Thinking => Style::default().fg(Color::Yellow),
        TranscriptStyle::SystemPrefix => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        TranscriptStyle::System => Style::default().fg(Color::DarkGray),
    }
}
