//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui `Frame`, and never
//! mutate state or return effects.

use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::common::{Scrollbar, TaskMeta};
use crate::input;
use crate::overlays::OverlayExt;
use crate::state::{AppState, TuiState};
use crate::transcript;

/// Height of status line below input.
const STATUS_HEIGHT: u16 = 1;

/// Transcript horizontal margin (padding on each side).
pub const TRANSCRIPT_MARGIN: u16 = 1;

/// Width reserved for the scrollbar on the right side.
const SCROLLBAR_WIDTH: u16 = 1;

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let state = &app.tui;

    let input_height = input::calculate_input_height(state, area.height);
    let transcript_height = calculate_transcript_height_with_state(state, area.height);

    let all_lines = transcript::render_transcript(state, transcript_width(area.width));
    let total_lines = all_lines.len();

    let scroll_offset = {
        let max_offset = total_lines.saturating_sub(transcript_height);
        if state.transcript.scroll.is_following() {
            max_offset
        } else {
            state
                .transcript
                .scroll
                .get_offset(transcript_height)
                .min(max_offset)
        }
    };

    let content_lines: Vec<Line<'static>> = all_lines
        .into_iter()
        .skip(scroll_offset)
        .take(transcript_height)
        .collect();

    // Bottom-align: pad the top when content doesn't fill the screen
    let visible_lines = if content_lines.len() < transcript_height {
        let mut padded = vec![Line::default(); transcript_height - content_lines.len()];
        padded.extend(content_lines);
        padded
    } else {
        content_lines
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(input_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    // Lines are pre-wrapped; no .wrap() here
    let transcript = Paragraph::new(visible_lines).block(Block::default().borders(Borders::NONE));
    let transcript_area = Rect {
        x: chunks[0].x + TRANSCRIPT_MARGIN,
        y: chunks[0].y,
        width: chunks[0]
            .width
            .saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH),
        height: chunks[0].height,
    };
    frame.render_widget(transcript, transcript_area);

    frame.render_widget(
        Scrollbar::new(total_lines, transcript_height, scroll_offset),
        chunks[0],
    );

    input::render_input(state, frame, chunks[1], app.overlay.is_none());

    render_status_line(state, frame, chunks[2]);

    // Overlay last, so it appears on top
    app.overlay.render(frame, area, chunks[1].y);
}

/// Width available to transcript text for a terminal `width` columns wide.
pub fn transcript_width(width: u16) -> usize {
    width.saturating_sub(TRANSCRIPT_MARGIN * 2 + SCROLLBAR_WIDTH) as usize
}

/// Calculates the available height for the transcript given the terminal
/// height and state.
pub fn calculate_transcript_height_with_state(state: &TuiState, terminal_height: u16) -> usize {
    let input_height = input::calculate_input_height(state, terminal_height);
    terminal_height.saturating_sub(input_height + STATUS_HEIGHT) as usize
}

/// Formats a duration for the status line display.
fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

fn status_spans(state: &TuiState) -> Vec<Span<'static>> {
    let spinner = transcript::spinner(state.spinner_frame);
    let hint = Style::default().fg(Color::DarkGray);

    if state.is_awaiting_reply() {
        let model = match &state.tasks.chat.meta {
            TaskMeta::Chat { model } => model.clone(),
            TaskMeta::None => state.chat.conversation.model().to_string(),
        };
        let mut spans = vec![
            Span::styled(spinner, Style::default().fg(Color::Yellow)),
            Span::raw(" "),
            Span::styled(
                format!("Waiting for {model}..."),
                Style::default().fg(Color::Yellow),
            ),
        ];
        if let Some(started) = state.tasks.chat.started_at {
            spans.push(Span::styled(
                format!(" ({})", format_elapsed(started.elapsed())),
                hint,
            ));
        }
        spans.extend([
            Span::raw("  "),
            Span::styled("Esc", hint),
            Span::raw(" to cancel"),
        ]);
        return spans;
    }

    if let Some(label) = state.busy_label() {
        return vec![
            Span::styled(spinner, Style::default().fg(Color::Cyan)),
            Span::raw(" "),
            Span::styled(label, Style::default().fg(Color::Cyan)),
        ];
    }

    vec![
        Span::styled("Ctrl+O", hint),
        Span::raw(" chats  "),
        Span::styled("Ctrl+L", hint),
        Span::raw(" model  "),
        Span::styled("Alt+↑↓", hint),
        Span::raw(" focus  "),
        Span::styled("Ctrl+C", hint),
        Span::raw(" quit"),
    ]
}

/// Renders the status line below the input.
fn render_status_line(state: &TuiState, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(status_spans(state))).alignment(Alignment::Left);
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pseudo_core::api::ApiClient;
    use pseudo_core::config::Config;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn app() -> AppState {
        let client = ApiClient::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        AppState::new(Config::default(), client)
    }

    fn spans_text(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(7)), "7s");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "1m01s");
        assert_eq!(format_elapsed(Duration::from_secs(600)), "10m00s");
    }

    #[test]
    fn test_transcript_width_reserves_margins_and_scrollbar() {
        assert_eq!(transcript_width(80), 77);
        assert_eq!(transcript_width(2), 0);
    }

    #[test]
    fn test_idle_status_shows_hints() {
        let app = app();
        let text = spans_text(&status_spans(&app.tui));
        assert!(text.contains("Ctrl+O"));
        assert!(text.contains("quit"));
    }

    #[test]
    fn test_waiting_status_names_model() {
        let mut app = app();
        app.tui.chat.conversation.begin_send("hi").unwrap();
        let text = spans_text(&status_spans(&app.tui));
        assert!(text.contains("Waiting for Auto..."), "{text}");
        assert!(text.contains("Esc"));
    }

    #[test]
    fn test_render_draws_transcript_and_input() {
        let mut app = app();
        app.tui.chat.conversation.begin_send("hello there").unwrap();

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| render(&app, f)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("hello there"));
        assert!(screen.contains("Thinking..."));
        assert!(screen.contains("Waiting for reply..."));
    }
}
