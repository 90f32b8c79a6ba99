//! Input feature view.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::state::TuiState;

/// Minimum height of the input area (lines, including borders).
const INPUT_HEIGHT_MIN: u16 = 5;

/// Maximum height of the input area as a percentage of screen height.
const INPUT_HEIGHT_MAX_PERCENT: f32 = 0.4;

const PLACEHOLDER: &str = "Type a message...";

/// Draft wrapped to the box width, with the cursor's visual position.
#[derive(Debug)]
struct WrappedDraft {
    lines: Vec<String>,
    cursor_row: usize,
    cursor_col: usize,
}

/// Wraps the draft by display width, character by character.
///
/// `cursor` is a byte offset into `text`.
fn wrap_draft(text: &str, cursor: usize, width: usize) -> WrappedDraft {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut col = 0;
    let mut cursor_pos = None;

    for (offset, ch) in text.char_indices() {
        if offset == cursor {
            cursor_pos = Some((lines.len() - 1, col));
        }
        if ch == '\n' {
            lines.push(String::new());
            col = 0;
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if col + w > width && col > 0 {
            lines.push(String::new());
            col = 0;
            if offset == cursor {
                cursor_pos = Some((lines.len() - 1, 0));
            }
        }
        if let Some(line) = lines.last_mut() {
            line.push(ch);
        }
        col += w;
    }

    let (cursor_row, cursor_col) = cursor_pos.unwrap_or((lines.len() - 1, col));
    // A cursor at the right edge sits at the start of the next visual row.
    let (cursor_row, cursor_col) = if cursor_col >= width {
        lines.push(String::new());
        (cursor_row + 1, 0)
    } else {
        (cursor_row, cursor_col)
    };

    WrappedDraft {
        lines,
        cursor_row,
        cursor_col,
    }
}

/// First visible row so the cursor stays in view, centered when possible.
fn scroll_offset(total_rows: usize, viewport_height: usize, cursor_row: usize) -> usize {
    if total_rows <= viewport_height {
        return 0;
    }
    let ideal = viewport_height / 2;
    if cursor_row < ideal {
        0
    } else if cursor_row >= total_rows.saturating_sub(ideal) {
        total_rows.saturating_sub(viewport_height)
    } else {
        cursor_row.saturating_sub(ideal)
    }
}

/// Calculates the dynamic input height based on content and terminal size.
///
/// - Minimum: `INPUT_HEIGHT_MIN` (5 lines with borders)
/// - Maximum: 40% of terminal height
/// - Expands when the draft has more than 3 lines
pub fn calculate_input_height(state: &TuiState, terminal_height: u16) -> u16 {
    let line_count = u16::try_from(state.input.buffer.line_count()).unwrap_or(u16::MAX);

    if line_count <= 3 {
        return INPUT_HEIGHT_MIN;
    }

    let max_height = (f32::from(terminal_height) * INPUT_HEIGHT_MAX_PERCENT) as u16;
    let desired_height = line_count.saturating_add(2);
    desired_height.max(INPUT_HEIGHT_MIN).min(max_height.max(INPUT_HEIGHT_MIN))
}

/// Renders the input box: model on the top border, chat title on the bottom.
pub fn render_input(state: &TuiState, frame: &mut ratatui::Frame, area: Rect, show_cursor: bool) {
    let awaiting = state.is_awaiting_reply();
    let conversation = &state.chat.conversation;

    let title = Line::from(Span::styled(
        format!(" {} ", conversation.model()),
        Style::default().fg(Color::DarkGray),
    ));

    let chat_label = match conversation.chat_id() {
        Some(_) => conversation.title().to_string(),
        None => state.client.base_url().to_string(),
    };
    let bottom_title = Line::from(Span::styled(
        format!(" {chat_label} "),
        Style::default().fg(Color::DarkGray),
    ))
    .alignment(Alignment::Right);

    let mut border_style = Style::default().fg(Color::DarkGray);
    if awaiting {
        border_style = border_style.add_modifier(Modifier::DIM);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .title_bottom(bottom_title);

    let inner_area = block.inner(area);
    if inner_area.width == 0 || inner_area.height == 0 {
        frame.render_widget(block, area);
        return;
    }

    if state.input.buffer.is_empty() {
        let hint = if awaiting {
            "Waiting for reply..."
        } else {
            PLACEHOLDER
        };
        let placeholder = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        if show_cursor {
            frame.set_cursor_position((inner_area.x, inner_area.y));
        }
        return;
    }

    let wrapped = wrap_draft(
        state.input.buffer.text(),
        state.input.buffer.cursor(),
        inner_area.width as usize,
    );
    let viewport_height = inner_area.height as usize;
    let offset = scroll_offset(wrapped.lines.len(), viewport_height, wrapped.cursor_row);

    let text_style = if awaiting {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let visible_lines: Vec<Line> = wrapped
        .lines
        .into_iter()
        .skip(offset)
        .take(viewport_height)
        .map(|l| Line::from(Span::styled(l, text_style)))
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);

    let cursor_x = inner_area.x + wrapped.cursor_col as u16;
    let cursor_y = inner_area.y + wrapped.cursor_row.saturating_sub(offset) as u16;
    if show_cursor
        && cursor_x < inner_area.x + inner_area.width
        && cursor_y < inner_area.y + inner_area.height
    {
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}
