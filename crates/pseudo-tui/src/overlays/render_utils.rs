use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Rows used by the filter line, its separator, the footer separator and hints.
pub const PICKER_CHROME_ROWS: u16 = 4;

/// Centers an overlay horizontally and vertically within the space above
/// the input box.
pub fn calculate_overlay_area(area: Rect, available_height: u16, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(available_height.saturating_sub(2));

    let overlay_x = (area.width.saturating_sub(width)) / 2;
    let overlay_y = (available_height.saturating_sub(height)) / 2;
    Rect::new(overlay_x, overlay_y, width, height)
}

/// Clears the background and draws the border with its title.
pub fn render_overlay_container(frame: &mut Frame, area: Rect, title: &str, border_color: Color) {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {title} "))
        .title_style(
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(block, area);
}

/// Area inside a one-cell border.
pub fn inner_area(popup: Rect) -> Rect {
    Rect::new(
        popup.x + 1,
        popup.y + 1,
        popup.width.saturating_sub(2),
        popup.height.saturating_sub(2),
    )
}

pub struct InputHint<'a> {
    pub key: &'a str,
    pub action: &'a str,
}

impl<'a> InputHint<'a> {
    pub fn new(key: &'a str, action: &'a str) -> Self {
        Self { key, action }
    }
}

/// Renders a line of keyboard hints at the bottom of the overlay.
pub fn render_hints(frame: &mut Frame, area: Rect, hints: &[InputHint], highlight_color: Color) {
    let hints_y = area.y + area.height.saturating_sub(1);
    let hints_area = Rect::new(area.x, hints_y, area.width, 1);

    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(highlight_color)));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let para = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(para, hints_area);
}

pub fn render_separator(frame: &mut Frame, area: Rect, y_offset: u16) {
    if y_offset >= area.height {
        return;
    }
    let separator = "─".repeat(area.width as usize);
    let separator_area = Rect::new(area.x, area.y + y_offset, area.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            separator,
            Style::default().fg(Color::DarkGray),
        ))),
        separator_area,
    );
}

/// Renders the `> filter█` line on the first inner row.
pub fn render_filter_line(frame: &mut Frame, inner: Rect, filter: &str, color: Color) {
    let max_len = inner.width.saturating_sub(4) as usize;
    let shown: String = if filter.chars().count() > max_len {
        let tail: String = filter
            .chars()
            .rev()
            .take(max_len)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("…{tail}")
    } else {
        filter.to_string()
    };
    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::DarkGray)),
        Span::styled(shown, Style::default().fg(color)),
        Span::styled("█", Style::default().fg(color)),
    ]);
    frame.render_widget(
        Paragraph::new(line),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );
}

/// Renders a centered gray message in the list area.
pub fn render_empty_message(frame: &mut Frame, inner: Rect, message: &str) {
    let area = Rect::new(
        inner.x,
        inner.y + 2,
        inner.width,
        inner.height.saturating_sub(PICKER_CHROME_ROWS),
    );
    frame.render_widget(
        Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

/// Renders list rows below the filter with the selected row highlighted.
pub fn render_picker_list(
    frame: &mut Frame,
    inner: Rect,
    items: Vec<ListItem<'static>>,
    visible_selected: usize,
    color: Color,
) {
    let list_height = inner.height.saturating_sub(PICKER_CHROME_ROWS);
    let list_area = Rect::new(inner.x, inner.y + 2, inner.width, list_height);

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default();
    list_state.select(Some(visible_selected));
    frame.render_stateful_widget(list, list_area, &mut list_state);
}

/// Deletes back to the previous word boundary in a filter string.
pub fn clear_word_left(input: &mut String) {
    let trimmed_len = input.trim_end().len();
    input.truncate(trimmed_len);
    let cut = input
        .rfind(char::is_whitespace)
        .map_or(0, |i| i + input[i..].chars().next().map_or(1, char::len_utf8));
    input.truncate(cut);
}
