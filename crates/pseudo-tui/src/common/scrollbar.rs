//! Transcript scrollbar with a fixed-size thumb.
//!
//! ratatui's `Scrollbar` rounds both thumb ends independently, so the thumb
//! grows and shrinks while scrolling. This one sizes the thumb once and only
//! moves it.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::Widget;

const THUMB: &str = "█";
const TRACK: &str = "│";

#[derive(Debug, Clone, Copy)]
pub struct Scrollbar {
    total_lines: usize,
    viewport_height: usize,
    offset: usize,
}

impl Scrollbar {
    pub fn new(total_lines: usize, viewport_height: usize, offset: usize) -> Self {
        Self {
            total_lines,
            viewport_height,
            offset,
        }
    }

    fn is_scrollable(&self) -> bool {
        self.total_lines > self.viewport_height
    }

    /// Thumb start row and length for a track of `track_len` rows.
    fn thumb(&self, track_len: usize) -> Option<(usize, usize)> {
        let max_offset = self.total_lines.saturating_sub(self.viewport_height);
        if !self.is_scrollable() || track_len == 0 || max_offset == 0 {
            return None;
        }

        let visible = self.viewport_height.min(track_len);
        let denom = (self.total_lines - 1 + visible) as u64;
        let len = ((track_len as u64 * visible as u64 + denom / 2) / denom) as usize;
        let len = len.clamp(1, track_len);

        // Reaches the last row exactly at the maximum offset.
        let travel = track_len - len;
        let start = (self.offset.min(max_offset) as u64 * travel as u64 / max_offset as u64) as usize;
        Some((start, len))
    }
}

impl Widget for Scrollbar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some((start, len)) = self.thumb(area.height as usize) else {
            return;
        };

        let x = area.x + area.width.saturating_sub(1);
        for (row, y) in (area.y..area.y + area.height).enumerate() {
            let (symbol, color) = if (start..start + len).contains(&row) {
                (THUMB, Color::Gray)
            } else {
                (TRACK, Color::DarkGray)
            };
            buf.set_string(x, y, symbol, Style::default().fg(color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_when_content_fits() {
        assert!(Scrollbar::new(10, 20, 0).thumb(20).is_none());
        assert!(Scrollbar::new(20, 20, 0).thumb(20).is_none());
    }

    #[test]
    fn test_thumb_size_is_stable() {
        let lens: Vec<usize> = (0..=80)
            .filter_map(|offset| Scrollbar::new(100, 20, offset).thumb(20))
            .map(|(_, len)| len)
            .collect();
        assert!(lens.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_thumb_reaches_bounds() {
        let (top, _) = Scrollbar::new(100, 20, 0).thumb(20).unwrap();
        assert_eq!(top, 0);

        let (start, len) = Scrollbar::new(100, 20, 80).thumb(20).unwrap();
        assert_eq!(start + len, 20);
    }
}
