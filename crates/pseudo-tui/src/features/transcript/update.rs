//! Transcript scrolling.

use crossterm::event::{MouseEvent, MouseEventKind};

use super::TranscriptState;

/// Lines scrolled per wheel notch before acceleration.
const MOUSE_SCROLL_LINES: i32 = 1;

/// Accumulates wheel movement; applied once per frame.
pub fn handle_mouse(transcript: &mut TranscriptState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => transcript.scroll_accumulator.accumulate(-MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => transcript.scroll_accumulator.accumulate(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

/// Applies any accumulated scroll delta from mouse events.
///
/// Called once per frame so bursts of wheel events (trackpads) coalesce into
/// one scroll.
pub fn apply_scroll_delta(transcript: &mut TranscriptState) {
    let delta = transcript.scroll_accumulator.take_delta();
    if delta == 0 {
        return;
    }

    let lines = delta.unsigned_abs() as usize;
    if delta < 0 {
        transcript.scroll_up(lines);
    } else {
        transcript.scroll_down(lines);
    }
}

/// Scrolls so that `line` is inside the viewport, leaving follow mode only
/// when it has to.
pub fn reveal_line(transcript: &mut TranscriptState, line: usize) {
    let height = transcript.viewport_height.max(1);
    let offset = transcript.scroll.get_offset(height);
    if line >= offset && line < offset + height {
        return;
    }
    let total = transcript.scroll.cached_line_count;
    let target = line.min(total.saturating_sub(height));
    if target + height >= total {
        transcript.scroll.scroll_to_bottom();
    } else {
        transcript.scroll.scroll_to_top();
        transcript.scroll.scroll_down(target, height);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn wheel(kind: MouseEventKind) -> MouseEvent {
        MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn transcript(lines: usize, height: usize) -> TranscriptState {
        let mut t = TranscriptState::new();
        t.update_layout((80, 24), height);
        t.scroll.cached_line_count = lines;
        t
    }

    #[test]
    fn test_wheel_up_leaves_follow_mode() {
        let mut t = transcript(100, 10);
        handle_mouse(&mut t, wheel(MouseEventKind::ScrollUp));
        apply_scroll_delta(&mut t);
        assert!(!t.scroll.is_following());
        assert_eq!(t.scroll.get_offset(10), 89);
    }

    #[test]
    fn test_reveal_line_scrolls_to_it() {
        let mut t = transcript(100, 10);
        reveal_line(&mut t, 20);
        assert_eq!(t.scroll.get_offset(10), 20);
        reveal_line(&mut t, 25);
        assert_eq!(t.scroll.get_offset(10), 20);
        reveal_line(&mut t, 95);
        assert!(t.scroll.is_following());
    }
}
