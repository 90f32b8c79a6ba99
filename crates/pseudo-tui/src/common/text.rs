//! Text helpers shared by the renderers.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Truncates `text` to `max_width` terminal columns, ending with `…` when cut.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return "…".to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Strips escape bytes and expands tabs to four spaces.
///
/// Server text is untrusted; a stray ESC would be interpreted by the terminal.
pub fn sanitize_for_display(s: &str) -> Cow<'_, str> {
    if s.contains('\x1b') || s.contains('\t') {
        Cow::Owned(s.replace('\x1b', "").replace('\t', "    "))
    } else {
        Cow::Borrowed(s)
    }
}

/// Word-wraps one logical line to `width` columns.
///
/// Breaks at whitespace when possible and splits words wider than the line
/// by grapheme. Always returns at least one (possibly empty) row.
pub fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;

    for word in line.split_word_bounds() {
        let word_width = word.width();
        if row_width + word_width <= width {
            row.push_str(word);
            row_width += word_width;
            continue;
        }

        if word.trim().is_empty() {
            // Break at the space; it does not carry over to the next row.
            rows.push(std::mem::take(&mut row));
            row_width = 0;
            continue;
        }

        if !row.is_empty() && word_width <= width {
            rows.push(std::mem::take(&mut row));
            row.push_str(word);
            row_width = word_width;
            continue;
        }

        for g in word.graphemes(true) {
            let gw = g.width();
            if row_width + gw > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push_str(g);
            row_width += gw;
        }
    }

    rows.push(row);
    rows
}

/// Wraps multi-line text; every `\n` starts a new row.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    text.split('\n')
        .flat_map(|line| wrap_line(line.trim_end_matches('\r'), width))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello", 5), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello w…");
        assert_eq!(truncate_with_ellipsis("hello", 1), "…");
    }

    #[test]
    fn test_truncate_with_ellipsis_wide() {
        // Each CJK character is two columns.
        assert_eq!(truncate_with_ellipsis("中文test", 6), "中文t…");
        assert_eq!(truncate_with_ellipsis("a中b文c", 4), "a中…");
    }

    #[test]
    fn test_sanitize_for_display() {
        assert_eq!(sanitize_for_display("\x1b[31mred\ttext"), "[31mred    text");
        assert!(matches!(sanitize_for_display("clean"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_wrap_line_at_spaces() {
        assert_eq!(wrap_line("hello big world", 9), vec!["hello big", "world"]);
        assert_eq!(wrap_line("short", 20), vec!["short"]);
        assert_eq!(wrap_line("", 20), vec![""]);
    }

    #[test]
    fn test_wrap_line_splits_long_words() {
        assert_eq!(wrap_line("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        assert_eq!(wrap_text("a\n\nb", 10), vec!["a", "", "b"]);
    }
}
