use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates `s` to at most `max_width` terminal columns, appending `...`
/// when text was cut. Widths too narrow for an ellipsis get a plain cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let (budget, suffix) = if max_width > ELLIPSIS_WIDTH {
        (max_width - ELLIPSIS_WIDTH, ELLIPSIS)
    } else {
        (max_width, "")
    };

    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    Cow::Owned(format!("{}{}", &s[..end], suffix))
}

/// Removes terminal control characters and ANSI escape sequences from feed
/// text before it is written to a terminal. Tab, newline and carriage return
/// are kept.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_unsafe = |c: char| c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r');

    if !s.chars().any(is_unsafe) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                // CSI: parameters until a final byte in 0x40..=0x7e
                Some('[') => {
                    chars.next();
                    for n in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&n) {
                            break;
                        }
                    }
                }
                // OSC: until BEL or ESC \
                Some(']') => {
                    chars.next();
                    while let Some(n) = chars.next() {
                        if n == '\x07' {
                            break;
                        }
                        if n == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_unsafe(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Wrap width handed to the HTML renderer. Lines are joined afterwards, so
/// this only needs to be wide enough to avoid `TooNarrow` errors.
const RENDER_WIDTH: usize = 200;

/// Reduces markup-bearing feed text to a single line of plain text.
///
/// The HTML is rendered with `html2text`, so tags are dropped and entities
/// decoded, then runs of whitespace collapse to one space. If rendering
/// fails the input is used as-is.
pub fn plain_text(s: &str) -> String {
    let rendered = match html2text::from_read(s.as_bytes(), RENDER_WIDTH) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "HTML rendering failed, using raw text");
            s.to_string()
        }
    };

    rendered.split_whitespace().collect::<Vec<_>>().join(" ")
}
