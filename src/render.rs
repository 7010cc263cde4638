//! Screen painters for the replay tool
//!
//! `paint` writes the active screen with crossterm styling; `dump` produces
//! a plain text view with a status header.

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};

use crate::core::session::{Host, Session};
use crate::core::term::PenState;

fn resolve_color(color: Option<u8>, default: u8, reverse_screen: bool) -> Color {
    match color {
        Some(n) => Color::AnsiValue(n),
        // Outside reverse mode the viewer's own defaults stand in for 7/0
        None if reverse_screen => Color::AnsiValue(default),
        None => Color::Reset,
    }
}

/// Apply cell attributes
fn apply_attrs<W: Write>(
    out: &mut W,
    attrs: &PenState,
    defaults: (u8, u8),
    reverse_screen: bool,
    cursor: bool,
) -> io::Result<()> {
    queue!(out, SetAttribute(Attribute::Reset))?;

    if attrs.bold() {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if attrs.faint() {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if attrs.italic() {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if attrs.underline() {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if attrs.blink() {
        queue!(out, SetAttribute(Attribute::SlowBlink))?;
    }
    if attrs.fast_blink() {
        queue!(out, SetAttribute(Attribute::RapidBlink))?;
    }
    if attrs.fraktur() {
        queue!(out, SetAttribute(Attribute::Fraktur))?;
    }
    if attrs.crossed_out() {
        queue!(out, SetAttribute(Attribute::CrossedOut))?;
    }
    if attrs.conceal() {
        queue!(out, SetAttribute(Attribute::Hidden))?;
    }
    // The cursor is drawn as an inverted cell
    if attrs.reverse_video() != cursor {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }

    queue!(
        out,
        SetForegroundColor(resolve_color(attrs.text_color, defaults.0, reverse_screen)),
        SetBackgroundColor(resolve_color(attrs.background_color, defaults.1, reverse_screen))
    )?;
    Ok(())
}

/// Paint the active screen, one output line per row
pub fn paint<W: Write, H: Host>(out: &mut W, session: &Session<H>, show_cursor: bool) -> io::Result<()> {
    let screen = session.screen();
    let defaults = session.default_colors();
    let reverse_screen = session.state().modes().reverse_screen;
    let (cursor_row, cursor_col) = session.cursor();
    let show_cursor = show_cursor && session.cursor_visible();

    let mut current: Option<(PenState, bool)> = None;
    let mut line_buffer = String::with_capacity(screen.columns());

    for row in 0..screen.rows() {
        for col in 0..screen.columns() {
            let cell = &screen[(row, col)];
            if cell.is_continuation() {
                continue;
            }
            let style = (cell.attrs, show_cursor && row == cursor_row && col == cursor_col);
            if current != Some(style) {
                if let Some((attrs, cursor)) = current {
                    apply_attrs(out, &attrs, defaults, reverse_screen, cursor)?;
                    queue!(out, Print(&line_buffer))?;
                    line_buffer.clear();
                }
                current = Some(style);
            }
            line_buffer.push_str(&cell.text());
        }
        if let Some((attrs, cursor)) = current.take() {
            apply_attrs(out, &attrs, defaults, reverse_screen, cursor)?;
            queue!(out, Print(&line_buffer))?;
            line_buffer.clear();
        }
        queue!(out, ResetColor, SetAttribute(Attribute::Reset), Print("\n"))?;
    }

    out.flush()
}

/// Plain text view with a status header
pub fn dump<H: Host>(session: &Session<H>, show_cursor: bool) -> String {
    let screen = session.screen();
    let (cursor_row, cursor_col) = session.cursor();
    let (top, bottom) = session.scrolling_region();
    let mut output = String::new();

    output.push_str(&format!(
        "=== Terminal {}x{} ===\n",
        session.columns(),
        session.rows()
    ));
    output.push_str(&format!(
        "Cursor: ({}, {}) visible={}\n",
        cursor_row,
        cursor_col,
        session.cursor_visible()
    ));
    output.push_str(&format!("Title: {}\n", session.title()));
    output.push_str(&format!("Alternate: {}\n", session.is_alternate_screen()));
    output.push_str(&format!("Region: {}..={}\n", top, bottom));
    output.push_str(&"─".repeat(session.columns()));
    output.push('\n');

    for row in 0..screen.rows() {
        for col in 0..screen.columns() {
            let cell = &screen[(row, col)];
            if show_cursor && session.cursor_visible() && (row, col) == (cursor_row, cursor_col) {
                output.push('█');
                continue;
            }
            if let Some(c) = cell.character {
                output.push(c);
            }
        }
        output.push('\n');
    }

    output.push_str(&"─".repeat(session.columns()));
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::NullHost;

    #[test]
    fn test_dump_plain() {
        let mut session = Session::new(4, 2, NullHost).unwrap();
        session.feed("ab\r\ncd\x1b]0;t\x07");
        let text = dump(&session, false);
        assert_eq!(
            text,
            "=== Terminal 4x2 ===\n\
             Cursor: (1, 2) visible=true\n\
             Title: t\n\
             Alternate: false\n\
             Region: 0..=1\n\
             ────\n\
             ab  \n\
             cd  \n\
             ────\n"
        );
    }

    #[test]
    fn test_dump_marks_cursor() {
        let mut session = Session::new(3, 1, NullHost).unwrap();
        session.feed("x");
        assert!(dump(&session, true).contains("x█ \n"));
        session.feed("\x1b[?25l");
        assert!(dump(&session, true).contains("x  \n"));
    }

    #[test]
    fn test_paint_styles_runs() {
        let mut session = Session::new(4, 1, NullHost).unwrap();
        session.feed("\x1b[1;31mab\x1b[0mc");
        let mut out = Vec::new();
        paint(&mut out, &session, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ab"));
        assert!(text.contains("c "));
        assert!(text.contains("\x1b[1m"));
        assert!(text.contains("\x1b[38;5;1m"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_reverse_screen_paints_default_colors() {
        assert_eq!(resolve_color(None, 7, false), Color::Reset);
        assert_eq!(resolve_color(None, 0, true), Color::AnsiValue(0));
        assert_eq!(resolve_color(Some(3), 0, true), Color::AnsiValue(3));
    }
}
