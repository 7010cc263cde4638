//! Terminal state management
//!
//! This module defines the interpreter's state: the screen pair, cursor,
//! scrolling region, pen, character-set slots, tab stops and modes, along
//! with the primitive operations the command tables invoke.

use std::collections::BTreeSet;

use unicode_width::UnicodeWidthChar;

use super::buffer::{RowKind, ScreenBuffer};
use super::cell::{default_background_color, default_text_color, Cell, PenState};
use super::charset::CharacterSet;

/// Terminal modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminalModes {
    /// IRM: printing shifts the rest of the row right
    pub insert_mode: bool,
    /// DECAWM
    pub auto_wrap: bool,
    /// DECOM: cursor rows are relative to the scrolling region
    pub origin_relative: bool,
    /// DECTCEM
    pub cursor_visible: bool,
    /// DECSCNM: swaps the default text and background colors
    pub reverse_screen: bool,
    /// DECCKM. Recorded for the key encoder; the interpreter never reads it.
    pub application_cursor: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            insert_mode: false,
            auto_wrap: true,
            origin_relative: false,
            cursor_visible: true,
            reverse_screen: false,
            application_cursor: false,
        }
    }
}

/// Snapshot written by DECSC
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedCursor {
    pub x: usize,
    pub y: usize,
    pub pen: PenState,
    pub active_set: usize,
    pub charsets: [CharacterSet; 4],
    pub origin_relative: bool,
}

/// Terminal state holding all screen data
#[derive(Clone, Debug)]
pub struct TerminalState {
    columns: usize,
    rows: usize,
    /// The active screen
    screen: ScreenBuffer,
    /// Whichever screen is not active
    other_screen: ScreenBuffer,
    alternate_screen: bool,
    pub(crate) cursor_x: usize,
    pub(crate) cursor_y: usize,
    /// Scrolling region, 0-indexed and inclusive
    pub(crate) scroll_top: usize,
    pub(crate) scroll_bottom: usize,
    pub(crate) pen: PenState,
    pub(crate) charsets: [CharacterSet; 4],
    /// Invoked set: 0 for G0, 1 for G1
    pub(crate) active_set: usize,
    pub(crate) tab_stops: BTreeSet<usize>,
    pub(crate) saved_cursor: Option<SavedCursor>,
    pub(crate) modes: TerminalModes,
    pub(crate) title: String,
    pub(crate) last_graphic_char: char,
    last_written: Option<(usize, usize)>,
    last_op_was_print: bool,
    printed: bool,
    force_redraw: bool,
}

fn default_tab_stops(columns: usize) -> BTreeSet<usize> {
    (0..columns).step_by(8).collect()
}

impl TerminalState {
    /// Create a terminal of the given size. Dimensions must be positive.
    pub(crate) fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            screen: ScreenBuffer::blank(columns, rows),
            other_screen: ScreenBuffer::blank(columns, rows),
            alternate_screen: false,
            cursor_x: 0,
            cursor_y: 0,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            pen: PenState::default(),
            charsets: [CharacterSet::Ascii; 4],
            active_set: 0,
            tab_stops: default_tab_stops(columns),
            saved_cursor: None,
            modes: TerminalModes::default(),
            title: String::new(),
            last_graphic_char: ' ',
            last_written: None,
            last_op_was_print: false,
            printed: false,
            force_redraw: true,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn active_screen(&self) -> &ScreenBuffer {
        &self.screen
    }

    /// Cursor position as (row, col)
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_y, self.cursor_x)
    }

    pub fn scrolling_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.alternate_screen
    }

    pub fn pen(&self) -> &PenState {
        &self.pen
    }

    pub fn modes(&self) -> &TerminalModes {
        &self.modes
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tab_stops(&self) -> impl Iterator<Item = usize> + '_ {
        self.tab_stops.iter().copied()
    }

    pub fn saved_cursor(&self) -> Option<&SavedCursor> {
        self.saved_cursor.as_ref()
    }

    pub fn charset(&self, slot: usize) -> CharacterSet {
        self.charsets[slot]
    }

    pub fn active_set(&self) -> usize {
        self.active_set
    }

    /// Default (text, background) color indices for the current screen mode
    pub fn default_colors(&self) -> (u8, u8) {
        let reverse = self.modes.reverse_screen;
        (default_text_color(reverse), default_background_color(reverse))
    }

    /// Reinitialize everything for the current size
    pub fn full_reset(&mut self) {
        *self = Self::new(self.columns, self.rows);
    }

    /// Switch to a new size and reset, keeping reverse-screen mode
    pub fn set_screen_size(&mut self, columns: usize, rows: usize) {
        let reverse = self.modes.reverse_screen;
        *self = Self::new(columns, rows);
        self.modes.reverse_screen = reverse;
    }

    /// Consume the full-repaint request
    pub(crate) fn take_force_redraw(&mut self) -> bool {
        std::mem::take(&mut self.force_redraw)
    }

    /// Bookkeeping after each input character
    pub(crate) fn end_step(&mut self) {
        self.last_op_was_print = self.printed;
        self.printed = false;
    }

    /// Print a character through the invoked G0/G1 set
    pub fn print(&mut self, ch: char) {
        self.last_graphic_char = ch;
        let mapped = self.charsets[self.active_set].map(ch);
        self.put_char(mapped);
    }

    /// Print one character through G2 or G3 (SS2/SS3)
    pub fn print_single_shift(&mut self, slot: usize, ch: char) {
        self.last_graphic_char = ch;
        let mapped = self.charsets[slot].map(ch);
        self.put_char(mapped);
    }

    /// REP
    pub fn repeat_last_character(&mut self, n: usize) {
        let ch = self.last_graphic_char;
        for _ in 0..n {
            self.print(ch);
        }
    }

    fn put_char(&mut self, ch: char) {
        let width = ch.width().unwrap_or(1);
        if width == 2 && self.columns >= 2 {
            self.put_wide_char(ch);
            return;
        }

        if self.modes.insert_mode {
            self.insert_blank_characters(1);
        }
        let wrapped = self.cursor_x == self.columns - 1 && self.should_wrap_before_print();
        if wrapped {
            self.advance_cursor();
        }
        let at_last_column = !wrapped && self.cursor_x == self.columns - 1;
        self.write_cell(ch);
        if !at_last_column {
            self.advance_cursor();
        }
    }

    /// Deferred wrap: at the last column, only wrap when the previous step
    /// printed into this very cell.
    fn should_wrap_before_print(&self) -> bool {
        self.modes.auto_wrap
            && self.last_op_was_print
            && self.last_written == Some((self.cursor_y, self.cursor_x))
    }

    fn put_wide_char(&mut self, ch: char) {
        // Both halves must land on the same row.
        if self.cursor_x == self.columns - 1 {
            self.advance_cursor();
        }
        if self.modes.insert_mode {
            self.insert_blank_characters(2);
        }
        let (y, x) = (self.cursor_y, self.cursor_x);
        let pen = self.pen;
        self.screen[(y, x)] = Cell::new(ch, pen);
        self.screen[(y, x + 1)] = Cell::continuation(pen);
        // No deferred wrap for wide characters
        self.advance_cursor();
        self.advance_cursor();
    }

    fn write_cell(&mut self, ch: char) {
        let (y, x) = (self.cursor_y, self.cursor_x);
        self.screen[(y, x)] = Cell::new(ch, self.pen);
        self.last_written = Some((y, x));
        self.printed = true;
    }

    /// Move one cell right, wrapping to the next row from the last column
    fn advance_cursor(&mut self) {
        if self.cursor_x == self.columns - 1 {
            self.cursor_x = 0;
            self.index();
        } else {
            self.cursor_x += 1;
        }
    }

    /// Carriage return - move cursor to column 0
    pub fn carriage_return(&mut self) {
        self.cursor_x = 0;
    }

    /// Backspace - move cursor left
    pub fn backspace(&mut self) {
        self.cursor_x = self.cursor_x.saturating_sub(1);
    }

    /// Index (also LF, VT, FF) - cursor down, scroll if at the region bottom
    pub fn index(&mut self) {
        if self.cursor_y == self.scroll_bottom {
            self.screen.scroll_up(self.scroll_top, self.scroll_bottom, 1);
        } else if self.cursor_y < self.rows - 1 {
            self.cursor_y += 1;
        }
    }

    /// Reverse index - cursor up, scroll if at the region top
    pub fn reverse_index(&mut self) {
        if self.cursor_y == self.scroll_top {
            self.screen.scroll_down(self.scroll_top, self.scroll_bottom, 1);
        } else if self.cursor_y > 0 {
            self.cursor_y -= 1;
        }
    }

    /// NEL
    pub fn next_line(&mut self) {
        self.carriage_return();
        self.index();
    }

    /// Shift Out / Shift In
    pub fn invoke_charset(&mut self, set: usize) {
        self.active_set = set;
    }

    pub fn designate_charset(&mut self, slot: usize, set: CharacterSet) {
        self.charsets[slot] = set;
    }

    fn in_scrolling_region(&self) -> bool {
        self.cursor_y >= self.scroll_top && self.cursor_y <= self.scroll_bottom
    }

    pub fn cursor_up(&mut self, n: usize) {
        let limit = if self.in_scrolling_region() { self.scroll_top } else { 0 };
        self.cursor_y = self.cursor_y.saturating_sub(n).max(limit);
    }

    pub fn cursor_down(&mut self, n: usize) {
        let limit = if self.in_scrolling_region() {
            self.scroll_bottom
        } else {
            self.rows - 1
        };
        self.cursor_y = self.cursor_y.saturating_add(n).min(limit);
    }

    pub fn cursor_forward(&mut self, n: usize) {
        self.cursor_x = self.cursor_x.saturating_add(n).min(self.columns - 1);
    }

    pub fn cursor_backward(&mut self, n: usize) {
        self.cursor_x = self.cursor_x.saturating_sub(n);
    }

    /// CHA (1-indexed)
    pub fn cursor_to_column(&mut self, col: usize) {
        self.cursor_x = col.saturating_sub(1).min(self.columns - 1);
    }

    /// VPA (1-indexed)
    pub fn cursor_to_row(&mut self, row: usize) {
        self.cursor_y = row.saturating_sub(1).min(self.rows - 1);
    }

    /// CUP (1-indexed). In origin mode the row counts from the region top.
    pub fn cursor_position(&mut self, row: usize, col: usize) {
        let row = row.saturating_sub(1);
        self.cursor_y = if self.modes.origin_relative {
            self.scroll_top.saturating_add(row).min(self.scroll_bottom)
        } else {
            row.min(self.rows - 1)
        };
        self.cursor_x = col.saturating_sub(1).min(self.columns - 1);
    }

    pub fn go_home(&mut self) {
        self.cursor_x = 0;
        self.cursor_y = if self.modes.origin_relative {
            self.scroll_top
        } else {
            0
        };
    }

    /// HT / CHT
    pub fn tab_forward(&mut self, n: usize) {
        for _ in 0..n {
            self.cursor_x = self
                .tab_stops
                .range(self.cursor_x + 1..)
                .next()
                .copied()
                .unwrap_or(self.columns - 1)
                .min(self.columns - 1);
        }
    }

    /// CBT
    pub fn tab_backward(&mut self, n: usize) {
        for _ in 0..n {
            self.cursor_x = self
                .tab_stops
                .range(..self.cursor_x)
                .next_back()
                .copied()
                .unwrap_or(0);
        }
    }

    /// HTS
    pub fn set_tab_stop(&mut self) {
        self.tab_stops.insert(self.cursor_x);
    }

    /// TBC
    pub fn clear_tab_stop(&mut self, mode: usize) {
        match mode {
            0 => {
                self.tab_stops.remove(&self.cursor_x);
            }
            3 => self.tab_stops.clear(),
            _ => tracing::debug!("TBC: unknown parameter {}", mode),
        }
    }

    /// Erase in display
    pub fn erase_in_display(&mut self, mode: usize) {
        let cursor = self.cursor_y * self.columns + self.cursor_x;
        let len = self.screen.len();
        match mode {
            0 => self.screen.clear_range(cursor, len),
            // Includes the cursor cell
            1 => self.screen.clear_range(0, cursor + 1),
            2 => self.screen.clear_range(0, len),
            _ => tracing::debug!("ED: unknown parameter {}", mode),
        }
    }

    /// Erase in line
    pub fn erase_in_line(&mut self, mode: usize) {
        let start = self.cursor_y * self.columns;
        let cursor = start + self.cursor_x;
        let end = start + self.columns;
        match mode {
            0 => self.screen.clear_range(cursor, end),
            1 => self.screen.clear_range(start, cursor + 1),
            2 => self.screen.clear_range(start, end),
            _ => tracing::debug!("EL: unknown parameter {}", mode),
        }
    }

    /// ECH
    pub fn erase_characters(&mut self, n: usize) {
        let n = n.min(self.columns - self.cursor_x);
        let x = self.cursor_x;
        self.screen.row_mut(self.cursor_y)[x..x + n].fill(Cell::default());
    }

    /// DCH
    pub fn delete_characters(&mut self, n: usize) {
        let n = n.min(self.columns - self.cursor_x);
        let x = self.cursor_x;
        let tail = &mut self.screen.row_mut(self.cursor_y)[x..];
        tail.rotate_left(n);
        let len = tail.len();
        tail[len - n..].fill(Cell::default());
    }

    /// ICH
    pub fn insert_blank_characters(&mut self, n: usize) {
        let n = n.min(self.columns - self.cursor_x);
        let x = self.cursor_x;
        let tail = &mut self.screen.row_mut(self.cursor_y)[x..];
        tail.rotate_right(n);
        tail[..n].fill(Cell::default());
    }

    /// IL
    pub fn insert_lines(&mut self, n: usize) {
        if !self.in_scrolling_region() {
            tracing::debug!("IL: cursor outside scrolling region");
            return;
        }
        let n = n.min(self.scroll_bottom - self.cursor_y + 1);
        self.screen.scroll_down(self.cursor_y, self.scroll_bottom, n);
    }

    /// DL
    pub fn delete_lines(&mut self, n: usize) {
        if !self.in_scrolling_region() {
            tracing::debug!("DL: cursor outside scrolling region");
            return;
        }
        let n = n.min(self.scroll_bottom - self.cursor_y + 1);
        self.screen.scroll_up(self.cursor_y, self.scroll_bottom, n);
    }

    /// DECSTBM (1-indexed, inclusive). Invalid ranges leave the region
    /// unchanged and return false.
    pub fn set_scrolling_region(&mut self, top: usize, bottom: usize) -> bool {
        if top >= bottom || top < 1 || bottom > self.rows {
            tracing::warn!("DECSTBM: invalid range {};{}", top, bottom);
            return false;
        }
        self.scroll_top = top - 1;
        self.scroll_bottom = bottom - 1;
        self.go_home();
        true
    }

    /// DECSC
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            x: self.cursor_x,
            y: self.cursor_y,
            pen: self.pen,
            active_set: self.active_set,
            charsets: self.charsets,
            origin_relative: self.modes.origin_relative,
        });
    }

    /// DECRC. Without a prior save the cursor goes home.
    pub fn restore_cursor(&mut self) {
        match self.saved_cursor.clone() {
            Some(saved) => {
                self.cursor_x = saved.x.min(self.columns - 1);
                self.cursor_y = saved.y.min(self.rows - 1);
                self.pen = saved.pen;
                self.active_set = saved.active_set;
                self.charsets = saved.charsets;
                self.modes.origin_relative = saved.origin_relative;
            }
            None => self.go_home(),
        }
    }

    /// DECALN: fill the screen with 'E' in the default rendition
    pub fn screen_alignment_display(&mut self) {
        self.screen.fill(Cell::new('E', PenState::default()));
    }

    /// DECDHL / DECSWL / DECDWL for the cursor row
    pub fn set_line_kind(&mut self, kind: RowKind) {
        if self.screen.row_kind(self.cursor_y) == Ok(kind) {
            return;
        }
        if self.screen.set_row_kind(self.cursor_y, kind).is_ok() {
            // Row geometry is not part of any cell
            self.force_redraw = true;
        }
    }

    /// Switch between the normal and alternate screens
    pub fn use_alternate_screen(&mut self, alternate: bool) {
        if self.alternate_screen == alternate {
            return;
        }
        std::mem::swap(&mut self.screen, &mut self.other_screen);
        self.alternate_screen = alternate;
    }

    pub fn set_reverse_screen(&mut self, reverse: bool) {
        self.modes.reverse_screen = reverse;
        self.force_redraw = true;
    }

    pub fn set_origin_mode(&mut self, relative: bool) {
        self.modes.origin_relative = relative;
        self.go_home();
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }
}
