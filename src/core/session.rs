//! Session front end
//!
//! Couples the parser and terminal state with a [`Host`] that receives
//! reply bytes and notifications, and reports damage per batch of input.

use super::term::{Cell, Damage, Effect, Result, ScreenBuffer, TermError, TerminalState, VtParser};

/// Receiver for everything the terminal sends outward.
///
/// Called synchronously while input is being interpreted.
pub trait Host {
    /// Reply text for the child process (status reports, device attributes)
    fn write(&mut self, reply: &str);

    /// The terminal switched its own size (DECCOLM)
    fn resize(&mut self, _columns: usize, _rows: usize) {}

    /// BEL was received
    fn bell(&mut self) {}
}

/// Host that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn write(&mut self, _reply: &str) {}
}

/// A terminal session: state, parser and host
pub struct Session<H: Host> {
    state: TerminalState,
    parser: VtParser,
    host: H,
}

fn check_dimensions(columns: usize, rows: usize) -> Result<()> {
    if columns == 0 || rows == 0 {
        return Err(TermError::InvalidDimensions { columns, rows });
    }
    Ok(())
}

impl<H: Host> Session<H> {
    /// Create a session with a blank screen of the given size
    pub fn new(columns: usize, rows: usize, host: H) -> Result<Self> {
        check_dimensions(columns, rows)?;
        Ok(Self {
            state: TerminalState::new(columns, rows),
            parser: VtParser::new(),
            host,
        })
    }

    /// Interpret a chunk of input and report what changed on the active screen
    pub fn feed(&mut self, data: &str) -> Damage {
        let before = self.state.active_screen().clone();

        for c in data.chars() {
            if let Some(effect) = self.parser.advance(c, &mut self.state) {
                self.deliver(effect);
            }
        }

        let damage = if self.state.take_force_redraw() {
            Damage::full(self.state.active_screen())
        } else {
            Damage::between(&before, self.state.active_screen())
        };
        tracing::trace!(
            "Fed {} chars, {} cells damaged{}",
            data.chars().count(),
            damage.len(),
            if damage.is_full() { " (full)" } else { "" }
        );
        damage
    }

    fn deliver(&mut self, effect: Effect) {
        match effect {
            Effect::Reply(response) => self.host.write(&response.to_string()),
            Effect::Resize { columns, rows } => self.host.resize(columns, rows),
            Effect::Bell => self.host.bell(),
        }
    }

    /// Full reset (RIS). Any sequence in progress is abandoned.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.state.full_reset();
    }

    /// Resize from outside, e.g. after the window changed. Resets the screen
    /// but keeps reverse-screen mode.
    pub fn resize(&mut self, columns: usize, rows: usize) -> Result<()> {
        check_dimensions(columns, rows)?;
        self.parser.reset();
        self.state.set_screen_size(columns, rows);
        Ok(())
    }

    pub fn columns(&self) -> usize {
        self.state.columns()
    }

    pub fn rows(&self) -> usize {
        self.state.rows()
    }

    /// Cell on the active screen
    pub fn cell(&self, row: usize, col: usize) -> Result<&Cell> {
        self.state.active_screen().cell(row, col)
    }

    pub fn screen(&self) -> &ScreenBuffer {
        self.state.active_screen()
    }

    /// Cursor position as (row, col)
    pub fn cursor(&self) -> (usize, usize) {
        self.state.cursor()
    }

    pub fn cursor_visible(&self) -> bool {
        self.state.modes().cursor_visible
    }

    pub fn title(&self) -> &str {
        self.state.title()
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.state.is_alternate_screen()
    }

    /// Default (text, background) colors under the current screen mode
    pub fn default_colors(&self) -> (u8, u8) {
        self.state.default_colors()
    }

    /// Top and bottom rows of the scrolling region, inclusive
    pub fn scrolling_region(&self) -> (usize, usize) {
        self.state.scrolling_region()
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::PenState;

    #[derive(Default)]
    struct Recorder {
        replies: Vec<String>,
        resizes: Vec<(usize, usize)>,
        bells: usize,
    }

    impl Host for Recorder {
        fn write(&mut self, reply: &str) {
            self.replies.push(reply.to_string());
        }

        fn resize(&mut self, columns: usize, rows: usize) {
            self.resizes.push((columns, rows));
        }

        fn bell(&mut self) {
            self.bells += 1;
        }
    }

    fn session(columns: usize, rows: usize) -> Session<Recorder> {
        let mut session = Session::new(columns, rows, Recorder::default()).unwrap();
        // consume the initial full repaint
        session.feed("");
        session
    }

    fn ch(session: &Session<Recorder>, row: usize, col: usize) -> Option<char> {
        session.cell(row, col).unwrap().character
    }

    fn row_text(session: &Session<Recorder>, row: usize) -> String {
        session
            .screen()
            .row(row)
            .unwrap()
            .iter()
            .filter_map(|c| c.character)
            .collect()
    }

    fn check_invariants(session: &Session<Recorder>) {
        let (row, col) = session.cursor();
        assert!(row < session.rows());
        assert!(col < session.columns());
        let (top, bottom) = session.scrolling_region();
        assert!(top <= bottom);
        assert!(bottom < session.rows());
        for y in 0..session.rows() {
            assert_eq!(session.screen().row(y).unwrap().len(), session.columns());
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            Session::new(0, 24, NullHost),
            Err(TermError::InvalidDimensions { columns: 0, rows: 24 })
        ));
        assert!(Session::new(80, 0, NullHost).is_err());
        let mut session = Session::new(80, 24, NullHost).unwrap();
        assert!(session.resize(0, 0).is_err());
        assert_eq!(session.columns(), 80);
    }

    #[test]
    fn test_first_feed_is_full_damage() {
        let mut session = Session::new(10, 5, NullHost).unwrap();
        assert_eq!(session.feed(""), Damage::Full { rows: 5, columns: 10 });
        assert!(session.feed("").is_empty());
    }

    #[test]
    fn test_print_single_character() {
        let mut s = session(10, 5);
        let damage = s.feed("a");
        assert_eq!(damage, Damage::Cells(vec![(0, 0)]));
        let cell = s.cell(0, 0).unwrap();
        assert_eq!(cell.character, Some('a'));
        assert_eq!(cell.attrs, PenState::default());
        assert_eq!(s.cursor(), (0, 1));
    }

    #[test]
    fn test_deferred_wrap_at_last_column() {
        let mut s = session(10, 5);
        s.feed(&"a".repeat(10));
        assert_eq!(row_text(&s, 0), "aaaaaaaaaa");
        assert_eq!(s.cursor(), (0, 9));

        s.feed("b");
        assert_eq!(ch(&s, 1, 0), Some('b'));
        assert_eq!(s.cursor(), (1, 1));
        assert_eq!(row_text(&s, 0), "aaaaaaaaaa");
    }

    #[test]
    fn test_erase_display_keeps_cursor() {
        let mut s = session(10, 5);
        s.feed("hello\r\nworld\x1b[3;4H");
        let damage = s.feed("\x1b[2J");
        assert_eq!(damage.len(), 10);
        for y in 0..5 {
            for x in 0..10 {
                assert_eq!(*s.cell(y, x).unwrap(), Cell::default());
            }
        }
        assert_eq!(s.cursor(), (2, 3));
    }

    #[test]
    fn test_line_feed_scrolls_region() {
        let mut s = session(10, 5);
        s.feed("r0\r\nr1\r\nr2\r\nr3\r\nr4");
        s.feed("\x1b[3;5r");
        assert_eq!(s.scrolling_region(), (2, 4));
        s.feed("\x1b[5;1H\n");
        assert_eq!(row_text(&s, 0).trim_end(), "r0");
        assert_eq!(row_text(&s, 1).trim_end(), "r1");
        assert_eq!(row_text(&s, 2).trim_end(), "r3");
        assert_eq!(row_text(&s, 3).trim_end(), "r4");
        assert_eq!(row_text(&s, 4).trim_end(), "");
        assert_eq!(s.cursor(), (4, 0));
    }

    #[test]
    fn test_sgr_then_reset() {
        let mut s = session(10, 5);
        s.feed("\x1b[1m\x1b[31mX");
        let x = s.cell(0, 0).unwrap();
        assert_eq!(x.character, Some('X'));
        assert!(x.attrs.bold());
        assert_eq!(x.attrs.text_color, Some(1));

        s.feed("\x1b[0m");
        s.feed("Y");
        let y = s.cell(0, 1).unwrap();
        assert_eq!(y.character, Some('Y'));
        assert_eq!(y.attrs, PenState::default());
        assert_eq!(y.attrs.text_color, None);
        assert_eq!(y.attrs.background_color, None);
    }

    #[test]
    fn test_replies_reach_host() {
        let mut s = session(80, 24);
        s.feed("\x1b[3;7H\x1b[6n\x1b[5n\x1b[c\x1b[>c");
        assert_eq!(
            s.host().replies,
            vec!["\x1b[3;7R", "\x1b[0n", "\x1b[?1;2c", "\x1b[>85;95;0c"]
        );
    }

    #[test]
    fn test_column_mode_resizes_and_notifies() {
        let mut s = session(80, 24);
        s.feed("\x1b[?5hxyz");
        let damage = s.feed("\x1b[?3h");
        assert_eq!(damage, Damage::Full { rows: 24, columns: 132 });
        assert_eq!(s.columns(), 132);
        assert_eq!(s.host().resizes, vec![(132, 24)]);
        assert_eq!(ch(&s, 0, 0), Some(' '));
        // reverse mode survives the size switch
        assert_eq!(s.default_colors(), (0, 7));

        s.feed("\x1b[?3l");
        assert_eq!(s.columns(), 80);
        assert_eq!(s.host().resizes, vec![(132, 24), (80, 24)]);
    }

    #[test]
    fn test_reverse_mode_forces_full_damage() {
        let mut s = session(10, 5);
        assert_eq!(s.default_colors(), (7, 0));
        assert!(s.feed("\x1b[?5h").is_full());
        assert_eq!(s.default_colors(), (0, 7));
        assert!(s.feed("").is_empty());
        assert!(s.feed("\x1b[?5l").is_full());
        assert_eq!(s.default_colors(), (7, 0));
    }

    #[test]
    fn test_bell_reaches_host() {
        let mut s = session(10, 5);
        let damage = s.feed("\x07\x07");
        assert!(damage.is_empty());
        assert_eq!(s.host().bells, 2);
    }

    #[test]
    fn test_alternate_screen_round_trip() {
        let mut s = session(10, 5);
        s.feed("main");
        s.feed("\x1b[?47h");
        assert!(s.is_alternate_screen());
        assert_eq!(ch(&s, 0, 0), Some(' '));
        s.feed("\x1b[Halt");
        // switching back reports the cells that differ between the screens
        let damage = s.feed("\x1b[?47l");
        assert_eq!(damage, Damage::Cells(vec![(0, 0), (0, 1), (0, 2), (0, 3)]));
        assert_eq!(row_text(&s, 0).trim_end(), "main");
        s.feed("\x1b[?47h");
        assert_eq!(row_text(&s, 0).trim_end(), "alt");
    }

    #[test]
    fn test_title_and_cursor_visibility() {
        let mut s = session(10, 5);
        s.feed("\x1b]0;shell\x07\x1b[?25l");
        assert_eq!(s.title(), "shell");
        assert!(!s.cursor_visible());
        s.feed("\x1b[?25h");
        assert!(s.cursor_visible());
    }

    #[test]
    fn test_reset_matches_fresh_session() {
        let fresh = Session::new(10, 5, NullHost).unwrap();
        let mut s = Session::new(10, 5, NullHost).unwrap();
        s.reset();
        s.feed("\x1b[2;4r\x1b[?6h\x1b[1;33mhello\x1b]0;t\x07\x1b)0\x0e\x1b[?47h\x1b[");
        s.reset();

        assert_eq!(s.screen(), fresh.screen());
        assert_eq!(s.cursor(), fresh.cursor());
        assert_eq!(s.scrolling_region(), fresh.scrolling_region());
        assert_eq!(s.title(), fresh.title());
        assert_eq!(s.is_alternate_screen(), fresh.is_alternate_screen());
        assert_eq!(s.state().pen(), fresh.state().pen());
        assert_eq!(s.state().modes(), fresh.state().modes());
        assert_eq!(s.state().active_set(), 0);
        assert_eq!(s.state().charset(1), fresh.state().charset(1));
        assert_eq!(
            s.state().tab_stops().collect::<Vec<_>>(),
            fresh.state().tab_stops().collect::<Vec<_>>()
        );
        // the partial CSI was abandoned
        s.feed("A");
        assert_eq!(s.cell(0, 0).unwrap().character, Some('A'));
    }

    #[test]
    fn test_reset_clears_reverse_mode() {
        let mut s = session(10, 5);
        s.feed("\x1b[?5h");
        s.reset();
        assert_eq!(s.default_colors(), (7, 0));
        assert!(s.feed("").is_full());
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut s = session(20, 10);
        s.feed("\x1b[4;6H\x1b[1;32m\x1b)0\x0e\x1b7");
        s.feed("\x1b[10;1H\x1b[0m\x0f\x1b(A\x1b)B\x1b[?6h");
        s.feed("\x1b8");
        assert_eq!(s.cursor(), (3, 5));
        assert!(s.state().pen().bold());
        assert_eq!(s.state().pen().text_color, Some(2));
        assert_eq!(s.state().active_set(), 1);
        assert!(!s.state().modes().origin_relative);
        s.feed("q");
        assert_eq!(ch(&s, 3, 5), Some('─'));
    }

    #[test]
    fn test_invariants_hold_under_mixed_input() {
        let mut s = session(12, 6);
        let inputs = [
            "\x1b[99;99H",
            "\x1b[99A\x1b[99D",
            "\x1b[2;5r\x1b[?6h\x1b[99B",
            "\x1b[99L\x1b[99M\x1b[99@\x1b[99P",
            "\x1b[6;2r\x1b[0;3r",
            "wide あいうえおかきくけこ text",
            "\x1b[?7l0123456789abcdefgh",
            "\x1bM\x1bM\x1bM\x1bM\x1bM\x1bM\x1bM",
            "\x1b[99I\x1b[99Z\x1b[3g\tx",
            "\x1b[5b\x1b[?3h\x1b[99;200H",
            "\x1b[?3l\x1b[r\x1bc",
        ];
        for input in inputs {
            s.feed(input);
            check_invariants(&s);
        }
    }

    #[test]
    fn test_damage_reports_every_change() {
        let mut s = session(8, 4);
        s.feed("abcdefgh\r\nij");
        let before = s.screen().clone();
        let damage = s.feed("\x1b[1;3H\x1b[2PZ");
        let changed = Damage::between(&before, s.screen());
        assert_eq!(damage, changed);
        for (y, x) in damage.positions() {
            assert_ne!(before[(y, x)], s.screen()[(y, x)]);
        }
    }
}
