//! Command dispatch tables
//!
//! Maps CSI final bytes, private mode numbers and SGR codes to the state
//! operations they invoke.

use std::fmt;

use super::cell::AttrFlags;
use super::state::TerminalState;

/// Response that needs to be sent back to the PTY
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Cursor position report: ESC [ row ; col R (1-indexed)
    CursorPosition(usize, usize),
    /// Operating status report: terminal OK
    OperatingStatus,
    /// Primary device attributes (VT100 with advanced video option)
    DeviceAttributes,
    /// Secondary device attributes
    SecondaryDeviceAttributes,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::CursorPosition(row, col) => write!(f, "\x1b[{};{}R", row, col),
            Response::OperatingStatus => f.write_str("\x1b[0n"),
            Response::DeviceAttributes => f.write_str("\x1b[?1;2c"),
            Response::SecondaryDeviceAttributes => f.write_str("\x1b[>85;95;0c"),
        }
    }
}

/// Side effect raised while interpreting input, delivered to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Reply bytes for the child process
    Reply(Response),
    /// The screen switched size (DECCOLM)
    Resize { columns: usize, rows: usize },
    /// BEL
    Bell,
}

/// Parsed `;`-separated CSI parameters. Empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Option<usize>>);

impl Params {
    pub fn parse(s: &str) -> Self {
        if s.is_empty() {
            return Self(Vec::new());
        }
        Self(s.split(';').map(parse_number).collect())
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.0.get(index).copied().flatten()
    }

    /// Parameter `index`, or `default` when missing or empty
    pub fn or(&self, index: usize, default: usize) -> usize {
        self.get(index).unwrap_or(default)
    }

    /// Like [`Params::or`], but an explicit 0 also means `default`
    pub fn count(&self, index: usize, default: usize) -> usize {
        match self.get(index) {
            None | Some(0) => default,
            Some(n) => n,
        }
    }

    /// Every parameter, with empty fields read as 0
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|p| p.unwrap_or(0))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_number(field: &str) -> Option<usize> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(field.bytes().fold(0usize, |acc, b| {
        acc.saturating_mul(10).saturating_add((b - b'0') as usize)
    }))
}

/// Execute a control sequence: `ESC [ <params> <final_byte>`
pub fn execute_csi(final_byte: char, raw: &str, state: &mut TerminalState) -> Option<Effect> {
    if let Some(rest) = raw.strip_prefix('?') {
        return execute_private(final_byte, &Params::parse(rest), state);
    }
    if let Some(rest) = raw.strip_prefix('>') {
        return execute_secondary(final_byte, &Params::parse(rest));
    }

    let params = Params::parse(raw);
    match final_byte {
        // Cursor movement
        'A' => state.cursor_up(params.count(0, 1)),
        'B' => state.cursor_down(params.count(0, 1)),
        'C' => state.cursor_forward(params.count(0, 1)),
        'D' => state.cursor_backward(params.count(0, 1)),
        'G' => state.cursor_to_column(params.count(0, 1)),
        'H' | 'f' => state.cursor_position(params.count(0, 1), params.count(1, 1)),
        'd' => state.cursor_to_row(params.count(0, 1)),

        // Tabulation
        'I' => state.tab_forward(params.count(0, 1)),
        'Z' => state.tab_backward(params.count(0, 1)),
        'g' => state.clear_tab_stop(params.or(0, 0)),

        // Erase
        'J' => state.erase_in_display(params.or(0, 0)),
        'K' => state.erase_in_line(params.or(0, 0)),

        // Character and line operations
        'P' => state.delete_characters(params.count(0, 1)),
        'X' => state.erase_characters(params.count(0, 1)),
        '@' => state.insert_blank_characters(params.count(0, 1)),
        'L' => state.insert_lines(params.count(0, 1)),
        'M' => state.delete_lines(params.count(0, 1)),
        'b' => state.repeat_last_character(params.count(0, 1)),

        'm' => execute_sgr(&params, state),

        'r' => {
            let top = params.or(0, 1);
            let bottom = params.or(1, state.rows());
            state.set_scrolling_region(top, bottom);
        }

        // Modes
        'h' => set_mode(&params, state, true),
        'l' => set_mode(&params, state, false),

        // Reports
        'n' => {
            return match params.get(0) {
                Some(5) => Some(Effect::Reply(Response::OperatingStatus)),
                _ => {
                    let (row, col) = state.cursor();
                    Some(Effect::Reply(Response::CursorPosition(row + 1, col + 1)))
                }
            };
        }
        'c' => {
            return match params.or(0, 0) {
                0 => Some(Effect::Reply(Response::DeviceAttributes)),
                _ => {
                    tracing::debug!("DA: unknown parameter {:?}", raw);
                    None
                }
            };
        }

        _ => {
            tracing::debug!("Unknown CSI: params={:?}, final={:?}", raw, final_byte);
        }
    }
    None
}

/// `CSI > ... <final>`
fn execute_secondary(final_byte: char, params: &Params) -> Option<Effect> {
    match (final_byte, params.or(0, 0)) {
        ('c', 0) => Some(Effect::Reply(Response::SecondaryDeviceAttributes)),
        _ => {
            tracing::debug!("Unknown CSI >: params={:?}, final={:?}", params, final_byte);
            None
        }
    }
}

/// `CSI ? ... <final>`
fn execute_private(final_byte: char, params: &Params, state: &mut TerminalState) -> Option<Effect> {
    let enable = match final_byte {
        'h' => true,
        'l' => false,
        _ => {
            tracing::debug!("Unknown CSI ?: params={:?}, final={:?}", params, final_byte);
            return None;
        }
    };

    let mut effect = None;
    for mode in params.iter() {
        if let Some(e) = set_private_mode(mode, enable, state) {
            effect = Some(e);
        }
    }
    effect
}

/// Set or reset one DEC private mode
pub fn set_private_mode(mode: usize, enable: bool, state: &mut TerminalState) -> Option<Effect> {
    match mode {
        1 => {
            tracing::debug!(
                "{} cursor keys",
                if enable { "application" } else { "normal" }
            );
            state.modes.application_cursor = enable;
        }
        3 => {
            let (columns, rows) = if enable { (132, 24) } else { (80, 24) };
            state.set_screen_size(columns, rows);
            return Some(Effect::Resize { columns, rows });
        }
        4 => tracing::debug!("DECSCLM (smooth scroll) ignored"),
        5 => state.set_reverse_screen(enable),
        6 => state.set_origin_mode(enable),
        7 => state.modes.auto_wrap = enable,
        25 => state.modes.cursor_visible = enable,
        47 => state.use_alternate_screen(enable),
        _ => tracing::debug!(
            "Unimplemented private mode {} {}",
            mode,
            if enable { "set" } else { "reset" }
        ),
    }
    None
}

/// SM / RM. Only IRM (4) is implemented.
fn set_mode(params: &Params, state: &mut TerminalState, enable: bool) {
    for mode in params.iter() {
        match mode {
            4 => state.modes.insert_mode = enable,
            2 | 12 | 20 => tracing::debug!("Unimplemented mode {}", mode),
            _ => tracing::debug!("Unknown mode {}", mode),
        }
    }
}

/// SGR - Select Graphic Rendition
///
/// An unknown code stops processing; codes after it in the same sequence
/// are dropped.
pub fn execute_sgr(params: &Params, state: &mut TerminalState) {
    if params.is_empty() {
        state.pen.reset();
        return;
    }

    let pen = &mut state.pen;
    let mut iter = params.iter();

    while let Some(code) = iter.next() {
        match code {
            0 => pen.reset(),
            1 => pen.flags |= AttrFlags::BOLD,
            2 => pen.flags |= AttrFlags::FAINT,
            3 => pen.flags |= AttrFlags::ITALIC,
            4 => pen.flags |= AttrFlags::UNDERLINE,
            5 => pen.flags |= AttrFlags::BLINK,
            6 => pen.flags |= AttrFlags::FAST_BLINK,
            7 => pen.flags |= AttrFlags::REVERSE_VIDEO,
            8 => pen.flags |= AttrFlags::CONCEAL,
            9 => pen.flags |= AttrFlags::CROSSED_OUT,
            20 => pen.flags |= AttrFlags::FRAKTUR,
            21 => pen.flags.remove(AttrFlags::BOLD),

            10..=19 | 22..=29 => tracing::debug!("Unsupported SGR code {}", code),

            30..=37 => pen.text_color = Some((code - 30) as u8),
            39 => pen.text_color = None,
            40..=47 => pen.background_color = Some((code - 40) as u8),
            49 => pen.background_color = None,

            38 | 48 => {
                // Extended colors are consumed but not applied.
                let consumed = match iter.next() {
                    Some(5) => iter.next().map(|_| 1),
                    Some(2) => {
                        let rgb = iter.by_ref().take(3).count();
                        Some(rgb)
                    }
                    other => {
                        tracing::debug!("SGR {}: unknown color space {:?}", code, other);
                        None
                    }
                };
                tracing::debug!("Unsupported extended color SGR {} ({:?})", code, consumed);
            }

            _ => {
                tracing::debug!("Unknown SGR code {}, dropping the rest of {:?}", code, params);
                return;
            }
        }
    }
}
