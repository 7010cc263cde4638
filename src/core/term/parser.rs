//! VT sequence parser
//!
//! Consumes one character at a time and updates terminal state. The parser
//! state is a tagged enum; [`step`] maps (state, character) to the next
//! state plus any side effect for the host.

use super::buffer::RowKind;
use super::charset::CharacterSet;
use super::dispatch::{self, Effect};
use super::state::TerminalState;

/// Parser state machine
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Normal,
    Escape,
    /// After `ESC [`, accumulating the parameter string
    ControlSequence { params: String },
    /// After `ESC ]`, accumulating until BEL
    OperatingSystemCommand { text: String },
    /// ESC received within OSC, waiting for backslash
    OscEscape { text: String },
    /// After `ESC (`, `)`, `*` or `+`
    CharsetDesignation { slot: usize },
    /// After `ESC #`
    EscNumber,
    /// After `ESC N` or `ESC O`
    SingleShift { slot: usize },
}

/// Parser wrapper holding the current continuation
#[derive(Debug, Default)]
pub struct VtParser {
    state: ParserState,
}

impl VtParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Abandon any sequence in progress
    pub fn reset(&mut self) {
        self.state = ParserState::Normal;
    }

    /// Feed a single character to the parser
    pub fn advance(&mut self, c: char, term: &mut TerminalState) -> Option<Effect> {
        let state = std::mem::take(&mut self.state);
        let (next, effect) = step(state, c, term);
        self.state = next;
        term.end_step();
        effect
    }
}

/// Longest OSC payload kept while waiting for its terminator
const MAX_OSC_LEN: usize = 4096;

fn is_control(c: char) -> bool {
    c <= '\x1f' || c == '\x7f'
}

/// One transition of the state machine
pub fn step(state: ParserState, c: char, term: &mut TerminalState) -> (ParserState, Option<Effect>) {
    match state {
        ParserState::Normal => {
            if c == '\x1b' {
                (ParserState::Escape, None)
            } else if is_control(c) {
                (ParserState::Normal, execute_control(c, term))
            } else {
                term.print(c);
                (ParserState::Normal, None)
            }
        }
        ParserState::Escape => escape(c, term),
        ParserState::ControlSequence { mut params } => {
            if c == '\x1b' {
                tracing::warn!("ESC inside control sequence, dropping {:?}", params);
                (ParserState::Escape, None)
            } else if is_control(c) {
                let effect = execute_control(c, term);
                (ParserState::ControlSequence { params }, effect)
            } else if ('\x40'..='\x7e').contains(&c) {
                let effect = dispatch::execute_csi(c, &params, term);
                (ParserState::Normal, effect)
            } else if matches!(c, '?' | '>' | '0'..='9' | ';') {
                params.push(c);
                (ParserState::ControlSequence { params }, None)
            } else {
                tracing::warn!("Unexpected {:?} in control sequence {:?}", c, params);
                (ParserState::Normal, None)
            }
        }
        ParserState::OperatingSystemCommand { mut text } => match c {
            '\x07' => {
                execute_osc(&text, term);
                (ParserState::Normal, None)
            }
            '\x1b' => (ParserState::OscEscape { text }, None),
            _ if text.len() >= MAX_OSC_LEN => {
                tracing::warn!("OSC longer than {} bytes, dropped", MAX_OSC_LEN);
                (ParserState::Normal, None)
            }
            _ => {
                text.push(c);
                (ParserState::OperatingSystemCommand { text }, None)
            }
        },
        ParserState::OscEscape { text } => {
            execute_osc(&text, term);
            if c == '\\' {
                // ST (ESC \) - String Terminator
                (ParserState::Normal, None)
            } else {
                // Not ST: the byte starts a new escape sequence
                escape(c, term)
            }
        }
        ParserState::CharsetDesignation { slot } => {
            if let Some(interrupted) = interrupt(ParserState::CharsetDesignation { slot }, c, term) {
                return interrupted;
            }
            term.designate_charset(slot, CharacterSet::from_designator(c));
            (ParserState::Normal, None)
        }
        ParserState::EscNumber => {
            if let Some(interrupted) = interrupt(ParserState::EscNumber, c, term) {
                return interrupted;
            }
            match c {
                '3' => term.set_line_kind(RowKind::TopHalf),
                '4' => term.set_line_kind(RowKind::BottomHalf),
                '5' => term.set_line_kind(RowKind::Normal),
                '6' => term.set_line_kind(RowKind::DoubleWidth),
                '8' => term.screen_alignment_display(),
                _ => tracing::debug!("Unknown ESC # {:?}", c),
            }
            (ParserState::Normal, None)
        }
        ParserState::SingleShift { slot } => {
            if let Some(interrupted) = interrupt(ParserState::SingleShift { slot }, c, term) {
                return interrupted;
            }
            term.print_single_shift(slot, c);
            (ParserState::Normal, None)
        }
    }
}

/// Control characters inside a one-character continuation are executed
/// without leaving it; ESC starts over.
fn interrupt(
    current: ParserState,
    c: char,
    term: &mut TerminalState,
) -> Option<(ParserState, Option<Effect>)> {
    if c == '\x1b' {
        Some((ParserState::Escape, None))
    } else if is_control(c) {
        Some((current, execute_control(c, term)))
    } else {
        None
    }
}

fn escape(c: char, term: &mut TerminalState) -> (ParserState, Option<Effect>) {
    if let Some(interrupted) = interrupt(ParserState::Escape, c, term) {
        return interrupted;
    }
    match c {
        '[' => {
            return (
                ParserState::ControlSequence {
                    params: String::new(),
                },
                None,
            )
        }
        ']' => {
            return (
                ParserState::OperatingSystemCommand {
                    text: String::new(),
                },
                None,
            )
        }
        '#' => return (ParserState::EscNumber, None),
        '(' => return (ParserState::CharsetDesignation { slot: 0 }, None),
        ')' => return (ParserState::CharsetDesignation { slot: 1 }, None),
        '*' => return (ParserState::CharsetDesignation { slot: 2 }, None),
        '+' => return (ParserState::CharsetDesignation { slot: 3 }, None),
        'N' => return (ParserState::SingleShift { slot: 2 }, None),
        'O' => return (ParserState::SingleShift { slot: 3 }, None),
        '7' => term.save_cursor(),
        '8' => term.restore_cursor(),
        'c' => term.full_reset(),
        'M' => term.reverse_index(),
        'D' => term.index(),
        'E' => term.next_line(),
        'H' => term.set_tab_stop(),
        '=' => tracing::debug!("Application keypad mode"),
        '>' => tracing::debug!("Normal keypad mode"),
        _ => tracing::warn!("Unexpected {:?} after ESC", c),
    }
    (ParserState::Normal, None)
}

fn execute_control(c: char, term: &mut TerminalState) -> Option<Effect> {
    match c {
        '\x07' => return Some(Effect::Bell),
        '\x08' => term.backspace(),
        '\x09' => term.tab_forward(1),
        '\x0a' | '\x0b' | '\x0c' => term.index(),
        '\x0d' => term.carriage_return(),
        '\x0e' => term.invoke_charset(1), // SO
        '\x0f' => term.invoke_charset(0), // SI
        _ => tracing::trace!("Ignored control character {:?}", c),
    }
    None
}

fn execute_osc(text: &str, term: &mut TerminalState) {
    // Parse OSC: "code;text"
    match text.split_once(';') {
        Some(("0", title)) => term.set_title(title),
        _ => tracing::debug!("Unsupported OSC {:?}", text),
    }
}
