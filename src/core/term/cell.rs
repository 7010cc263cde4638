//! Cells and pen state
//!
//! A cell is the smallest addressable unit of the grid. The pen is the
//! styling applied to the next printed character.

use bitflags::bitflags;

bitflags! {
    /// Graphic rendition flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u16 {
        const BOLD          = 0b0000_0000_0001;
        const FAINT         = 0b0000_0000_0010;
        const ITALIC        = 0b0000_0000_0100;
        const UNDERLINE     = 0b0000_0000_1000;
        const BLINK         = 0b0000_0001_0000;
        const FAST_BLINK    = 0b0000_0010_0000;
        const FRAKTUR       = 0b0000_0100_0000;
        const CROSSED_OUT   = 0b0000_1000_0000;
        const CONCEAL       = 0b0001_0000_0000;
        const REVERSE_VIDEO = 0b0010_0000_0000;
    }
}

/// Graphic attributes ("pen") of a cell.
///
/// A `None` color means "the terminal's current default", which is resolved
/// at render time through [`default_text_color`] and
/// [`default_background_color`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PenState {
    /// Text color index in `0..=7`
    pub text_color: Option<u8>,
    /// Background color index in `0..=7`
    pub background_color: Option<u8>,
    pub flags: AttrFlags,
}

impl PenState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn bold(&self) -> bool {
        self.flags.contains(AttrFlags::BOLD)
    }

    pub fn faint(&self) -> bool {
        self.flags.contains(AttrFlags::FAINT)
    }

    pub fn italic(&self) -> bool {
        self.flags.contains(AttrFlags::ITALIC)
    }

    pub fn underline(&self) -> bool {
        self.flags.contains(AttrFlags::UNDERLINE)
    }

    pub fn blink(&self) -> bool {
        self.flags.contains(AttrFlags::BLINK)
    }

    pub fn fast_blink(&self) -> bool {
        self.flags.contains(AttrFlags::FAST_BLINK)
    }

    pub fn fraktur(&self) -> bool {
        self.flags.contains(AttrFlags::FRAKTUR)
    }

    pub fn crossed_out(&self) -> bool {
        self.flags.contains(AttrFlags::CROSSED_OUT)
    }

    pub fn conceal(&self) -> bool {
        self.flags.contains(AttrFlags::CONCEAL)
    }

    pub fn reverse_video(&self) -> bool {
        self.flags.contains(AttrFlags::REVERSE_VIDEO)
    }
}

/// Default text color index for the given reverse-screen mode
pub const fn default_text_color(reverse_screen: bool) -> u8 {
    if reverse_screen {
        0
    } else {
        7
    }
}

/// Default background color index for the given reverse-screen mode
pub const fn default_background_color(reverse_screen: bool) -> u8 {
    if reverse_screen {
        7
    } else {
        0
    }
}

/// A single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The stored character; `None` marks the trailing half of a wide character
    pub character: Option<char>,
    pub attrs: PenState,
    /// Reserved, always false
    pub broken: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            character: Some(' '),
            attrs: PenState::default(),
            broken: false,
        }
    }
}

impl Cell {
    pub fn new(ch: char, attrs: PenState) -> Self {
        Self {
            character: Some(ch),
            attrs,
            broken: false,
        }
    }

    /// Trailing half of a double-width character
    pub fn continuation(attrs: PenState) -> Self {
        Self {
            character: None,
            attrs,
            broken: false,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.character.is_none()
    }

    /// Get the display text (empty for continuation cells)
    pub fn text(&self) -> String {
        self.character.map(String::from).unwrap_or_default()
    }
}
