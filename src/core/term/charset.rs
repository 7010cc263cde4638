//! Character sets designatable into G0..G3

/// DEC special graphics, indexed from '`' (0x60) through '~' (0x7E)
const LINE_DRAWING: [char; 31] = [
    '◆', '▒', '␉', '␌', '␍', '␊', '°', '±', '␤', '␋', '┘', '┐', '┌', '└', '┼', '⎺', '⎻', '─',
    '⎼', '⎽', '├', '┤', '┴', '┬', '│', '≤', '≥', 'π', '≠', '£', '·',
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CharacterSet {
    /// US ASCII, no conversion
    #[default]
    Ascii,
    /// United Kingdom: '#' becomes the pound sign
    Uk,
    /// DEC special graphics
    LineDrawing,
}

impl CharacterSet {
    /// Select the set named by the final byte of `ESC ( X` and friends
    pub fn from_designator(c: char) -> Self {
        match c {
            'A' => CharacterSet::Uk,
            'B' | '1' | '2' => CharacterSet::Ascii,
            '0' => CharacterSet::LineDrawing,
            _ => {
                tracing::debug!("Unknown character set designation {:?}", c);
                CharacterSet::Ascii
            }
        }
    }

    pub fn map(self, c: char) -> char {
        match self {
            CharacterSet::Ascii => c,
            CharacterSet::Uk => {
                if c == '#' {
                    '£'
                } else {
                    c
                }
            }
            CharacterSet::LineDrawing => match c {
                '`'..='~' => LINE_DRAWING[(c as u32 - '`' as u32) as usize],
                _ => c,
            },
        }
    }
}
