//! Terminal emulation core.
//!
//! - **cell**: character cells and graphic rendition
//! - **buffer**: contiguous cell grid with per-row line kinds
//! - **charset**: G0..G3 character set translation
//! - **state**: cursor, modes, tab stops and the screen operations
//! - **dispatch**: CSI and SGR tables, host replies
//! - **parser**: character-at-a-time escape sequence state machine
//! - **damage**: cell-level change tracking between snapshots

pub mod buffer;
pub mod cell;
pub mod charset;
pub mod damage;
pub mod dispatch;
pub mod error;
pub mod parser;
pub mod state;

pub use buffer::{RowKind, ScreenBuffer};
pub use cell::{AttrFlags, Cell, PenState};
pub use charset::CharacterSet;
pub use damage::Damage;
pub use dispatch::{Effect, Response};
pub use error::{Result, TermError};
pub use parser::{ParserState, VtParser};
pub use state::{SavedCursor, TerminalModes, TerminalState};
