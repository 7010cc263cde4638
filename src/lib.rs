//! vtgrid - a VT100/xterm escape sequence interpreter
//!
//! Feed program output into a [`Session`](core::session::Session) and read
//! back the screen, cursor and title, plus the set of cells that changed.
//!
//! ```
//! use vtgrid::core::session::{NullHost, Session};
//!
//! let mut session = Session::new(80, 24, NullHost).unwrap();
//! session.feed("\x1b[1mhello");
//! assert_eq!(session.cell(0, 0).unwrap().character, Some('h'));
//! assert_eq!(session.cursor(), (0, 5));
//! ```

pub mod config;
pub mod core;
pub mod render;
