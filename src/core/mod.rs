//! Core terminal emulation components.
//!
//! - **term**: VT100/xterm terminal state, screen buffer and escape sequence parser
//! - **session**: the embeddable front end combining parser, state and host
//!
//! # Architecture
//!
//! ```text
//! Session<H: Host>
//! ├── Host (replies, resize requests, bell)
//! ├── VtParser (escape sequence continuation)
//! └── TerminalState
//!     ├── ScreenBuffer x2 (normal + alternate)
//!     ├── Cursor, pen, charsets, tab stops
//!     └── Modes (wrap, insert, origin, reverse)
//! ```

pub mod session;
pub mod term;
