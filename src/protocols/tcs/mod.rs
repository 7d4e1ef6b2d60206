//! TCS protocol implementation.
//!
//! Emulates the text command server of a PreciseFlex-style robot controller
//! so client code can be exercised without hardware:
//! - Client sends: `<command> [args...]\n`
//! - Server responds: `<code> <data>\r\n`
//!
//! Codes are `0` for success, `-1` for bad requests, and `-1046` when a
//! motion command arrives with robot power off.
//!
//! ## Protocol Format
//!
//! ```text
//! Request:  hp
//! Response: 0 1\r\n
//!
//! Request:  hp 0
//! Response: 0 \r\n
//!
//! Request:  move 1 2
//! Response: -1046 Robot power not enabled\r\n
//! ```
//!
//! Lines may be split across reads or batched into one; they are buffered
//! until a `\n` arrives. `exit` replies and closes the connection.

pub mod handler;
pub mod parser;
pub mod state;

pub use handler::TcsHandler;
