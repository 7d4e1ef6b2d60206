//! Marker protocol implementation.
//!
//! The default fixture. Every frame is classified by raw byte substrings
//! found anywhere in it, with no tokenizing and no anchoring:
//!
//! - no `fail_me`, non-empty: echo as `0 <frame>\r\n`
//! - `fail_me`: reply `-1234\r\n` instead of the echo
//! - `exit`: close the connection after the reply for this frame
//!
//! ## Protocol Format
//!
//! ```text
//! Request:  ping
//! Response: 0 ping\r\n
//!
//! Request:  fail_me exit
//! Response: -1234\r\n   (then the server closes)
//! ```
//!
//! Frames are whatever one read returns, so a command split across reads
//! or two commands in one read are classified as they arrive.

pub mod handler;
pub mod parser;

pub use handler::process;
