//! Protocol implementations.
//!
//! Each protocol has a parser module with the pure byte-level logic and a
//! handler that turns one received frame into a [`Reply`].
//!
//! - `marker`: raw substring markers (`exit`, `fail_me`) with echo responses.
//!   This is the default fixture.
//! - `tcs`: line-based emulation of the robot's TCS command server.

pub mod marker;
pub mod tcs;

use bytes::BytesMut;
use std::time::Duration;

use crate::config::{Config, ProtocolType};

/// What to do in response to one frame.
#[derive(Debug, Default)]
pub struct Reply {
    /// Bytes to write back, if any.
    pub response: Option<BytesMut>,
    /// Pause before writing the response.
    pub delay: Option<Duration>,
    /// End the session once the response is written.
    pub close: bool,
}

impl Reply {
    /// Append `bytes` to the response, creating it if needed.
    pub fn push(&mut self, bytes: &[u8]) {
        self.response
            .get_or_insert_with(|| BytesMut::with_capacity(bytes.len()))
            .extend_from_slice(bytes);
    }
}

/// Per-session protocol handler.
#[derive(Debug)]
pub enum Handler {
    Marker,
    Tcs(tcs::TcsHandler),
}

impl Handler {
    pub fn new(config: &Config) -> Self {
        match config.protocol {
            ProtocolType::Marker => Handler::Marker,
            ProtocolType::Tcs => Handler::Tcs(tcs::TcsHandler::new(config.eom_delay)),
        }
    }

    /// Classify one frame and build the reply.
    pub fn process(&mut self, frame: &[u8]) -> Reply {
        match self {
            Handler::Marker => marker::process(frame),
            Handler::Tcs(handler) => handler.process(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_push_accumulates() {
        let mut reply = Reply::default();
        assert!(reply.response.is_none());

        reply.push(b"0 \r\n");
        reply.push(b"0 1\r\n");
        assert_eq!(reply.response.as_deref(), Some(&b"0 \r\n0 1\r\n"[..]));
    }

    #[test]
    fn test_handler_selection() {
        let mut config = Config::default();
        assert!(matches!(Handler::new(&config), Handler::Marker));

        config.protocol = ProtocolType::Tcs;
        assert!(matches!(Handler::new(&config), Handler::Tcs(_)));
    }

    #[test]
    fn test_dispatch() {
        let mut config = Config::default();
        let mut marker = Handler::new(&config);
        assert_eq!(marker.process(b"nop\n").response.as_deref(), Some(&b"0 nop\n\r\n"[..]));

        config.protocol = ProtocolType::Tcs;
        let mut tcs = Handler::new(&config);
        assert_eq!(tcs.process(b"nop\n").response.as_deref(), Some(&b"0 \r\n"[..]));
    }
}
