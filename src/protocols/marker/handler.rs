//! Marker protocol frame handler.

use super::parser::{classify, response_echo, response_failure};
use crate::protocols::Reply;

/// Build the reply for one frame.
///
/// Rules apply in order: echo (non-empty, no `fail_me`), then `exit`, then
/// `fail_me`. Echo and failure never both fire; `exit` only closes.
pub fn process(frame: &[u8]) -> Reply {
    let markers = classify(frame);
    let mut reply = Reply::default();

    if markers.echo {
        reply.response = Some(response_echo(frame));
    }
    if markers.exit {
        reply.close = true;
    }
    if markers.fail {
        reply.push(response_failure());
    }

    reply
}
