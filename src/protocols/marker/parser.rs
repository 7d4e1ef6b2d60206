//! Marker protocol parser.

use bytes::BytesMut;

/// Substring that closes the connection after the current reply.
pub const EXIT_MARKER: &[u8] = b"exit";

/// Substring that swaps the echo for the failure response.
pub const FAIL_MARKER: &[u8] = b"fail_me";

const ECHO_PREFIX: &[u8] = b"0 ";
const FAILURE_RESPONSE: &[u8] = b"-1234\r\n";

/// Markers found in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Markers {
    /// Frame is non-empty and carries no `fail_me`.
    pub echo: bool,
    /// Frame contains `exit`.
    pub exit: bool,
    /// Frame contains `fail_me`.
    pub fail: bool,
}

/// Classify a frame against all marker rules.
pub fn classify(frame: &[u8]) -> Markers {
    let fail = contains(frame, FAIL_MARKER);
    Markers {
        echo: !frame.is_empty() && !fail,
        exit: contains(frame, EXIT_MARKER),
        fail,
    }
}

/// Format an echo response: `0 ` + frame + `\r\n`.
pub fn response_echo(frame: &[u8]) -> BytesMut {
    let mut resp = BytesMut::with_capacity(ECHO_PREFIX.len() + frame.len() + 2);
    resp.extend_from_slice(ECHO_PREFIX);
    resp.extend_from_slice(frame);
    resp.extend_from_slice(b"\r\n");
    resp
}

/// Format the injected failure response.
pub fn response_failure() -> &'static [u8] {
    FAILURE_RESPONSE
}

/// Unanchored byte substring search.
fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_plain() {
        assert_eq!(
            classify(b"ping"),
            Markers {
                echo: true,
                exit: false,
                fail: false
            }
        );
    }

    #[test]
    fn test_classify_empty() {
        assert_eq!(classify(b""), Markers::default());
    }

    #[test]
    fn test_classify_exit() {
        let markers = classify(b"exit");
        assert!(markers.echo);
        assert!(markers.exit);
        assert!(!markers.fail);
    }

    #[test]
    fn test_classify_fail_suppresses_echo() {
        let markers = classify(b"fail_me exit");
        assert!(!markers.echo);
        assert!(markers.exit);
        assert!(markers.fail);
    }

    #[test]
    fn test_markers_match_anywhere() {
        assert!(classify(b"xxfail_mexx").fail);
        assert!(classify(b"preexit\r\n").exit);
        assert!(classify(b"\x00\x01exit\xff").exit);
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let markers = classify(b"EXIT FAIL_ME");
        assert!(markers.echo);
        assert!(!markers.exit);
        assert!(!markers.fail);
    }

    #[test]
    fn test_partial_markers_do_not_match() {
        let markers = classify(b"fail_ ex it");
        assert!(markers.echo);
        assert!(!markers.exit);
        assert!(!markers.fail);
    }

    #[test]
    fn test_response_echo_preserves_bytes() {
        assert_eq!(&response_echo(b"ping")[..], b"0 ping\r\n");
        assert_eq!(&response_echo(b"a\r\n\x00b")[..], b"0 a\r\n\x00b\r\n");
    }

    #[test]
    fn test_response_failure() {
        assert_eq!(response_failure(), b"-1234\r\n");
    }
}
