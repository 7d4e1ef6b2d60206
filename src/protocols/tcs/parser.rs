//! TCS protocol parser.

use bytes::BytesMut;

/// Operation completed successfully.
pub const CODE_SUCCESS: i32 = 0;
/// Generic failure (bad arguments, unknown command).
pub const CODE_ERROR: i32 = -1;
/// Motion requested while robot power is off.
pub const CODE_POWER_NOT_ENABLED: i32 = -1046;

/// Known TCS commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NoOp,
    Mode,
    Power,
    SelectRobot,
    Attach,
    Home,
    Halt,
    Loc,
    LocXyz,
    Profile,
    Move,
    MoveCart,
    MoveJoints,
    MotionState,
    MoveOneAxis,
    MoveRail,
    GetParam,
    WhereJoints,
    WhereCart,
    FreeMode,
    SystemSpeed,
    Payload,
    WaitForEom,
    Exit,
}

impl Command {
    /// Look up a command by its wire name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let command = match name {
            "nop" => Command::NoOp,
            "mode" => Command::Mode,
            "hp" => Command::Power,
            "selectRobot" => Command::SelectRobot,
            "attach" => Command::Attach,
            "home" => Command::Home,
            "halt" => Command::Halt,
            "loc" => Command::Loc,
            "locXYZ" => Command::LocXyz,
            "profile" => Command::Profile,
            "move" => Command::Move,
            "movec" => Command::MoveCart,
            "movej" => Command::MoveJoints,
            "state" => Command::MotionState,
            "moveoneaxis" => Command::MoveOneAxis,
            "moveRail" => Command::MoveRail,
            "pd" => Command::GetParam,
            "wherej" => Command::WhereJoints,
            "wherec" => Command::WhereCart,
            "freemode" => Command::FreeMode,
            "mspeed" => Command::SystemSpeed,
            "payload" => Command::Payload,
            "waitForEOM" => Command::WaitForEom,
            "exit" => Command::Exit,
            _ => return None,
        };
        Some(command)
    }
}

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Blank line.
    Empty,
    /// Recognized command with its whitespace-separated arguments.
    Known { command: Command, args: Vec<String> },
    /// Unrecognized command name.
    Unknown(String),
}

/// Parse result.
#[derive(Debug)]
pub enum ParseResult {
    /// Successfully parsed request with bytes consumed.
    Complete(Request, usize),
    /// Need more data.
    Incomplete,
}

/// Parse one `\n`-terminated request line from the input buffer.
pub fn parse(input: &[u8]) -> ParseResult {
    let line_end = match input.iter().position(|&b| b == b'\n') {
        Some(pos) => pos,
        None => return ParseResult::Incomplete,
    };

    let line = String::from_utf8_lossy(&input[..line_end]);
    let mut parts = line.split_whitespace();
    let consumed = line_end + 1;

    let request = match parts.next() {
        None => Request::Empty,
        Some(name) => match Command::from_name(name) {
            Some(command) => Request::Known {
                command,
                args: parts.map(str::to_string).collect(),
            },
            None => Request::Unknown(name.to_string()),
        },
    };

    ParseResult::Complete(request, consumed)
}

/// Format a success response: `0 <data>\r\n`.
pub fn response_ok(data: &str) -> BytesMut {
    response(CODE_SUCCESS, data)
}

/// Format an error response: `<code> <message>\r\n`.
pub fn response_error(code: i32, message: &str) -> BytesMut {
    response(code, message)
}

fn response(code: i32, data: &str) -> BytesMut {
    let mut resp = BytesMut::with_capacity(data.len() + 8);
    resp.extend_from_slice(format!("{code} {data}\r\n").as_bytes());
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        match parse(b"nop\n") {
            ParseResult::Complete(
                Request::Known {
                    command: Command::NoOp,
                    args,
                },
                4,
            ) => assert!(args.is_empty()),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_args_and_crlf() {
        match parse(b"hp 1\r\nrest") {
            ParseResult::Complete(
                Request::Known {
                    command: Command::Power,
                    args,
                },
                6,
            ) => assert_eq!(args, vec!["1".to_string()]),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_line() {
        match parse(b"  \n") {
            ParseResult::Complete(Request::Empty, 3) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown() {
        match parse(b"dance now\n") {
            ParseResult::Complete(Request::Unknown(name), 10) => assert_eq!(name, "dance"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_incomplete() {
        match parse(b"selectRob") {
            ParseResult::Incomplete => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert_eq!(Command::from_name("waitForEOM"), Some(Command::WaitForEom));
        assert_eq!(Command::from_name("waitforeom"), None);
        assert_eq!(Command::from_name("locXYZ"), Some(Command::LocXyz));
    }

    #[test]
    fn test_responses() {
        assert_eq!(&response_ok("")[..], b"0 \r\n");
        assert_eq!(&response_ok("1")[..], b"0 1\r\n");
        assert_eq!(
            &response_error(CODE_POWER_NOT_ENABLED, "Robot power not enabled")[..],
            b"-1046 Robot power not enabled\r\n"
        );
    }
}
