//! TCS protocol frame handler.

use bytes::{Buf, BytesMut};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::parser::{
    parse, response_error, response_ok, Command, ParseResult, Request, CODE_ERROR,
    CODE_POWER_NOT_ENABLED,
};
use super::state::RobotState;
use crate::protocols::Reply;

/// Longest partial line kept while waiting for its `\n`.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Stateful TCS emulator for one session.
#[derive(Debug)]
pub struct TcsHandler {
    state: RobotState,
    pending: BytesMut,
    eom_delay: Duration,
}

impl TcsHandler {
    pub fn new(eom_delay: Duration) -> Self {
        Self {
            state: RobotState::default(),
            pending: BytesMut::with_capacity(1024),
            eom_delay,
        }
    }

    /// Feed one frame; every complete line in the buffer gets a response.
    ///
    /// Responses for all lines are concatenated into one reply. A bare `exit`
    /// line closes the session and discards anything after it; `exit` with
    /// arguments is answered but keeps the session open.
    pub fn process(&mut self, frame: &[u8]) -> Reply {
        self.pending.extend_from_slice(frame);
        let mut reply = Reply::default();

        while let ParseResult::Complete(request, consumed) = parse(&self.pending) {
            self.pending.advance(consumed);
            debug!(?request, "Processing command");

            let response = self.execute(&request, &mut reply);
            reply.push(&response);

            // Only a bare `exit` line ends the session
            if matches!(
                &request,
                Request::Known {
                    command: Command::Exit,
                    args,
                } if args.is_empty()
            ) {
                reply.close = true;
                self.pending.clear();
                break;
            }
        }

        if self.pending.len() > MAX_LINE_LENGTH {
            warn!(len = self.pending.len(), "Discarding oversized line");
            self.pending.clear();
            reply.push(&response_error(CODE_ERROR, "Line too long"));
        }

        reply
    }

    fn execute(&mut self, request: &Request, reply: &mut Reply) -> BytesMut {
        let (command, args) = match request {
            Request::Empty => return response_ok("Invalid command"),
            Request::Unknown(name) => {
                return response_error(CODE_ERROR, &format!("Unknown command: {name}"))
            }
            Request::Known { command, args } => (*command, args),
        };
        let arg = args.first().map(String::as_str);
        let state = &mut self.state;

        match command {
            Command::NoOp | Command::Halt | Command::Exit => response_ok(""),

            Command::Mode => match arg {
                Some(_) => response_ok(""),
                None => response_ok("0"),
            },

            Command::Power => match arg {
                Some(value) => {
                    state.power = value == "1";
                    response_ok("")
                }
                None => response_ok(flag(state.power)),
            },

            Command::SelectRobot => match arg {
                Some("1") => {
                    state.selected_robot = Some(1);
                    response_ok("")
                }
                Some(_) => response_error(CODE_ERROR, "Invalid robot index"),
                None => match state.selected_robot {
                    Some(idx) => response_ok(&idx.to_string()),
                    None => response_error(CODE_ERROR, "No robot selected"),
                },
            },

            Command::Attach => match arg {
                Some(value) => {
                    state.attached = value != "0";
                    response_ok("")
                }
                None => response_ok(flag(state.attached)),
            },

            Command::Home => {
                if !state.power {
                    return power_not_enabled();
                }
                state.homed = true;
                response_ok("")
            }

            Command::Loc => response_ok("1 300.0 0.0 150.0 0.0 90.0 -180.0"),

            Command::LocXyz => require_args(args, 7),
            Command::Profile => require_args(args, 9),

            Command::Move | Command::MoveJoints | Command::Payload => {
                if !state.power {
                    return power_not_enabled();
                }
                response_ok("")
            }

            Command::MoveCart => {
                if !state.power {
                    return power_not_enabled();
                }
                require_args(args, 6)
            }

            Command::MoveOneAxis => {
                if !state.power {
                    return power_not_enabled();
                }
                require_args(args, 3)
            }

            Command::MoveRail => {
                if state.rail_position.is_none() {
                    return response_error(CODE_ERROR, "No rail available");
                }
                if !state.power {
                    return power_not_enabled();
                }
                response_ok("")
            }

            Command::MotionState => response_ok(state.motion_state),

            Command::GetParam => match arg {
                None => insufficient(),
                // Homing status
                Some("2800") => response_ok(flag(state.homed)),
                // Axis configuration mask: 6 axes plus rail, or 4 without
                Some("2003") => match state.rail_position {
                    Some(_) => response_ok("111"),
                    None => response_ok("15"),
                },
                // Last error
                Some("320") => response_ok("0"),
                Some(_) => response_error(CODE_ERROR, "Unknown parameter"),
            },

            Command::WhereJoints => response_ok(&join(&state.joint_positions)),

            Command::WhereCart => response_ok(&join(&state.position_at(Instant::now()))),

            Command::FreeMode => match arg {
                Some(value) => {
                    state.set_free_mode(value != "-1", Instant::now());
                    debug!(enabled = state.free_mode(), "Free mode");
                    response_ok("")
                }
                None => insufficient(),
            },

            Command::SystemSpeed => match arg {
                Some(value) => {
                    if let Ok(speed) = value.parse::<i32>() {
                        state.system_speed = speed;
                    }
                    response_ok("")
                }
                None => response_ok(&state.system_speed.to_string()),
            },

            Command::WaitForEom => {
                reply.delay = Some(reply.delay.unwrap_or_default() + self.eom_delay);
                response_ok("")
            }
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn join(values: &[f64; 6]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn require_args(args: &[String], count: usize) -> BytesMut {
    if args.len() < count {
        insufficient()
    } else {
        response_ok("")
    }
}

fn insufficient() -> BytesMut {
    response_error(CODE_ERROR, "Insufficient parameters")
}

fn power_not_enabled() -> BytesMut {
    response_error(CODE_POWER_NOT_ENABLED, "Robot power not enabled")
}
