//! Response classification
//!
//! Every trimmed line is either the reply the in-flight command waits for,
//! or telemetry to be applied on the side. Classification is decided by the
//! leading character, and within a leading character by substring or by
//! the second character. The order of those checks is load-bearing: the
//! firmware generations reuse leading characters for unrelated lines.

use crate::events::{MotionEcho, RainState, Telemetry};
use crate::fields::parse_leading_int;
use crate::frame::trim_line;

/// Classified response line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response<'a> {
    /// Satisfies the in-flight command, carrying the reply payload
    Reply(&'a str),
    /// Unsolicited telemetry, never a command result
    Telemetry(Telemetry),
    /// `o`: a motor stopped. Informational only.
    MotorStopped,
    /// Recognized leading character but nothing actionable
    Ignored,
}

impl<'a> Response<'a> {
    /// Classify one response line
    ///
    /// The line is trimmed first, so raw lines straight from the link are
    /// accepted.
    pub fn classify(line: &'a str) -> Self {
        let line = trim_line(line);
        let bytes = line.as_bytes();

        let Some(&lead) = bytes.first() else {
            return Self::Ignored;
        };
        let second = bytes.get(1).copied();

        match lead {
            b'C' => {
                if line.contains("CLS") {
                    Self::Reply(line)
                } else {
                    Self::Ignored
                }
            }
            b'O' => {
                if line.contains("OPS") {
                    Self::Reply(line)
                } else {
                    Self::Ignored
                }
            }
            b'P' => {
                if line.contains("PR") || line.contains("PW") {
                    Self::Reply(line)
                } else {
                    match second {
                        Some(c) if is_number_start(c) => Self::Telemetry(Telemetry::RotatorSteps(
                            parse_leading_int(tail(line, 1)).unwrap_or(0),
                        )),
                        // Rotator status relayed as `P:SER,...`
                        Some(b':') => Self::Reply(tail(line, 2)),
                        _ => Self::Ignored,
                    }
                }
            }
            b'S' => {
                if line.contains("SES") {
                    Self::Reply(line)
                } else {
                    match second {
                        Some(c) if is_number_start(c) => Self::Telemetry(Telemetry::ShutterSteps(
                            parse_leading_int(tail(line, 1)).unwrap_or(0),
                        )),
                        _ => Self::Ignored,
                    }
                }
            }
            b'X' => Self::Telemetry(Telemetry::ShutterLink(line.contains("Online"))),
            b':' => Self::classify_event(line),
            b'o' => Self::MotorStopped,
            _ => Self::Reply(line),
        }
    }

    /// `:`-prefixed lines: events first, anything else is a tagged reply
    fn classify_event(line: &'a str) -> Self {
        if line.contains(":BV") {
            let raw = parse_leading_int(tail(line, 3)).unwrap_or(0);
            return Self::Telemetry(Telemetry::BatteryRaw(raw));
        }
        // `:RainStopped` also contains `:Rain`, so it must be tested first.
        if line.contains(":RainStopped") {
            return Self::Telemetry(Telemetry::Rain(RainState::NotRaining));
        }
        if line.contains(":Rain") {
            return Self::Telemetry(Telemetry::Rain(RainState::Raining));
        }

        let echo = if line.contains(":left") {
            Some(MotionEcho::Left)
        } else if line.contains(":right") {
            Some(MotionEcho::Right)
        } else if line.contains(":open") {
            Some(MotionEcho::Open)
        } else if line.contains(":close") {
            Some(MotionEcho::Close)
        } else {
            None
        };

        match echo {
            Some(echo) => Self::Telemetry(Telemetry::Motion(echo)),
            None => Self::Reply(tail(line, 1)),
        }
    }

    /// The reply payload, if this line satisfies a command
    pub fn reply(&self) -> Option<&'a str> {
        match self {
            Self::Reply(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether this is the reply carrying `tag`
    ///
    /// Tags are matched anywhere in the payload, the way the firmware's
    /// own tooling does.
    pub fn is_reply_to(&self, tag: &str) -> bool {
        self.reply().is_some_and(|payload| payload.contains(tag))
    }
}

fn is_number_start(c: u8) -> bool {
    c.is_ascii_digit() || c == b'-'
}

/// `line[from..]`, or empty when `from` is out of range or splits a char
fn tail(line: &str, from: usize) -> &str {
    line.get(from..).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_shutter_acks_are_replies() {
        assert_eq!(Response::classify("CLS#"), Response::Reply("CLS"));
        assert_eq!(Response::classify("OPS#\r"), Response::Reply("OPS"));
    }

    #[test]
    fn test_untagged_c_and_o_lines_are_ignored() {
        assert_eq!(Response::classify("Calibrating"), Response::Ignored);
        assert_eq!(Response::classify("Opening"), Response::Ignored);
    }

    #[test]
    fn test_rotator_reply_beats_position_push() {
        assert_eq!(Response::classify("PRR12345#"), Response::Reply("PRR12345"));
        assert_eq!(Response::classify("PWR#"), Response::Reply("PWR"));
    }

    #[test]
    fn test_rotator_position_push() {
        assert_eq!(
            Response::classify("P12345"),
            Response::Telemetry(Telemetry::RotatorSteps(12345))
        );
        assert_eq!(
            Response::classify("P-200#"),
            Response::Telemetry(Telemetry::RotatorSteps(-200))
        );
    }

    #[test]
    fn test_rotator_status_relay() {
        assert_eq!(
            Response::classify("P:SER,100,1,55080,0,300#"),
            Response::Reply("SER,100,1,55080,0,300")
        );
    }

    #[test]
    fn test_bare_p_is_ignored() {
        assert_eq!(Response::classify("P"), Response::Ignored);
        assert_eq!(Response::classify("Pxyz"), Response::Ignored);
    }

    #[test]
    fn test_shutter_state_reply_and_push() {
        assert_eq!(
            Response::classify("SES,-125,46000,0,1#"),
            Response::Reply("SES,-125,46000,0,1")
        );
        assert_eq!(
            Response::classify("S4600"),
            Response::Telemetry(Telemetry::ShutterSteps(4600))
        );
        assert_eq!(Response::classify("Shutter"), Response::Ignored);
    }

    #[test]
    fn test_xbee_link_status() {
        assert_eq!(
            Response::classify("XB->Online"),
            Response::Telemetry(Telemetry::ShutterLink(true))
        );
        assert_eq!(
            Response::classify("XB->WaitAT"),
            Response::Telemetry(Telemetry::ShutterLink(false))
        );
    }

    #[test]
    fn test_battery_voltage_event() {
        assert_eq!(
            Response::classify(":BV341#"),
            Response::Telemetry(Telemetry::BatteryRaw(341))
        );
    }

    #[test]
    fn test_rain_events() {
        assert_eq!(
            Response::classify(":Rain#"),
            Response::Telemetry(Telemetry::Rain(RainState::Raining))
        );
        assert_eq!(
            Response::classify(":RainStopped#"),
            Response::Telemetry(Telemetry::Rain(RainState::NotRaining))
        );
    }

    #[test]
    fn test_direction_echoes_are_consumed() {
        assert_eq!(
            Response::classify(":left#"),
            Response::Telemetry(Telemetry::Motion(MotionEcho::Left))
        );
        assert_eq!(
            Response::classify(":right#"),
            Response::Telemetry(Telemetry::Motion(MotionEcho::Right))
        );
        assert_eq!(
            Response::classify(":open#"),
            Response::Telemetry(Telemetry::Motion(MotionEcho::Open))
        );
        assert_eq!(
            Response::classify(":close#"),
            Response::Telemetry(Telemetry::Motion(MotionEcho::Close))
        );
    }

    #[test]
    fn test_colon_fallback_is_tagged_reply() {
        assert_eq!(
            Response::classify(":SES,-125,46000,1,0#"),
            Response::Reply("SES,-125,46000,1,0")
        );
        assert_eq!(Response::classify(":SER,0,0,99498,0,300#"), Response::Reply("SER,0,0,99498,0,300"));
    }

    #[test]
    fn test_motor_stopped_notice() {
        assert_eq!(Response::classify("o"), Response::MotorStopped);
    }

    #[test]
    fn test_untagged_lines_are_replies() {
        assert_eq!(Response::classify("FR3.1.0#"), Response::Reply("FR3.1.0"));
        assert_eq!(Response::classify("RRR55080"), Response::Reply("RRR55080"));
    }

    #[test]
    fn test_empty_line_is_ignored() {
        assert_eq!(Response::classify("#\r\n"), Response::Ignored);
    }

    #[test]
    fn test_reply_tag_match() {
        let response = Response::classify(":SER,0,1,55080,0,300#");
        assert!(response.is_reply_to("SER"));
        assert!(!response.is_reply_to("SES"));
        assert!(!Response::classify("P100").is_reply_to("P"));
    }

    proptest! {
        #[test]
        fn test_classify_never_panics(line in "\\PC{0,64}") {
            let _ = Response::classify(&line);
        }

        #[test]
        fn test_position_push_parses_any_step(steps in any::<i32>()) {
            let mut text = heapless::String::<16>::new();
            core::fmt::Write::write_fmt(&mut text, format_args!("P{}", steps)).unwrap();
            prop_assert_eq!(
                Response::classify(&text),
                Response::Telemetry(Telemetry::RotatorSteps(steps))
            );
        }
    }
}
