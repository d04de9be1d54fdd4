//! NexDome Controller Protocol
//!
//! This crate defines the ASCII protocol between the host and the NexDome
//! rotator controller (which relays to the shutter controller over an XBee
//! radio link).
//!
//! # Protocol Overview
//!
//! Commands are `@`-prefixed, optionally carry one integer argument and are
//! terminated by CR LF:
//! ```text
//! @GAR,180\r\n
//! ```
//!
//! Responses are `\n`-terminated lines. Trailing `#`, CR, LF and spaces are
//! noise and get trimmed before anything looks at the line:
//! ```text
//! :SES,-125,46000,0,1#\r\n
//! ```
//!
//! The controller interleaves replies with unsolicited telemetry (position
//! pushes while moving, battery voltage, rain sensor, radio link status).
//! [`Response::classify`] tells the two apart.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod events;
pub mod fields;
pub mod frame;
pub mod messages;
pub mod response;

pub use events::{MotionEcho, RainState, Telemetry};
pub use fields::{FirmwareVersion, ParseError, ShutterReport, StatusReport};
pub use frame::{trim_line, FrameError, Line, LineReader, LINE_CAPACITY};
pub use messages::{Command, CommandBuffer};
pub use response::Response;
