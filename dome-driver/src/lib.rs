//! NexDome driver
//!
//! Ties the serial link to the dome state machine:
//!
//! - [`exchange::Exchanger`] sends one command and waits for its reply,
//!   applying any telemetry that arrives in between
//! - [`dome::Dome`] is the host-facing controller: connect, goto, home,
//!   park, shutter, calibration, settings
//!
//! All calls block, for at most the configured read timeouts. Long moves
//! are never awaited inline: start them, then poll the matching
//! `is_*_complete` from the host's timer.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod dome;
pub mod exchange;

#[cfg(test)]
mod mock;

pub use dome::Dome;
pub use exchange::{Exchanger, LinkError};
