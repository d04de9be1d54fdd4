//! NexDome Hardware Abstraction Layer
//!
//! This crate defines the boundary traits the dome control core consumes.
//! The host application supplies the concrete serial port and clock; the
//! core never opens a device or reads the wall clock on its own.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Host adapter (planetarium plugin, CLI) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dome-driver (exchanger + controller)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dome-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`serial::SerialTx`], [`serial::SerialRx`], [`serial::SerialPort`] - Serial link
//! - [`clock::Clock`] - Monotonic millisecond time source
//!
//! Sleeping goes through [`embedded_hal::delay::DelayNs`] in the driver crate.
//!
//! [`embedded_hal::delay::DelayNs`]: https://docs.rs/embedded-hal/1.0/embedded_hal/delay/trait.DelayNs.html

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod serial;

// Re-export key traits at crate root for convenience
pub use clock::Clock;
pub use serial::{ErrorType, SerialConfig, SerialPort, SerialRx, SerialTx};
