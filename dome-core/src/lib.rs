//! Board-agnostic core logic for the dome controller
//!
//! This crate contains everything that does not touch the serial link:
//!
//! - Step/degree unit conversion with azimuth wraparound
//! - Calibration constants and driver configuration
//! - Firmware generation capabilities (legacy vs. V3)
//! - Dome state: rotator, shutter, pending operation, async telemetry
//! - Error taxonomy and the injected logging sink

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod log;
pub mod state;
pub mod units;
pub mod variant;

pub use config::{CalibrationConstants, DomeConfig, ExchangeTiming};
pub use error::{DomeError, DomeResult, FailureKind};
pub use log::{Level, LogSink, NullLog};
pub use state::{AsyncTelemetry, DomeState, OperationState, ShutterState};
pub use variant::{LegacyFirmware, ProtocolVariant, V3Firmware, VariantKind};
