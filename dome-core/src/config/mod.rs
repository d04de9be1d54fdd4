//! Configuration types
//!
//! Board-agnostic configuration structures, optionally stored as postcard
//! binary data by the host.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
