//! Dome state
//!
//! One owned [`DomeState`] per dome. Every operation reads and mutates it
//! explicitly; nothing is shared or global.

pub mod dome;
pub mod operation;
pub mod shutter;
pub mod telemetry;

pub use dome::DomeState;
pub use operation::{judge_arrival, Arrival, OperationState};
pub use shutter::{ShutterMotion, ShutterState};
pub use telemetry::AsyncTelemetry;
