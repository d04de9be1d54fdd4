//! Pending operation and completion policy

use crate::units::within_tolerance;

/// The high-level operation currently in progress
///
/// At most one is active. The host starts one, then polls the matching
/// completion check until it reports done or fails.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationState {
    #[default]
    None,
    /// Rotating to the azimuth (degrees)
    GotoAzimuth(f64),
    /// Looking for the home sensor
    Homing,
    /// Going to the park azimuth, possibly via home
    Parking,
    /// Leaving park, possibly via home
    Unparking,
    Opening,
    Closing,
    /// Legacy steps-per-revolution sweep
    Calibrating,
}

impl OperationState {
    /// Whether nothing is pending
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether the operation moves the rotator
    pub fn moves_rotator(&self) -> bool {
        matches!(
            self,
            Self::GotoAzimuth(_) | Self::Homing | Self::Parking | Self::Unparking | Self::Calibrating
        )
    }
}

/// Verdict on a stopped move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arrival {
    /// Close enough to the target
    Arrived,
    /// Missed, re-issue the move
    Retry,
    /// Missed and out of retries
    Failed,
}

/// Decide what to do once the rotator stopped at `actual`
pub fn judge_arrival(
    actual: f64,
    target: f64,
    tolerance: f64,
    retries_used: u8,
    retries_allowed: u8,
) -> Arrival {
    if within_tolerance(actual, target, tolerance) {
        Arrival::Arrived
    } else if retries_used < retries_allowed {
        Arrival::Retry
    } else {
        Arrival::Failed
    }
}
