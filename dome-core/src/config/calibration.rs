//! Calibration constants
//!
//! Geometry of one particular dome. Fetched from the controller at connect,
//! changed by explicit setters, kept across operations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::units::{degrees_to_steps_truncated, steps_to_degrees};

/// Steps per revolution written before a legacy calibration sweep
///
/// Large enough that the rotator cannot complete a revolution before it
/// reaches the home sensor twice.
pub const CALIBRATION_SENTINEL_STEPS: i32 = 1_000_000;

/// Dome geometry and reference positions
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConstants {
    /// Rotator steps per full revolution (0 until fetched)
    pub steps_per_rev: i32,
    /// Shutter travel in steps (0 when there is no shutter)
    pub shutter_steps: i32,
    /// Home sensor azimuth in degrees
    pub home_az: f64,
    /// Park azimuth in degrees. Host side only, never sent.
    pub park_az: f64,
    /// Goto dead zone in rotator steps
    pub dead_zone_steps: i32,
}

impl CalibrationConstants {
    /// Whether steps-per-revolution is known
    pub fn rotator_calibrated(&self) -> bool {
        self.steps_per_rev > 0
    }

    /// Whether the shutter travel is known
    pub fn shutter_range_known(&self) -> bool {
        self.shutter_steps > 0
    }

    /// Home azimuth as the controller stores it
    pub fn home_steps(&self) -> i32 {
        degrees_to_steps_truncated(self.home_az, self.steps_per_rev)
    }

    /// Set the home azimuth from a controller step count
    pub fn set_home_from_steps(&mut self, steps: i32) {
        self.home_az = steps_to_degrees(steps, self.steps_per_rev);
    }

    /// Whether `target` steps lies inside the dead zone around `current`
    pub fn in_dead_zone(&self, current: i32, target: i32) -> bool {
        let low = current.saturating_sub(self.dead_zone_steps);
        let high = current.saturating_add(self.dead_zone_steps);
        (low..=high).contains(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dome() -> CalibrationConstants {
        CalibrationConstants {
            steps_per_rev: 55080,
            shutter_steps: 46000,
            home_az: 90.0,
            park_az: 180.0,
            dead_zone_steps: 300,
        }
    }

    #[test]
    fn test_default_is_uncalibrated() {
        let constants = CalibrationConstants::default();
        assert!(!constants.rotator_calibrated());
        assert!(!constants.shutter_range_known());
        assert_eq!(constants.home_steps(), 0);
    }

    #[test]
    fn test_home_steps_round_trip() {
        let mut constants = dome();
        assert_eq!(constants.home_steps(), 13770);
        constants.set_home_from_steps(27540);
        assert_eq!(constants.home_az, 180.0);
    }

    #[test]
    fn test_dead_zone_band_is_inclusive() {
        let constants = dome();
        assert!(constants.in_dead_zone(1000, 1300));
        assert!(constants.in_dead_zone(1000, 700));
        assert!(!constants.in_dead_zone(1000, 1301));
        assert!(!constants.in_dead_zone(1000, 699));
    }

    #[test]
    fn test_zero_dead_zone_only_matches_exact_step() {
        let constants = CalibrationConstants {
            dead_zone_steps: 0,
            ..dome()
        };
        assert!(constants.in_dead_zone(500, 500));
        assert!(!constants.in_dead_zone(500, 501));
    }
}
