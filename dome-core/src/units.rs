//! Step and degree conversion
//!
//! The rotator position is a signed step count; one revolution is
//! `steps_per_rev` steps. Azimuths are always normalized into `[0, 360)`.
//!
//! `core` has no float rounding, so rounding and truncation are done here
//! by integer casts. Casts saturate, which is fine for any physical dome.

/// Degrees in one full revolution
pub const FULL_TURN: f64 = 360.0;

/// Truncate toward zero
pub fn trunc(value: f64) -> f64 {
    value as i64 as f64
}

/// Round half away from zero
pub fn round(value: f64) -> f64 {
    if value >= 0.0 {
        trunc(value + 0.5)
    } else {
        trunc(value - 0.5)
    }
}

/// Absolute value
pub fn abs(value: f64) -> f64 {
    if value < 0.0 {
        -value
    } else {
        value
    }
}

/// Wrap an angle into `[0, 360)`
///
/// Non-finite input maps to 0.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let mut wrapped = degrees % FULL_TURN;
    if wrapped < 0.0 {
        wrapped += FULL_TURN;
    }
    // A tiny negative remainder plus 360 can land exactly on 360.
    if wrapped >= FULL_TURN {
        wrapped -= FULL_TURN;
    }
    wrapped
}

/// Step count to normalized azimuth
///
/// Returns 0 when `steps_per_rev` is 0 (rotator not calibrated yet).
pub fn steps_to_degrees(steps: i32, steps_per_rev: i32) -> f64 {
    if steps_per_rev == 0 {
        return 0.0;
    }
    normalize_degrees(f64::from(steps) / f64::from(steps_per_rev) * FULL_TURN)
}

/// Azimuth to the nearest step count
pub fn degrees_to_steps(degrees: f64, steps_per_rev: i32) -> i32 {
    round(degrees / FULL_TURN * f64::from(steps_per_rev)) as i32
}

/// Azimuth to a step count, truncating toward zero
///
/// The controller firmware computes step targets this way for sync, home
/// position and dead-zone checks, so the host must match it.
pub fn degrees_to_steps_truncated(degrees: f64, steps_per_rev: i32) -> i32 {
    (degrees / FULL_TURN * f64::from(steps_per_rev)) as i32
}

/// Azimuth rounded to whole degrees, as sent with a goto
pub fn whole_degrees(degrees: f64) -> i32 {
    round(degrees) as i32
}

/// Shortest angular distance between two azimuths, in `[0, 180]`
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = normalize_degrees(a - b);
    if diff > FULL_TURN / 2.0 {
        FULL_TURN - diff
    } else {
        diff
    }
}

/// Whether `actual` lies within `tolerance` degrees of `target`, across 0/360
pub fn within_tolerance(actual: f64, target: f64, tolerance: f64) -> bool {
    angular_distance(actual, target) <= tolerance
}
