//! Unsolicited telemetry pushed by the controller
//!
//! These lines arrive interleaved with command replies. They carry raw
//! controller values; unit conversion happens in the core crate where the
//! calibration constants live.

/// Rain sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RainState {
    /// No rain event seen since connect
    #[default]
    Unknown,
    /// `:Rain`
    Raining,
    /// `:RainStopped`
    NotRaining,
}

/// Motion direction echoed by the controller when a move starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionEcho {
    /// Rotator turning counter-clockwise
    Left,
    /// Rotator turning clockwise
    Right,
    /// Shutter opening
    Open,
    /// Shutter closing
    Close,
}

impl MotionEcho {
    /// Whether the echo concerns the shutter rather than the rotator
    pub fn is_shutter(&self) -> bool {
        matches!(self, Self::Open | Self::Close)
    }
}

/// One piece of unsolicited telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Telemetry {
    /// `P<steps>`: rotator step position while moving
    RotatorSteps(i32),
    /// `S<steps>`: shutter step position while moving
    ShutterSteps(i32),
    /// `:BV<raw>`: shutter battery ADC reading
    BatteryRaw(i32),
    /// `:Rain` / `:RainStopped`
    Rain(RainState),
    /// `X...`: radio link report, `true` when the line says `Online`
    ShutterLink(bool),
    /// `:left`, `:right`, `:open`, `:close`
    Motion(MotionEcho),
}

impl Telemetry {
    /// Whether this telemetry reports progress of a running move
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Self::RotatorSteps(_) | Self::ShutterSteps(_) | Self::Motion(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rain_defaults_to_unknown() {
        assert_eq!(RainState::default(), RainState::Unknown);
    }

    #[test]
    fn test_motion_echo_side() {
        assert!(MotionEcho::Open.is_shutter());
        assert!(MotionEcho::Close.is_shutter());
        assert!(!MotionEcho::Left.is_shutter());
        assert!(!MotionEcho::Right.is_shutter());
    }

    #[test]
    fn test_telemetry_motion_kinds() {
        assert!(Telemetry::RotatorSteps(10).is_motion());
        assert!(Telemetry::Motion(MotionEcho::Left).is_motion());
        assert!(!Telemetry::BatteryRaw(341).is_motion());
        assert!(!Telemetry::Rain(RainState::Raining).is_motion());
    }
}
