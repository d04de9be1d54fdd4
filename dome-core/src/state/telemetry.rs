//! Asynchronous telemetry
//!
//! Written only from unsolicited controller lines. Values go stale but are
//! never cleared by a move: they are the last thing the sensors said.

use dome_protocol::{MotionEcho, RainState};

/// Battery voltage divider ratio on the shutter board
pub const BATTERY_DIVIDER: f64 = 3.0;
/// Volts per count of the 10-bit ADC on a 5 V reference
pub const ADC_VOLTS_PER_COUNT: f64 = 5.0 / 1023.0;

/// Last known sensor values
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AsyncTelemetry {
    /// Shutter battery voltage, negative until the first reading
    pub volts: f64,
    pub rain: RainState,
    /// Whether the XBee link to the shutter board reported `Online`
    pub shutter_link: bool,
    /// Last shutter step push
    pub shutter_steps: Option<i32>,
    /// Last motion direction echo
    pub last_motion: Option<MotionEcho>,
}

impl Default for AsyncTelemetry {
    fn default() -> Self {
        Self {
            volts: -1.0,
            rain: RainState::Unknown,
            shutter_link: false,
            shutter_steps: None,
            last_motion: None,
        }
    }
}

impl AsyncTelemetry {
    /// Record a raw battery ADC reading
    pub fn set_battery_raw(&mut self, raw: i32) {
        self.volts = f64::from(raw) * BATTERY_DIVIDER * ADC_VOLTS_PER_COUNT;
    }

    /// Whether a battery reading has arrived since connect
    pub fn has_volts(&self) -> bool {
        self.volts >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_scaling() {
        let mut telemetry = AsyncTelemetry::default();
        assert!(!telemetry.has_volts());
        telemetry.set_battery_raw(341);
        assert_eq!(telemetry.volts, 341.0 * 3.0 * (5.0 / 1023.0));
        assert!(telemetry.has_volts());
    }
}
