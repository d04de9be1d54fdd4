//! Controller settings and EEPROM

use dome_core::log::{Level, LogSink};
use dome_core::units::{degrees_to_steps_truncated, normalize_degrees};
use dome_core::{dome_log, DomeError, DomeResult, FailureKind, ProtocolVariant};
use dome_hal::{Clock, SerialPort};
use dome_protocol::Command;
use embedded_hal::delay::DelayNs;

use super::{Dome, SCOPE};

impl<P, C, D, L> Dome<P, C, D, L>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
    L: LogSink,
{
    /// Rotator steps per revolution, as stored in the controller
    pub fn steps_per_rev(&mut self) -> DomeResult<i32, P::Error> {
        self.ensure_connected()?;
        let steps = self.query_int(Command::ReadStepsPerRev);
        let steps = self.or_cached(steps, self.state.constants.steps_per_rev)?;
        self.state.constants.steps_per_rev = steps;
        Ok(steps)
    }

    pub fn set_steps_per_rev(&mut self, steps: i32) -> DomeResult<(), P::Error> {
        self.exchange(Command::WriteStepsPerRev(steps))?;
        self.state.constants.steps_per_rev = steps;
        Ok(())
    }

    /// Shutter travel in steps, 0 without a shutter
    pub fn shutter_steps(&mut self) -> DomeResult<i32, P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(0);
        }
        let steps = self.query_int(Command::ReadShutterSteps);
        let steps = self.or_cached(steps, self.state.constants.shutter_steps)?;
        self.state.constants.shutter_steps = steps;
        Ok(steps)
    }

    pub fn set_shutter_steps(&mut self, steps: i32) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(());
        }
        self.exchange(Command::WriteShutterSteps(steps))?;
        self.state.constants.shutter_steps = steps;
        Ok(())
    }

    /// Home sensor azimuth
    ///
    /// Served from cache while moving.
    pub fn home_az(&mut self) -> DomeResult<f64, P::Error> {
        self.ensure_connected()?;
        if self.state.moving {
            return Ok(self.state.constants.home_az);
        }
        let steps = self.query_int(Command::ReadHomePosition);
        let cached = self.state.constants.home_steps();
        let steps = self.or_cached(steps, cached)?;
        self.state.constants.set_home_from_steps(steps);
        Ok(self.state.constants.home_az)
    }

    pub fn set_home_az(&mut self, azimuth: f64) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        let azimuth = normalize_degrees(azimuth);
        let steps = degrees_to_steps_truncated(azimuth, self.state.constants.steps_per_rev);
        self.exchange(Command::WriteHomePosition(steps))?;
        self.state.constants.home_az = azimuth;
        Ok(())
    }

    /// Park azimuth. Kept on the host only.
    pub fn park_az(&self) -> f64 {
        self.state.constants.park_az
    }

    pub fn set_park_az(&mut self, azimuth: f64) {
        let azimuth = normalize_degrees(azimuth);
        self.state.constants.park_az = azimuth;
        self.config.park_az = azimuth;
    }

    /// Goto dead zone in steps (V3 firmware only)
    pub fn dead_zone(&mut self) -> DomeResult<i32, P::Error> {
        self.ensure_dead_zone()?;
        let steps = self.query_int(Command::ReadDeadZone);
        let steps = self.or_cached(steps, self.state.constants.dead_zone_steps)?;
        self.state.constants.dead_zone_steps = steps;
        Ok(steps)
    }

    pub fn set_dead_zone(&mut self, steps: i32) -> DomeResult<(), P::Error> {
        self.ensure_dead_zone()?;
        self.exchange(Command::WriteDeadZone(steps))?;
        self.state.constants.dead_zone_steps = steps;
        Ok(())
    }

    fn ensure_dead_zone(&self) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if self.variant.has_dead_zone() {
            Ok(())
        } else {
            Err(DomeError::CommandFailed(FailureKind::Unsupported))
        }
    }

    pub fn rotator_speed(&mut self) -> DomeResult<i32, P::Error> {
        self.query_int(Command::ReadRotatorSpeed)
    }

    pub fn set_rotator_speed(&mut self, speed: i32) -> DomeResult<(), P::Error> {
        self.exchange(Command::WriteRotatorSpeed(speed)).map(|_| ())
    }

    pub fn rotator_acceleration(&mut self) -> DomeResult<i32, P::Error> {
        self.query_int(Command::ReadRotatorAcceleration)
    }

    pub fn set_rotator_acceleration(&mut self, accel: i32) -> DomeResult<(), P::Error> {
        self.exchange(Command::WriteRotatorAcceleration(accel)).map(|_| ())
    }

    /// Shutter speed, 0 without a shutter
    pub fn shutter_speed(&mut self) -> DomeResult<i32, P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(0);
        }
        self.query_int(Command::ReadShutterSpeed)
    }

    pub fn set_shutter_speed(&mut self, speed: i32) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(());
        }
        self.exchange(Command::WriteShutterSpeed(speed)).map(|_| ())
    }

    /// Shutter acceleration, 0 without a shutter
    pub fn shutter_acceleration(&mut self) -> DomeResult<i32, P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(0);
        }
        self.query_int(Command::ReadShutterAcceleration)
    }

    pub fn set_shutter_acceleration(&mut self, accel: i32) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(());
        }
        self.exchange(Command::WriteShutterAcceleration(accel)).map(|_| ())
    }

    pub fn set_home_on_park(&mut self, enabled: bool) {
        self.config.home_on_park = enabled;
    }

    pub fn set_home_on_unpark(&mut self, enabled: bool) {
        self.config.home_on_unpark = enabled;
    }

    /// Persist the current settings on both boards
    ///
    /// Each board needs a moment to finish writing before it answers again.
    pub fn save_to_eeprom(&mut self) -> DomeResult<(), P::Error> {
        let settle = self.timing().eeprom_settle_ms;
        self.exchange(Command::SaveRotatorEeprom)?;
        self.link.sleep_ms(settle);
        if self.config.shutter_present {
            self.exchange(Command::SaveShutterEeprom)?;
            self.link.sleep_ms(settle);
        }
        dome_log!(self.link.log, Level::Info, SCOPE, "settings saved");
        Ok(())
    }

    /// Reload settings from EEPROM
    pub fn load_from_eeprom(&mut self) -> DomeResult<(), P::Error> {
        self.exchange(Command::LoadRotatorEeprom)?;
        if self.config.shutter_present {
            self.exchange(Command::LoadShutterEeprom)?;
        }
        Ok(())
    }

    /// Reset both boards to factory defaults
    pub fn restore_defaults(&mut self) -> DomeResult<(), P::Error> {
        self.exchange(Command::ResetRotatorEeprom)?;
        if self.config.shutter_present {
            self.exchange(Command::ResetShutterEeprom)?;
        }
        dome_log!(self.link.log, Level::Info, SCOPE, "factory defaults restored");
        Ok(())
    }
}
