//! Rotator operations: goto, home, park, unpark, sync, abort, calibrate

use dome_core::config::{CALIBRATION_SENTINEL_STEPS, ARRIVAL_TOLERANCE_DEG};
use dome_core::log::{Level, LogSink};
use dome_core::state::{judge_arrival, Arrival, OperationState};
use dome_core::units::{degrees_to_steps_truncated, normalize_degrees, whole_degrees, within_tolerance};
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
    /// Steps per revolution, fetched on first use
    fn ensure_steps_per_rev(&mut self) -> DomeResult<i32, P::Error> {
        if !self.state.constants.rotator_calibrated() {
            self.state.constants.steps_per_rev = self.query_int(Command::ReadStepsPerRev)?;
        }
        Ok(self.state.constants.steps_per_rev)
    }

    /// Rotate to `azimuth` degrees
    ///
    /// A target equal to the current azimuth (to the degree) completes at
    /// once without a command. A target inside the dead zone completes at
    /// once too, but the command is still sent so the controller's counters
    /// follow. Calling again while moving re-targets.
    pub fn goto_azimuth(&mut self, azimuth: f64) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        let target = normalize_degrees(azimuth);
        self.state.begin(OperationState::GotoAzimuth(target));
        if self.start_goto(target)? {
            self.state.finish();
        }
        Ok(())
    }

    /// Goto without touching the pending operation
    ///
    /// Returns true when the move is already satisfied and nothing will
    /// report motion.
    fn start_goto(&mut self, target: f64) -> DomeResult<bool, P::Error> {
        let steps_per_rev = self.ensure_steps_per_rev()?;
        self.state.goto_target = target;

        let whole = whole_degrees(target).rem_euclid(360);
        if whole == whole_degrees(self.state.azimuth).rem_euclid(360) {
            dome_log!(self.link.log, Level::Debug, SCOPE, "goto {}: already there", target);
            self.state.moving = false;
            return Ok(true);
        }

        let command = Command::GotoAzimuth(whole);
        let target_steps = degrees_to_steps_truncated(target, steps_per_rev);
        if self.variant.has_dead_zone()
            && self
                .state
                .constants
                .in_dead_zone(self.state.rotator_steps, target_steps)
        {
            dome_log!(
                self.link.log,
                Level::Info,
                SCOPE,
                "goto {}: inside dead zone of {} steps",
                target,
                self.state.constants.dead_zone_steps
            );
            self.state.moving = false;
            self.exchange(command)?;
            return Ok(true);
        }

        self.exchange(command)?;
        self.state.moving = true;
        Ok(false)
    }

    /// Poll a goto
    ///
    /// Pending while the hardware moves. Once stopped, the azimuth must be
    /// within 3° of the target. The legacy firmware re-issues a missed goto
    /// once; V3 fails at once.
    pub fn is_goto_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.ensure_connected()?;
        if self.poll_moving()? {
            return Ok(false);
        }
        if !matches!(self.state.operation, OperationState::GotoAzimuth(_)) {
            return Ok(true);
        }

        let actual = self.current_azimuth()?;
        let target = self.state.goto_target;
        match judge_arrival(
            actual,
            target,
            ARRIVAL_TOLERANCE_DEG,
            self.state.retries_used,
            self.variant.goto_retries(),
        ) {
            Arrival::Arrived => {
                self.state.finish();
                Ok(true)
            }
            Arrival::Retry => {
                self.state.retries_used += 1;
                dome_log!(
                    self.link.log,
                    Level::Info,
                    SCOPE,
                    "goto stopped at {} for {}, retrying",
                    actual,
                    target
                );
                let settled = self.start_goto(target)?;
                if settled {
                    self.state.finish();
                }
                Ok(settled)
            }
            Arrival::Failed => {
                dome_log!(
                    self.link.log,
                    Level::Warn,
                    SCOPE,
                    "goto stopped at {} for {}",
                    actual,
                    target
                );
                self.state.finish();
                Err(DomeError::CommandFailed(FailureKind::MissedTarget))
            }
        }
    }

    /// Find the home sensor
    ///
    /// No-op while moving. Already on the sensor: sync to the home azimuth
    /// and report homed without moving.
    pub fn go_home(&mut self) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if self.state.moving {
            return Ok(());
        }
        self.state.begin(OperationState::Homing);
        self.start_home()
    }

    fn start_home(&mut self) -> DomeResult<(), P::Error> {
        if self.state.moving {
            return Ok(());
        }
        if self.at_home()? {
            self.state.homed = true;
            let home = self.state.constants.home_az;
            let elevation = self.state.elevation;
            return self.sync(home, elevation);
        }
        self.exchange(Command::FindHome)?;
        self.state.homed = false;
        self.state.moving = true;
        Ok(())
    }

    /// Poll a home search
    ///
    /// Once stopped the home sensor must be active. The legacy firmware
    /// overshoots the sensor now and then, so it gets one more search.
    pub fn is_find_home_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.ensure_connected()?;
        if self.poll_moving()? {
            self.state.homed = false;
            return Ok(false);
        }

        if self.at_home()? {
            self.state.homed = true;
            if self.state.unparking {
                self.state.parked = false;
            }
            if self.state.operation == OperationState::Homing {
                self.state.finish();
            }
            return Ok(true);
        }

        self.state.homed = false;
        if self.state.retries_used < self.variant.home_retries() {
            self.state.retries_used += 1;
            dome_log!(self.link.log, Level::Info, SCOPE, "home not found, searching again");
            self.exchange(Command::FindHome)?;
            self.state.moving = true;
            return Ok(false);
        }

        dome_log!(self.link.log, Level::Warn, SCOPE, "stopped away from home sensor");
        self.state.finish();
        Err(DomeError::CommandFailed(FailureKind::HomeNotFound))
    }

    /// Move to the park azimuth, via home when configured
    pub fn park(&mut self) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        self.state.begin(OperationState::Parking);
        if self.config.home_on_park {
            self.state.parking = true;
            self.start_home()
        } else {
            let park = self.state.constants.park_az;
            self.start_goto(park).map(|_| ())
        }
    }

    /// Poll a park
    ///
    /// When parking via home, the home phase finishes first and then starts
    /// the move to the park azimuth.
    pub fn is_park_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.ensure_connected()?;
        if self.poll_moving()? {
            return Ok(false);
        }
        if self.state.parked && self.state.operation != OperationState::Parking {
            return Ok(true);
        }

        if self.state.parking {
            let homed = self.is_find_home_complete().map_err(|err| {
                self.state.parking = false;
                err
            })?;
            if homed {
                self.state.parking = false;
                let park = self.state.constants.park_az;
                self.start_goto(park)?;
                self.state.begin(OperationState::Parking);
            }
            return Ok(false);
        }

        let actual = self.current_azimuth()?;
        let park = self.state.constants.park_az;
        if within_tolerance(actual, park, ARRIVAL_TOLERANCE_DEG) {
            self.state.parked = true;
            self.state.finish();
            Ok(true)
        } else {
            dome_log!(
                self.link.log,
                Level::Warn,
                SCOPE,
                "park stopped at {} for {}",
                actual,
                park
            );
            self.state.homed = false;
            self.state.parked = false;
            self.state.finish();
            Err(DomeError::CommandFailed(FailureKind::MissedPark))
        }
    }

    /// Leave park
    ///
    /// With home-on-unpark the dome searches home first. Otherwise the
    /// position is re-synced to the park azimuth and nothing moves.
    pub fn unpark(&mut self) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        self.state.begin(OperationState::Unparking);
        if self.config.home_on_unpark {
            self.state.unparking = true;
            self.start_home()
        } else {
            let park = self.state.constants.park_az;
            let elevation = self.state.elevation;
            self.sync(park, elevation)?;
            self.state.parked = false;
            self.state.unparking = false;
            self.state.finish();
            Ok(())
        }
    }

    /// Poll an unpark
    pub fn is_unpark_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.ensure_connected()?;
        if !self.state.parked {
            self.state.unparking = false;
            if self.state.operation == OperationState::Unparking {
                self.state.finish();
            }
            return Ok(true);
        }
        if !self.state.unparking {
            return Ok(false);
        }

        if self.is_find_home_complete()? {
            self.state.parked = false;
            self.state.unparking = false;
            self.state.finish();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Declare the dome to be at `azimuth`
    ///
    /// Elevation cannot be synced; the controller has no command for it.
    pub fn sync(&mut self, azimuth: f64, elevation: f64) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        let steps_per_rev = self.ensure_steps_per_rev()?;
        let azimuth = normalize_degrees(azimuth);
        let steps = degrees_to_steps_truncated(azimuth, steps_per_rev);

        self.state.set_azimuth(azimuth);
        self.exchange(Command::WriteRotatorPosition(steps))?;
        self.state.rotator_steps = steps;
        dome_log!(
            self.link.log,
            Level::Debug,
            SCOPE,
            "synced to {} ({} steps), elevation {} ignored",
            azimuth,
            steps,
            elevation
        );
        Ok(())
    }

    /// Stop both motors and forget every pending operation
    ///
    /// Does not wait for the motors to come to rest. The cached azimuth is
    /// re-read afterwards.
    pub fn abort(&mut self) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        self.state.clear_motion();
        dome_log!(self.link.log, Level::Info, SCOPE, "abort");

        let rotator = self.exchange(Command::StopRotator).map(|_| ());
        let shutter = self.exchange(Command::StopShutter).map(|_| ());

        match self.current_azimuth() {
            Ok(azimuth) => self.state.goto_target = azimuth,
            Err(DomeError::Transport(e)) => return Err(DomeError::Transport(e)),
            Err(_) => {}
        }
        rotator.and(shutter)
    }

    /// Measure steps per revolution (legacy firmware only)
    ///
    /// Writes a huge steps-per-revolution so the controller sweeps a whole
    /// turn between two home sensor hits and measures the real value.
    pub fn calibrate(&mut self) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if !self.variant.supports_calibration() {
            return Err(DomeError::CommandFailed(FailureKind::Unsupported));
        }
        if self.state.moving {
            return Ok(());
        }

        self.state.saved_steps_per_rev = Some(self.state.constants.steps_per_rev);
        self.exchange(Command::WriteStepsPerRev(CALIBRATION_SENTINEL_STEPS))?;
        self.state.constants.steps_per_rev = CALIBRATION_SENTINEL_STEPS;

        self.state.begin(OperationState::Calibrating);
        self.exchange(Command::FindHome)?;
        self.state.homed = false;
        self.state.moving = true;
        dome_log!(self.link.log, Level::Info, SCOPE, "calibration sweep started");
        Ok(())
    }

    /// Poll a calibration sweep
    ///
    /// Once stopped, the measured steps per revolution is read back. If the
    /// controller did not measure anything the previous value is restored.
    /// The position is then synced to the home azimuth.
    pub fn is_calibrate_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.ensure_connected()?;
        if self.state.operation != OperationState::Calibrating {
            return Ok(true);
        }
        if self.poll_moving()? {
            return Ok(false);
        }

        let measured = self.query_int(Command::ReadStepsPerRev);
        let measured = self.or_cached(measured, CALIBRATION_SENTINEL_STEPS)?;
        let steps_per_rev = if measured > 0 && measured != CALIBRATION_SENTINEL_STEPS {
            measured
        } else {
            let saved = self.state.saved_steps_per_rev.unwrap_or(0);
            dome_log!(
                self.link.log,
                Level::Warn,
                SCOPE,
                "calibration measured nothing, restoring {}",
                saved
            );
            self.exchange(Command::WriteStepsPerRev(saved))?;
            saved
        };
        self.state.constants.steps_per_rev = steps_per_rev;
        self.state.saved_steps_per_rev = None;

        let home = self.state.constants.home_az;
        let elevation = self.state.elevation;
        self.sync(home, elevation)?;
        self.state.homed = true;
        self.state.finish();
        dome_log!(
            self.link.log,
            Level::Info,
            SCOPE,
            "calibrated: {} steps per revolution",
            steps_per_rev
        );
        Ok(true)
    }
}
