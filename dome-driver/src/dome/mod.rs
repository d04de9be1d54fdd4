//! Host-facing dome controller
//!
//! Owns the link, the configuration and the [`DomeState`]. Every method
//! runs to completion on the caller's thread; moves are started by one
//! call and finished by polling the matching `is_*_complete`.

mod motion;
mod settings;
mod shutter;

use dome_core::log::{Level, LogSink, NullLog};
use dome_core::units::round;
use dome_core::{
    dome_log, DomeConfig, DomeError, DomeResult, DomeState, ExchangeTiming, ProtocolVariant,
    VariantKind,
};
use dome_hal::{Clock, SerialPort};
use dome_protocol::fields::parse_tagged_int;
use dome_protocol::{Command, FirmwareVersion, Line, RainState, StatusReport};
use embedded_hal::delay::DelayNs;

use crate::exchange::Exchanger;

const SCOPE: &str = "dome";

/// NexDome rotator and shutter controller
pub struct Dome<P, C, D, L = NullLog> {
    link: Exchanger<P, C, D, L>,
    config: DomeConfig,
    variant: VariantKind,
    state: DomeState,
    firmware: Option<FirmwareVersion>,
}

impl<P, C, D> Dome<P, C, D, NullLog>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
{
    /// Create a controller that logs nothing
    pub fn new(port: P, clock: C, delay: D, config: DomeConfig) -> Self {
        Self::with_log(port, clock, delay, config, NullLog)
    }
}

impl<P, C, D, L> Dome<P, C, D, L>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
    L: LogSink,
{
    /// Create a controller logging to `log`
    pub fn with_log(port: P, clock: C, delay: D, config: DomeConfig, log: L) -> Self {
        Self {
            link: Exchanger::new(port, clock, delay, log, config.timing),
            variant: config.variant,
            state: DomeState::new(&config),
            config,
            firmware: None,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> &DomeState {
        &self.state
    }

    pub fn config(&self) -> &DomeConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Firmware version read at connect
    pub fn firmware_version(&self) -> Option<&FirmwareVersion> {
        self.firmware.as_ref()
    }

    fn timing(&self) -> ExchangeTiming {
        *self.link.timing()
    }

    fn ensure_connected(&self) -> DomeResult<(), P::Error> {
        if self.state.connected {
            Ok(())
        } else {
            Err(DomeError::NotConnected)
        }
    }

    /// Open the link and read the dome's constants
    ///
    /// Blocks for the controller boot delay (2 s by default) plus one
    /// exchange per constant. The link is closed again on failure.
    pub fn connect(&mut self, port: &str) -> DomeResult<(), P::Error> {
        self.link
            .open(port, &self.config.serial)
            .map_err(DomeError::Transport)?;

        self.state.connected = true;
        self.state.moving = false;
        self.state.homed = false;
        self.state.parking = false;
        self.state.unparking = false;
        self.state.finish();
        self.firmware = None;
        dome_log!(self.link.log, Level::Info, SCOPE, "connecting on {}", port);

        // The controller resets on open and has to bring its radio up.
        self.link.sleep_ms(self.timing().connect_settle_ms);

        if let Err(err) = self.handshake() {
            dome_log!(self.link.log, Level::Error, SCOPE, "connect failed: {:?}", err);
            self.teardown();
            return Err(err);
        }
        Ok(())
    }

    fn handshake(&mut self) -> DomeResult<(), P::Error> {
        let version = match self.read_firmware() {
            Ok(version) => version,
            Err(DomeError::Transport(e)) => return Err(DomeError::Transport(e)),
            Err(_) => return Err(DomeError::FirmwareNotSupported { version_x100: 0 }),
        };

        let minimum = self.variant.minimum_firmware();
        if !version.at_least(minimum) {
            dome_log!(
                self.link.log,
                Level::Error,
                SCOPE,
                "firmware {} below {} minimum {}",
                version.as_str(),
                self.variant.name(),
                minimum
            );
            return Err(DomeError::FirmwareNotSupported {
                version_x100: version_x100(&version),
            });
        }
        dome_log!(
            self.link.log,
            Level::Info,
            SCOPE,
            "firmware {} ({})",
            version.as_str(),
            self.variant.name()
        );
        self.firmware = Some(version);

        // A board that does not answer leaves its cached constants in place.
        let steps_per_rev = self.query_int(Command::ReadStepsPerRev);
        self.state.constants.steps_per_rev =
            self.or_cached(steps_per_rev, self.state.constants.steps_per_rev)?;
        if self.config.shutter_present {
            let shutter_steps = self.query_int(Command::ReadShutterSteps);
            self.state.constants.shutter_steps =
                self.or_cached(shutter_steps, self.state.constants.shutter_steps)?;
        }
        let home_steps = self.query_int(Command::ReadHomePosition);
        let cached = self.state.constants.home_steps();
        let home_steps = self.or_cached(home_steps, cached)?;
        self.state.constants.set_home_from_steps(home_steps);

        let shutter = self.shutter_state()?;
        if shutter.elevation().is_none() {
            self.state.elevation = 0.0;
        }

        if self.variant.has_dead_zone() {
            let dead_zone = self.query_int(Command::ReadDeadZone);
            self.state.constants.dead_zone_steps =
                self.or_cached(dead_zone, self.state.constants.dead_zone_steps)?;
        }
        Ok(())
    }

    fn read_firmware(&mut self) -> DomeResult<FirmwareVersion, P::Error> {
        let skips = self.timing().max_firmware_reply_skips;
        let reply = self.exchange_with(Command::ReadFirmware, skips)?;
        Ok(FirmwareVersion::parse(&reply)?)
    }

    fn teardown(&mut self) {
        if let Err(e) = self.link.close() {
            dome_log!(self.link.log, Level::Warn, SCOPE, "close failed: {:?}", e);
        }
        self.state.disconnect();
    }

    /// Stop everything and close the link
    ///
    /// Local state is reset even when closing the port fails.
    pub fn disconnect(&mut self) -> DomeResult<(), P::Error> {
        let closed = if self.state.connected {
            if let Err(err) = self.abort() {
                dome_log!(self.link.log, Level::Warn, SCOPE, "abort on disconnect: {:?}", err);
            }
            self.link.close()
        } else {
            Ok(())
        };
        self.state.disconnect();
        dome_log!(self.link.log, Level::Info, SCOPE, "disconnected");
        closed.map_err(DomeError::Transport)
    }

    /// Send a command and wait for its reply
    fn exchange(&mut self, command: Command) -> DomeResult<Line, P::Error> {
        let skips = self.timing().max_reply_skips;
        self.exchange_with(command, skips)
    }

    fn exchange_with(&mut self, command: Command, skips: u8) -> DomeResult<Line, P::Error> {
        self.ensure_connected()?;
        self.link.execute(
            command,
            command.reply_tag(),
            skips,
            &mut self.state,
            &self.variant,
        )
    }

    /// Read query answered by `<TAG><int>`
    fn query_int(&mut self, command: Command) -> DomeResult<i32, P::Error> {
        let reply = self.exchange(command)?;
        let tag = command.reply_tag().unwrap_or(command.mnemonic());
        Ok(parse_tagged_int(&reply, tag)?)
    }

    /// Fall back to `cached` when a read query fails without a link fault
    ///
    /// The controller drops replies now and then during moves; the host is
    /// better served by the last known value than by an error.
    fn or_cached<T: Copy + core::fmt::Debug>(
        &mut self,
        result: DomeResult<T, P::Error>,
        cached: T,
    ) -> DomeResult<T, P::Error> {
        match result {
            Ok(value) => Ok(value),
            Err(DomeError::Transport(e)) => Err(DomeError::Transport(e)),
            Err(DomeError::NotConnected) => Err(DomeError::NotConnected),
            Err(err) => {
                dome_log!(
                    self.link.log,
                    Level::Warn,
                    SCOPE,
                    "query failed ({:?}), using cached {:?}",
                    err,
                    cached
                );
                Ok(cached)
            }
        }
    }

    /// Whether the hardware is still moving, after draining async lines
    fn poll_moving(&mut self) -> DomeResult<bool, P::Error> {
        if !self.state.moving {
            return Ok(false);
        }
        self.link.drain(&mut self.state, &self.variant)?;
        Ok(self.state.moving)
    }

    /// Whether the controller reports the rotator on the home sensor
    fn at_home(&mut self) -> DomeResult<bool, P::Error> {
        let reply = self.exchange(Command::ReadRotatorStatus)?;
        Ok(StatusReport::parse(&reply)?.at_home)
    }

    /// Drain telemetry when idle, as the sensor getters want fresh values
    fn refresh_telemetry(&mut self) -> DomeResult<(), P::Error> {
        if !self.state.moving {
            self.link.drain(&mut self.state, &self.variant)?;
        }
        Ok(())
    }

    /// Rotator azimuth
    ///
    /// Served from cache while moving; otherwise queried, falling back to
    /// the cache if the controller does not answer.
    pub fn current_azimuth(&mut self) -> DomeResult<f64, P::Error> {
        self.ensure_connected()?;
        if self.state.moving {
            return Ok(self.state.azimuth);
        }
        let steps = self.query_int(Command::ReadRotatorPosition);
        let steps = self.or_cached(steps, self.state.rotator_steps)?;
        self.state.set_rotator_steps(steps);
        Ok(self.state.azimuth)
    }

    /// Shutter elevation: 0 closed, 90 open
    pub fn current_elevation(&mut self) -> DomeResult<f64, P::Error> {
        self.ensure_connected()?;
        Ok(self.state.elevation)
    }

    /// Rain sensor status
    pub fn rain_status(&mut self) -> DomeResult<RainState, P::Error> {
        self.ensure_connected()?;
        self.refresh_telemetry()?;
        Ok(self.state.telemetry.rain)
    }

    /// Shutter battery voltage, 0 without a shutter
    pub fn shutter_volts(&mut self) -> DomeResult<f64, P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(0.0);
        }
        self.refresh_telemetry()?;
        Ok(self.state.telemetry.volts)
    }

    /// Whether the XBee link to the shutter board last reported online
    pub fn shutter_link_up(&self) -> bool {
        self.state.telemetry.shutter_link
    }

    pub fn is_homed(&self) -> bool {
        self.state.homed
    }

    pub fn is_parked(&self) -> bool {
        self.state.parked
    }

    /// Moving flag as last known, without touching the link
    pub fn is_moving(&self) -> bool {
        self.state.moving
    }

    /// Cached rotator step position
    pub fn rotator_step_position(&self) -> i32 {
        self.state.rotator_steps
    }
}

/// Version as an integer ×100, saturating
fn version_x100(version: &FirmwareVersion) -> u16 {
    let scaled = round(f64::from(version.number()) * 100.0) as i64;
    scaled.clamp(0, i64::from(u16::MAX)) as u16
}
