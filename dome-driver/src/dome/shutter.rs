//! Shutter operations

use dome_core::log::{Level, LogSink};
use dome_core::state::ShutterMotion;
use dome_core::{dome_log, DomeError, DomeResult, FailureKind, OperationState, ShutterState};
use dome_hal::{Clock, SerialPort};
use dome_protocol::{Command, ShutterReport};
use embedded_hal::delay::DelayNs;

use super::{Dome, SCOPE};

impl<P, C, D, L> Dome<P, C, D, L>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
    L: LogSink,
{
    /// Shutter state
    ///
    /// `Idle` without a shutter. Served from cache while anything moves.
    pub fn shutter_state(&mut self) -> DomeResult<ShutterState, P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(ShutterState::Idle);
        }
        if self.state.moving {
            return Ok(self.state.shutter);
        }
        self.read_shutter()
    }

    /// Query and decode the limit switches
    fn read_shutter(&mut self) -> DomeResult<ShutterState, P::Error> {
        let pending = self.state.pending_shutter;
        let decoded = self
            .exchange(Command::ReadShutterStatus)
            .and_then(|reply| -> DomeResult<ShutterState, P::Error> {
                let report = ShutterReport::parse(&reply)?;
                Ok(ShutterState::decode(&report, pending))
            });
        let state = self.or_cached(decoded, self.state.shutter)?;
        self.state.set_shutter(state);
        Ok(state)
    }

    pub fn open_shutter(&mut self) -> DomeResult<(), P::Error> {
        self.start_shutter(ShutterMotion::Open)
    }

    pub fn close_shutter(&mut self) -> DomeResult<(), P::Error> {
        self.start_shutter(ShutterMotion::Close)
    }

    fn start_shutter(&mut self, motion: ShutterMotion) -> DomeResult<(), P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present || self.state.moving {
            return Ok(());
        }
        // The shutter board may have moved on its own, e.g. closing on rain.
        if self.read_shutter()? == motion.target() {
            dome_log!(self.link.log, Level::Debug, SCOPE, "shutter already {:?}", motion);
            return Ok(());
        }

        let (command, operation) = match motion {
            ShutterMotion::Open => (Command::OpenShutter, OperationState::Opening),
            ShutterMotion::Close => (Command::CloseShutter, OperationState::Closing),
        };
        self.exchange(command)?;
        self.state.moving = true;
        self.state.pending_shutter = Some(motion);
        self.state.shutter = motion.in_flight();
        self.state.begin(operation);
        Ok(())
    }

    pub fn is_open_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.is_shutter_complete(ShutterMotion::Open)
    }

    pub fn is_close_complete(&mut self) -> DomeResult<bool, P::Error> {
        self.is_shutter_complete(ShutterMotion::Close)
    }

    /// Poll a shutter move
    ///
    /// Done once the matching limit switch is active. Neither switch with
    /// no move pending is a fault.
    fn is_shutter_complete(&mut self, motion: ShutterMotion) -> DomeResult<bool, P::Error> {
        self.ensure_connected()?;
        if !self.config.shutter_present {
            return Ok(true);
        }
        if self.poll_moving()? {
            return Ok(false);
        }

        let state = self.read_shutter()?;
        if state == motion.target() {
            self.state.pending_shutter = None;
            if matches!(
                self.state.operation,
                OperationState::Opening | OperationState::Closing
            ) {
                self.state.finish();
            }
            Ok(true)
        } else if state == ShutterState::Error {
            dome_log!(self.link.log, Level::Error, SCOPE, "shutter between limits");
            self.state.pending_shutter = None;
            self.state.finish();
            Err(DomeError::CommandFailed(FailureKind::ShutterFault))
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::*;
    use dome_core::DomeConfig;

    #[test]
    fn test_open_shutter() {
        let mut rig = v3();
        rig.dome.open_shutter().unwrap();
        assert_eq!(rig.port.written(), vec!["@SRS", "@OPS"]);
        assert_eq!(rig.dome.state().shutter, ShutterState::Opening);
        assert_eq!(rig.dome.shutter_state(), Ok(ShutterState::Opening));

        assert_eq!(rig.dome.is_open_complete(), Ok(false));

        rig.port.reply("@SRS", OPEN);
        rig.stop(OPEN);
        assert_eq!(rig.dome.is_open_complete(), Ok(true));
        assert_eq!(rig.dome.current_elevation(), Ok(90.0));
        assert!(rig.dome.state().pending_shutter.is_none());
    }

    #[test]
    fn test_open_after_board_closed_on_its_own() {
        let mut rig = v3();
        rig.dome.open_shutter().unwrap();
        rig.port.reply("@SRS", OPEN);
        rig.stop(OPEN);
        assert_eq!(rig.dome.is_open_complete(), Ok(true));

        // Rain: the shutter board closes without being told
        rig.port.reply("@SRS", CLOSED);
        rig.port.clear_written();
        rig.dome.open_shutter().unwrap();
        assert_eq!(rig.port.written(), vec!["@SRS", "@OPS"]);
        assert!(rig.dome.is_moving());
    }

    #[test]
    fn test_shutter_between_limits_while_opening_is_pending() {
        let mut rig = v3();
        rig.dome.open_shutter().unwrap();
        rig.port.reply("@SRS", ":SES,20000,46000,0,0#\n");
        rig.stop(":SES,20000,46000,0,0#\n");

        assert_eq!(rig.dome.is_open_complete(), Ok(false));
        assert_eq!(rig.dome.state().shutter, ShutterState::Opening);
    }

    #[test]
    fn test_shutter_between_limits_unprompted_is_a_fault() {
        let mut rig = v3();
        rig.port.reply("@SRS", ":SES,20000,46000,0,0#\n");

        assert_eq!(rig.dome.shutter_state(), Ok(ShutterState::Error));
        assert_eq!(
            rig.dome.is_close_complete(),
            Err(DomeError::CommandFailed(FailureKind::ShutterFault))
        );
    }

    #[test]
    fn test_closed_switch_wins() {
        let mut rig = v3();
        rig.port.reply("@SRS", ":SES,0,46000,1,1#\n");
        assert_eq!(rig.dome.shutter_state(), Ok(ShutterState::Closed));
    }

    #[test]
    fn test_open_when_already_open_sends_nothing() {
        let mut rig = v3();
        rig.port.reply("@SRS", OPEN);
        rig.dome.open_shutter().unwrap();
        assert_eq!(rig.port.written(), vec!["@SRS"]);
        assert!(!rig.dome.is_moving());
    }

    #[test]
    fn test_legacy_elevation_follows_shutter_pushes() {
        let mut rig = legacy();
        rig.dome.open_shutter().unwrap();
        rig.port.push_rx("S23000\n");

        assert_eq!(rig.dome.is_open_complete(), Ok(false));
        assert_eq!(rig.dome.current_elevation(), Ok(45.0));
    }

    #[test]
    fn test_v3_elevation_ignores_shutter_pushes() {
        let mut rig = v3();
        rig.dome.open_shutter().unwrap();
        rig.port.push_rx("S23000\n");

        assert_eq!(rig.dome.is_open_complete(), Ok(false));
        assert_eq!(rig.dome.current_elevation(), Ok(0.0));
    }

    #[test]
    fn test_shutter_commands_without_shutter() {
        let mut rig = connected(DomeConfig {
            shutter_present: false,
            ..DomeConfig::default()
        });
        rig.dome.open_shutter().unwrap();
        rig.dome.close_shutter().unwrap();
        assert!(rig.port.written().is_empty());
        assert_eq!(rig.dome.is_open_complete(), Ok(true));
        assert_eq!(rig.dome.is_close_complete(), Ok(true));
    }
}
