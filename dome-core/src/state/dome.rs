//! The owned dome state

use dome_protocol::{ShutterReport, StatusReport, Telemetry};

use crate::config::{CalibrationConstants, DomeConfig};
use crate::state::operation::OperationState;
use crate::state::shutter::{ShutterMotion, ShutterState, OPEN_ELEVATION_DEG};
use crate::state::telemetry::AsyncTelemetry;
use crate::units::{normalize_degrees, steps_to_degrees};
use crate::variant::ProtocolVariant;

/// Everything the core knows about one dome
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DomeState {
    /// Link open and firmware accepted
    pub connected: bool,
    pub constants: CalibrationConstants,
    /// Rotator step position
    pub rotator_steps: i32,
    /// Rotator azimuth, always in `[0, 360)`
    pub azimuth: f64,
    /// Shutter elevation, 0 or 90 once settled
    pub elevation: f64,
    pub shutter: ShutterState,
    /// Shutter move we commanded and have not seen finish
    pub pending_shutter: Option<ShutterMotion>,
    pub operation: OperationState,
    /// Hardware is moving as far as we know
    pub moving: bool,
    pub homed: bool,
    pub parked: bool,
    /// Park via home: home phase still running
    pub parking: bool,
    /// Unpark via home in progress
    pub unparking: bool,
    /// Last goto target (degrees)
    pub goto_target: f64,
    /// Automatic retries spent on the current operation
    pub retries_used: u8,
    /// Steps per revolution to restore after a calibration sweep
    pub saved_steps_per_rev: Option<i32>,
    pub telemetry: AsyncTelemetry,
}

impl DomeState {
    /// Fresh state for a disconnected dome
    pub fn new(config: &DomeConfig) -> Self {
        Self {
            connected: false,
            constants: CalibrationConstants {
                park_az: normalize_degrees(config.park_az),
                ..CalibrationConstants::default()
            },
            rotator_steps: 0,
            azimuth: 0.0,
            elevation: 0.0,
            shutter: ShutterState::Idle,
            pending_shutter: None,
            operation: OperationState::None,
            moving: false,
            homed: false,
            parked: true,
            parking: false,
            unparking: false,
            goto_target: 0.0,
            retries_used: 0,
            saved_steps_per_rev: None,
            telemetry: AsyncTelemetry::default(),
        }
    }

    /// Apply one unsolicited telemetry line
    pub fn apply_telemetry<V: ProtocolVariant + ?Sized>(&mut self, telemetry: Telemetry, variant: &V) {
        match telemetry {
            Telemetry::RotatorSteps(steps) => self.set_rotator_steps(steps),
            Telemetry::ShutterSteps(steps) => {
                self.telemetry.shutter_steps = Some(steps);
                if variant.elevation_from_shutter_steps()
                    && self.pending_shutter.is_some()
                    && self.constants.shutter_range_known()
                {
                    self.elevation = shutter_steps_to_elevation(steps, self.constants.shutter_steps);
                }
            }
            Telemetry::BatteryRaw(raw) => self.telemetry.set_battery_raw(raw),
            Telemetry::Rain(rain) => self.telemetry.rain = rain,
            Telemetry::ShutterLink(up) => self.telemetry.shutter_link = up,
            Telemetry::Motion(echo) => self.telemetry.last_motion = Some(echo),
        }
    }

    /// Record a rotator step position from a push or a query
    ///
    /// The azimuth is only projected once steps-per-revolution is known.
    pub fn set_rotator_steps(&mut self, steps: i32) {
        self.rotator_steps = steps;
        if self.constants.rotator_calibrated() {
            self.azimuth = steps_to_degrees(steps, self.constants.steps_per_rev);
        }
    }

    /// Force the cached azimuth, as a sync does
    pub fn set_azimuth(&mut self, degrees: f64) {
        self.azimuth = normalize_degrees(degrees);
    }

    /// A status record seen while moving ends the move
    ///
    /// The controller emits `SER` (rotator) or `SES` (shutter) once a motor
    /// comes to rest. Returns whether the payload was such a record.
    pub fn note_motion_report(&mut self, payload: &str) -> bool {
        if payload.contains(StatusReport::TAG) || payload.contains(ShutterReport::TAG) {
            self.moving = false;
            true
        } else {
            false
        }
    }

    /// Record a decoded shutter state, settling elevation when at a limit
    pub fn set_shutter(&mut self, state: ShutterState) {
        self.shutter = state;
        if let Some(elevation) = state.elevation() {
            self.elevation = elevation;
        }
    }

    /// Whether the shutter is known open
    pub fn shutter_open(&self) -> bool {
        self.shutter == ShutterState::Open
    }

    /// Start tracking a new operation
    pub fn begin(&mut self, operation: OperationState) {
        self.operation = operation;
        self.retries_used = 0;
    }

    /// Mark the current operation finished
    pub fn finish(&mut self) {
        self.operation = OperationState::None;
        self.retries_used = 0;
    }

    /// Abort: drop every pending flag and operation
    pub fn clear_motion(&mut self) {
        self.homed = false;
        self.parked = false;
        self.moving = false;
        self.parking = false;
        self.unparking = false;
        self.pending_shutter = None;
        self.saved_steps_per_rev = None;
        self.finish();
    }

    /// Back to the disconnected defaults, keeping telemetry and constants
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.moving = false;
        self.homed = false;
        self.parking = false;
        self.unparking = false;
        self.pending_shutter = None;
        self.saved_steps_per_rev = None;
        self.finish();
    }
}

/// Elevation from a shutter step push while the shutter travels
///
/// Full travel maps to the open elevation; readings outside the travel are
/// clamped.
pub fn shutter_steps_to_elevation(steps: i32, range: i32) -> f64 {
    if range <= 0 {
        return 0.0;
    }
    let fraction = f64::from(steps) / f64::from(range);
    (fraction * OPEN_ELEVATION_DEG).clamp(0.0, OPEN_ELEVATION_DEG)
}
