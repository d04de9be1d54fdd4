//! Shutter state and its decoding from the limit switches

use dome_protocol::ShutterReport;

/// Elevation reported with the shutter open (degrees)
pub const OPEN_ELEVATION_DEG: f64 = 90.0;
/// Elevation reported with the shutter closed (degrees)
pub const CLOSED_ELEVATION_DEG: f64 = 0.0;

/// Shutter state as seen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutterState {
    Open,
    Closed,
    Opening,
    Closing,
    /// No shutter, or nothing known yet
    #[default]
    Idle,
    /// Neither limit switch active with nothing commanded
    Error,
}

impl ShutterState {
    /// Decode a shutter record
    ///
    /// With both switches inactive the shutter is between limits. If we
    /// commanded a move that is where it is heading; otherwise it is a
    /// hardware fault. The closed switch wins when both read active.
    pub fn decode(report: &ShutterReport, pending: Option<ShutterMotion>) -> Self {
        match (report.open_sensor, report.closed_sensor, pending) {
            (false, false, Some(motion)) => motion.in_flight(),
            (false, false, None) => Self::Error,
            (_, true, _) => Self::Closed,
            (true, false, _) => Self::Open,
        }
    }

    /// Elevation implied by a settled shutter
    pub fn elevation(&self) -> Option<f64> {
        match self {
            Self::Open => Some(OPEN_ELEVATION_DEG),
            Self::Closed => Some(CLOSED_ELEVATION_DEG),
            _ => None,
        }
    }

    /// Whether the shutter is between limits on purpose
    pub fn is_moving(&self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }
}

/// Last shutter move we commanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutterMotion {
    Open,
    Close,
}

impl ShutterMotion {
    /// State while the move runs
    pub fn in_flight(&self) -> ShutterState {
        match self {
            Self::Open => ShutterState::Opening,
            Self::Close => ShutterState::Closing,
        }
    }

    /// State once the move is done
    pub fn target(&self) -> ShutterState {
        match self {
            Self::Open => ShutterState::Open,
            Self::Close => ShutterState::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(line: &str) -> ShutterReport {
        ShutterReport::parse(line).unwrap()
    }

    #[test]
    fn test_closed_sensor() {
        let state = ShutterState::decode(&report("SES,-125,46000,0,1"), None);
        assert_eq!(state, ShutterState::Closed);
    }

    #[test]
    fn test_open_sensor() {
        let state = ShutterState::decode(&report("SES,-125,46000,1,0"), None);
        assert_eq!(state, ShutterState::Open);
    }

    #[test]
    fn test_no_sensor_nothing_commanded_is_error() {
        let state = ShutterState::decode(&report("SES,-125,46000,0,0"), None);
        assert_eq!(state, ShutterState::Error);
    }

    #[test]
    fn test_no_sensor_while_commanded_reports_command() {
        let record = report("SES,20000,46000,0,0");
        assert_eq!(
            ShutterState::decode(&record, Some(ShutterMotion::Open)),
            ShutterState::Opening
        );
        assert_eq!(
            ShutterState::decode(&record, Some(ShutterMotion::Close)),
            ShutterState::Closing
        );
    }

    #[test]
    fn test_closed_wins_when_both_active() {
        let state = ShutterState::decode(&report("SES,0,46000,1,1"), Some(ShutterMotion::Open));
        assert_eq!(state, ShutterState::Closed);
    }

    #[test]
    fn test_elevation_only_for_settled_states() {
        assert_eq!(ShutterState::Open.elevation(), Some(90.0));
        assert_eq!(ShutterState::Closed.elevation(), Some(0.0));
        assert_eq!(ShutterState::Opening.elevation(), None);
        assert_eq!(ShutterState::Error.elevation(), None);
    }
}
