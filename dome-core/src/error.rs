//! Error taxonomy
//!
//! Every host-facing operation either completes, stays pending, or fails
//! with one of these. There is no partial success.

use dome_protocol::ParseError;

/// What exactly went wrong in a [`DomeError::CommandFailed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureKind {
    /// Reply payload could not be parsed
    Malformed(ParseError),
    /// Rotator stopped away from the goto target
    MissedTarget,
    /// Home search stopped without the home sensor active
    HomeNotFound,
    /// Park move stopped away from the park azimuth
    MissedPark,
    /// Shutter reports neither limit switch with nothing commanded
    ShutterFault,
    /// Operation not available on this firmware generation
    Unsupported,
}

/// Dome driver errors, generic over the transport error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DomeError<E> {
    /// Operation attempted before a successful connect
    NotConnected,
    /// No acceptable reply within the exchange bounds
    ReceiveTimeout,
    /// Reply did not match expectations
    CommandFailed(FailureKind),
    /// Controller firmware is older than the variant supports
    FirmwareNotSupported {
        /// Reported version ×100 (3.1.0 → 310), 0 when unreadable
        version_x100: u16,
    },
    /// I/O failure below the protocol
    Transport(E),
}

impl<E> DomeError<E> {
    /// Whether the caller may simply try again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::ReceiveTimeout | Self::CommandFailed(_)
        )
    }
}

impl<E> From<ParseError> for DomeError<E> {
    fn from(err: ParseError) -> Self {
        Self::CommandFailed(FailureKind::Malformed(err))
    }
}

/// Result alias for dome operations
pub type DomeResult<T, E> = Result<T, DomeError<E>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_maps_to_command_failed() {
        let err: DomeError<()> = ParseError::NumberFormat.into();
        assert_eq!(
            err,
            DomeError::CommandFailed(FailureKind::Malformed(ParseError::NumberFormat))
        );
    }

    #[test]
    fn test_transport_errors_are_fatal() {
        assert!(!DomeError::Transport(()).is_recoverable());
        assert!(!DomeError::<()>::FirmwareNotSupported { version_x100: 250 }.is_recoverable());
        assert!(DomeError::<()>::ReceiveTimeout.is_recoverable());
    }
}
