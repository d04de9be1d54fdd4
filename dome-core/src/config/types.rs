//! Driver configuration
//!
//! Settings the host adapter owns and persists. The core never stores
//! them; with the `serde` feature they round-trip through postcard so the
//! host can keep them as an opaque blob.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use dome_hal::SerialConfig;

use crate::variant::VariantKind;

/// Minimum spacing between two commands (ms)
pub const INTER_COMMAND_DELAY_MS: u32 = 50;
/// Per-byte read timeout while waiting for a reply (ms)
pub const READ_TIMEOUT_MS: u32 = 1000;
/// Per-byte read timeout while draining async telemetry (ms)
pub const POLL_READ_TIMEOUT_MS: u32 = 250;
/// Sleep after a read that returned nothing (ms)
pub const NO_DATA_BACKOFF_MS: u32 = 50;
/// Empty reads tolerated in one exchange
pub const MAX_RX_TIMEOUTS: u8 = 5;
/// Replies with the wrong tag tolerated in one exchange
pub const MAX_REPLY_SKIPS: u8 = 5;
/// Replies with the wrong tag tolerated while asking for the firmware
pub const MAX_FIRMWARE_REPLY_SKIPS: u8 = 15;
/// Telemetry lines tolerated in one exchange
pub const MAX_TELEMETRY_FRAMES: u16 = 64;
/// Controller boot time after the port opens (ms)
pub const CONNECT_SETTLE_MS: u32 = 2000;
/// Time the controller needs to write its EEPROM (ms)
pub const EEPROM_SETTLE_MS: u32 = 500;
/// Azimuth error accepted when a move completes (degrees)
pub const ARRIVAL_TOLERANCE_DEG: f64 = 3.0;

/// Timing and retry bounds of the command exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExchangeTiming {
    pub inter_command_delay_ms: u32,
    pub read_timeout_ms: u32,
    pub poll_read_timeout_ms: u32,
    pub no_data_backoff_ms: u32,
    pub max_rx_timeouts: u8,
    pub max_reply_skips: u8,
    pub max_firmware_reply_skips: u8,
    pub max_telemetry_frames: u16,
    pub connect_settle_ms: u32,
    pub eeprom_settle_ms: u32,
}

impl Default for ExchangeTiming {
    fn default() -> Self {
        Self {
            inter_command_delay_ms: INTER_COMMAND_DELAY_MS,
            read_timeout_ms: READ_TIMEOUT_MS,
            poll_read_timeout_ms: POLL_READ_TIMEOUT_MS,
            no_data_backoff_ms: NO_DATA_BACKOFF_MS,
            max_rx_timeouts: MAX_RX_TIMEOUTS,
            max_reply_skips: MAX_REPLY_SKIPS,
            max_firmware_reply_skips: MAX_FIRMWARE_REPLY_SKIPS,
            max_telemetry_frames: MAX_TELEMETRY_FRAMES,
            connect_settle_ms: CONNECT_SETTLE_MS,
            eeprom_settle_ms: EEPROM_SETTLE_MS,
        }
    }
}

/// Dome driver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DomeConfig {
    /// Firmware generation of the rotator controller
    pub variant: VariantKind,
    /// Whether a shutter controller is installed
    pub shutter_present: bool,
    /// Find home before moving to the park azimuth
    pub home_on_park: bool,
    /// Find home when unparking instead of just re-syncing
    pub home_on_unpark: bool,
    /// Park azimuth in degrees
    pub park_az: f64,
    /// Serial line settings
    pub serial: SerialConfig,
    /// Exchange timing
    pub timing: ExchangeTiming,
}

impl Default for DomeConfig {
    fn default() -> Self {
        Self {
            variant: VariantKind::default(),
            shutter_present: true,
            home_on_park: false,
            home_on_unpark: false,
            park_az: 0.0,
            serial: SerialConfig::default(),
            timing: ExchangeTiming::default(),
        }
    }
}

/// Errors from configuration encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Output buffer too small or value not encodable
    Serialize,
    /// Blob truncated or from an incompatible layout
    Deserialize,
}

#[cfg(feature = "serde")]
impl DomeConfig {
    /// Encode into `buffer`, returning the used prefix
    pub fn to_bytes<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }

    /// Decode from a blob produced by [`DomeConfig::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)
    }
}
