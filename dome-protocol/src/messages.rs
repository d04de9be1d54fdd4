//! Command vocabulary
//!
//! Three-letter mnemonics after `@`: the first two letters name the
//! parameter, the last one the board (`R` rotator, `S` shutter). `xR?` reads,
//! `xW?` writes.

use core::fmt::Write;
use heapless::String;

/// Maximum encoded command length (`@GAR,-2147483648\r\n` fits)
pub const COMMAND_CAPACITY: usize = 24;

/// An encoded command line, terminator included
pub type CommandBuffer = String<COMMAND_CAPACITY>;

/// Commands understood by the rotator controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `@FRR`: firmware version
    ReadFirmware,
    /// `@PRR`: rotator step position
    ReadRotatorPosition,
    /// `@PWR,<steps>`: overwrite rotator step position (sync)
    WriteRotatorPosition(i32),
    /// `@GAR,<deg>`: goto azimuth
    GotoAzimuth(i32),
    /// `@GHR`: find home
    FindHome,
    /// `@SRR`: rotator status record
    ReadRotatorStatus,
    /// `@SRS`: shutter status record
    ReadShutterStatus,
    /// `@OPS`: open shutter
    OpenShutter,
    /// `@CLS`: close shutter
    CloseShutter,
    /// `@SWR`: stop rotator
    StopRotator,
    /// `@SWS`: stop shutter
    StopShutter,
    /// `@HRR`: home position in steps
    ReadHomePosition,
    /// `@HWR,<steps>`
    WriteHomePosition(i32),
    /// `@RRR`: rotator steps per revolution
    ReadStepsPerRev,
    /// `@RWR,<steps>`
    WriteStepsPerRev(i32),
    /// `@RRS`: shutter travel in steps
    ReadShutterSteps,
    /// `@RWS,<steps>`
    WriteShutterSteps(i32),
    /// `@DRR`: rotation dead zone in steps
    ReadDeadZone,
    /// `@DWR,<steps>`
    WriteDeadZone(i32),
    /// `@VRR`: rotator speed
    ReadRotatorSpeed,
    /// `@VWR,<speed>`
    WriteRotatorSpeed(i32),
    /// `@ARR`: rotator acceleration
    ReadRotatorAcceleration,
    /// `@AWR,<accel>`
    WriteRotatorAcceleration(i32),
    /// `@VRS`: shutter speed
    ReadShutterSpeed,
    /// `@VWS,<speed>`
    WriteShutterSpeed(i32),
    /// `@ARS`: shutter acceleration
    ReadShutterAcceleration,
    /// `@AWS,<accel>`
    WriteShutterAcceleration(i32),
    /// `@ZRR`: load rotator settings from EEPROM
    LoadRotatorEeprom,
    /// `@ZRS`: load shutter settings from EEPROM
    LoadShutterEeprom,
    /// `@ZWR`: save rotator settings to EEPROM
    SaveRotatorEeprom,
    /// `@ZWS`: save shutter settings to EEPROM
    SaveShutterEeprom,
    /// `@ZDR`: restore rotator defaults
    ResetRotatorEeprom,
    /// `@ZDS`: restore shutter defaults
    ResetShutterEeprom,
}

impl Command {
    /// Mnemonic without the leading `@`
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::ReadFirmware => "FRR",
            Self::ReadRotatorPosition => "PRR",
            Self::WriteRotatorPosition(_) => "PWR",
            Self::GotoAzimuth(_) => "GAR",
            Self::FindHome => "GHR",
            Self::ReadRotatorStatus => "SRR",
            Self::ReadShutterStatus => "SRS",
            Self::OpenShutter => "OPS",
            Self::CloseShutter => "CLS",
            Self::StopRotator => "SWR",
            Self::StopShutter => "SWS",
            Self::ReadHomePosition => "HRR",
            Self::WriteHomePosition(_) => "HWR",
            Self::ReadStepsPerRev => "RRR",
            Self::WriteStepsPerRev(_) => "RWR",
            Self::ReadShutterSteps => "RRS",
            Self::WriteShutterSteps(_) => "RWS",
            Self::ReadDeadZone => "DRR",
            Self::WriteDeadZone(_) => "DWR",
            Self::ReadRotatorSpeed => "VRR",
            Self::WriteRotatorSpeed(_) => "VWR",
            Self::ReadRotatorAcceleration => "ARR",
            Self::WriteRotatorAcceleration(_) => "AWR",
            Self::ReadShutterSpeed => "VRS",
            Self::WriteShutterSpeed(_) => "VWS",
            Self::ReadShutterAcceleration => "ARS",
            Self::WriteShutterAcceleration(_) => "AWS",
            Self::LoadRotatorEeprom => "ZRR",
            Self::LoadShutterEeprom => "ZRS",
            Self::SaveRotatorEeprom => "ZWR",
            Self::SaveShutterEeprom => "ZWS",
            Self::ResetRotatorEeprom => "ZDR",
            Self::ResetShutterEeprom => "ZDS",
        }
    }

    /// Integer argument, if the command carries one
    pub fn argument(&self) -> Option<i32> {
        match *self {
            Self::WriteRotatorPosition(n)
            | Self::GotoAzimuth(n)
            | Self::WriteHomePosition(n)
            | Self::WriteStepsPerRev(n)
            | Self::WriteShutterSteps(n)
            | Self::WriteDeadZone(n)
            | Self::WriteRotatorSpeed(n)
            | Self::WriteRotatorAcceleration(n)
            | Self::WriteShutterSpeed(n)
            | Self::WriteShutterAcceleration(n) => Some(n),
            _ => None,
        }
    }

    /// Tag the matching reply must contain
    ///
    /// `None` means the first reply of any kind satisfies the command; the
    /// firmware acknowledges writes and motion starts without a stable tag.
    pub fn reply_tag(&self) -> Option<&'static str> {
        match self {
            Self::ReadFirmware => Some("FR"),
            Self::ReadRotatorStatus => Some("SER"),
            Self::ReadShutterStatus => Some("SES"),
            Self::ReadRotatorPosition
            | Self::ReadHomePosition
            | Self::ReadStepsPerRev
            | Self::ReadShutterSteps
            | Self::ReadDeadZone
            | Self::ReadRotatorSpeed
            | Self::ReadRotatorAcceleration
            | Self::ReadShutterSpeed
            | Self::ReadShutterAcceleration => Some(self.mnemonic()),
            _ => None,
        }
    }

    /// Whether the command starts a physical move
    pub fn starts_motion(&self) -> bool {
        matches!(
            self,
            Self::GotoAzimuth(_) | Self::FindHome | Self::OpenShutter | Self::CloseShutter
        )
    }

    /// Encode as a wire line, `\r\n` included
    pub fn encode(&self) -> CommandBuffer {
        let mut buffer = CommandBuffer::new();
        // Longest form is 4 + 1 + 11 + 2 bytes, well inside the capacity.
        let _ = match self.argument() {
            Some(n) => write!(buffer, "@{},{}\r\n", self.mnemonic(), n),
            None => write!(buffer, "@{}\r\n", self.mnemonic()),
        };
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain() {
        assert_eq!(Command::ReadRotatorPosition.encode().as_str(), "@PRR\r\n");
        assert_eq!(Command::FindHome.encode().as_str(), "@GHR\r\n");
        assert_eq!(Command::StopShutter.encode().as_str(), "@SWS\r\n");
    }

    #[test]
    fn test_encode_with_argument() {
        assert_eq!(Command::GotoAzimuth(180).encode().as_str(), "@GAR,180\r\n");
        assert_eq!(
            Command::WriteRotatorPosition(-42).encode().as_str(),
            "@PWR,-42\r\n"
        );
        assert_eq!(
            Command::WriteShutterAcceleration(i32::MIN).encode().as_str(),
            "@AWS,-2147483648\r\n"
        );
    }

    #[test]
    fn test_reply_tags() {
        assert_eq!(Command::ReadStepsPerRev.reply_tag(), Some("RRR"));
        assert_eq!(Command::ReadShutterStatus.reply_tag(), Some("SES"));
        assert_eq!(Command::ReadRotatorStatus.reply_tag(), Some("SER"));
        assert_eq!(Command::ReadFirmware.reply_tag(), Some("FR"));
        assert_eq!(Command::GotoAzimuth(10).reply_tag(), None);
        assert_eq!(Command::WriteDeadZone(5).reply_tag(), None);
    }

    #[test]
    fn test_motion_commands() {
        assert!(Command::GotoAzimuth(0).starts_motion());
        assert!(Command::OpenShutter.starts_motion());
        assert!(!Command::StopRotator.starts_motion());
        assert!(!Command::ReadRotatorPosition.starts_motion());
    }
}
