//! Reply payload parsing
//!
//! Replies are either `<TAG><int>` (`RRR55080`), comma separated records
//! (`SES,-125,46000,0,1`) or the firmware version string (`FR3.1.0`).
//! Integers are read the lenient way the controller firmware expects:
//! optional sign, leading digits, anything after them ignored.

use core::fmt::Write;
use heapless::String;

/// Reply tag of the firmware version query
pub const FIRMWARE_TAG: &str = "FR";

/// Maximum stored length of a firmware version string
pub const VERSION_CAPACITY: usize = 32;

/// Errors from reply payload parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Expected tag not found in the payload
    MissingTag,
    /// Fewer fields than the record needs
    FieldCount { expected: u8, found: u8 },
    /// A field that should be numeric is not
    NumberFormat,
}

/// Parse a leading integer the way C `atoi` would
///
/// Skips leading spaces, accepts one sign, reads digits until the first
/// non-digit. Returns `None` when no digit was found. Saturates instead of
/// overflowing.
pub fn parse_leading_int(text: &str) -> Option<i32> {
    let text = text.trim_start_matches(' ');
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut value: i64 = 0;
    let mut seen = false;
    for c in digits.bytes() {
        if !c.is_ascii_digit() {
            break;
        }
        seen = true;
        value = (value * 10 + i64::from(c - b'0')).min(i64::from(i32::MAX) + 1);
    }
    if !seen {
        return None;
    }

    let value = if negative { -value } else { value };
    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Parse the integer following `tag` in a `<TAG><int>` reply
pub fn parse_tagged_int(payload: &str, tag: &str) -> Result<i32, ParseError> {
    let start = payload.find(tag).ok_or(ParseError::MissingTag)? + tag.len();
    let rest = payload.get(start..).unwrap_or("");
    // Some firmware builds echo the tag followed by a comma.
    let rest = rest.strip_prefix(',').unwrap_or(rest);
    parse_leading_int(rest).ok_or(ParseError::NumberFormat)
}

fn field_int(field: Option<&str>) -> Result<i32, ParseError> {
    field
        .and_then(parse_leading_int)
        .ok_or(ParseError::NumberFormat)
}

fn count_fields(payload: &str) -> u8 {
    payload.split(',').count().min(u8::MAX as usize) as u8
}

/// Shutter state record: `SES,<position>,<range>,<open>,<closed>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShutterReport {
    /// Shutter step position
    pub position: i32,
    /// Shutter travel in steps
    pub range: i32,
    /// Open limit switch active
    pub open_sensor: bool,
    /// Closed limit switch active
    pub closed_sensor: bool,
}

impl ShutterReport {
    /// Reply tag
    pub const TAG: &'static str = "SES";

    /// Parse a shutter state payload
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        let found = count_fields(payload);
        if found < 5 {
            return Err(ParseError::FieldCount { expected: 5, found });
        }

        let mut fields = payload.split(',');
        let tag = fields.next().unwrap_or("");
        if !tag.contains(Self::TAG) {
            return Err(ParseError::MissingTag);
        }

        Ok(Self {
            position: field_int(fields.next())?,
            range: field_int(fields.next())?,
            open_sensor: field_int(fields.next())? != 0,
            closed_sensor: field_int(fields.next())? != 0,
        })
    }
}

/// Rotator status record: `SER,<position>,<at home>,<steps per rev>,...`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// Rotator step position
    pub position: i32,
    /// Home sensor active
    pub at_home: bool,
    /// Steps per revolution, when the firmware reports it
    pub steps_per_rev: Option<i32>,
}

impl StatusReport {
    /// Reply tag
    pub const TAG: &'static str = "SER";

    /// Parse a rotator status payload
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        let found = count_fields(payload);
        if found < 3 {
            return Err(ParseError::FieldCount { expected: 3, found });
        }

        let mut fields = payload.split(',');
        let tag = fields.next().unwrap_or("");
        if !tag.contains(Self::TAG) {
            return Err(ParseError::MissingTag);
        }

        let position = field_int(fields.next())?;
        let at_home = fields.next().map(str::trim) == Some("1");
        let steps_per_rev = fields.next().and_then(parse_leading_int);

        Ok(Self {
            position,
            at_home,
            steps_per_rev,
        })
    }
}

/// Controller firmware version
///
/// `3.1.0` reads as 3.10: the fields after the first dot are concatenated
/// into the fractional part. That keeps `1.10` above `1.9`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    text: String<VERSION_CAPACITY>,
    number: f32,
}

impl FirmwareVersion {
    /// Parse the payload of a firmware version reply (`FR3.1.0`)
    pub fn parse(payload: &str) -> Result<Self, ParseError> {
        let start = payload.find(FIRMWARE_TAG).ok_or(ParseError::MissingTag)?;
        let text = payload
            .get(start + FIRMWARE_TAG.len()..)
            .unwrap_or("")
            .trim();

        let mut parts = text.split('.');
        let major = parts.next().unwrap_or("");
        let mut joined: String<VERSION_CAPACITY> = String::new();
        write!(joined, "{}.", major).map_err(|_| ParseError::NumberFormat)?;
        for part in parts {
            joined
                .push_str(part)
                .map_err(|_| ParseError::NumberFormat)?;
        }

        let number = parse_leading_float(&joined).ok_or(ParseError::NumberFormat)?;

        let mut stored = String::new();
        let keep = text.len().min(VERSION_CAPACITY);
        stored
            .push_str(text.get(..keep).unwrap_or(""))
            .map_err(|_| ParseError::NumberFormat)?;

        Ok(Self {
            text: stored,
            number,
        })
    }

    /// Version as reported, e.g. `3.1.0`
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric version used for capability checks
    pub fn number(&self) -> f32 {
        self.number
    }

    /// Whether this version is at least `minimum`
    pub fn at_least(&self, minimum: f32) -> bool {
        self.number >= minimum
    }
}

/// Parse the leading `[-]digits[.digits]` of `text`
fn parse_leading_float(text: &str) -> Option<f32> {
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let number = text[..end].trim_end_matches('.');
    if number.is_empty() || number == "-" {
        return None;
    }
    number.parse::<f32>().ok()
}
