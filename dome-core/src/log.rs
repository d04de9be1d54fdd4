//! Injected logging sink
//!
//! The core never decides where diagnostics go. Each dome instance holds a
//! [`LogSink`]; [`NullLog`] drops everything, [`DefmtLog`] forwards to
//! `defmt` on targets that have a defmt transport.

use core::fmt;

/// Log record severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Destination for structured log records
pub trait LogSink {
    /// Record one message from `scope`
    fn log(&mut self, level: Level, scope: &'static str, args: fmt::Arguments<'_>);

    /// Lowest level this sink wants; cheaper callers can skip formatting
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }
}

impl<T: LogSink + ?Sized> LogSink for &mut T {
    fn log(&mut self, level: Level, scope: &'static str, args: fmt::Arguments<'_>) {
        (**self).log(level, scope, args)
    }

    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl LogSink for NullLog {
    fn log(&mut self, _level: Level, _scope: &'static str, _args: fmt::Arguments<'_>) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

/// Sink forwarding to `defmt`
#[cfg(feature = "defmt")]
#[derive(Debug, Clone, Copy)]
pub struct DefmtLog {
    /// Records below this level are dropped
    pub min_level: Level,
}

#[cfg(feature = "defmt")]
impl Default for DefmtLog {
    fn default() -> Self {
        Self {
            min_level: Level::Debug,
        }
    }
}

#[cfg(feature = "defmt")]
impl LogSink for DefmtLog {
    fn log(&mut self, level: Level, scope: &'static str, args: fmt::Arguments<'_>) {
        let message = defmt::Display2Format(&args);
        match level {
            Level::Trace => defmt::trace!("[{}] {}", scope, message),
            Level::Debug => defmt::debug!("[{}] {}", scope, message),
            Level::Info => defmt::info!("[{}] {}", scope, message),
            Level::Warn => defmt::warn!("[{}] {}", scope, message),
            Level::Error => defmt::error!("[{}] {}", scope, message),
        }
    }

    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }
}

/// Log through a sink, skipping the formatting when the level is disabled
#[macro_export]
macro_rules! dome_log {
    ($sink:expr, $level:expr, $scope:expr, $($arg:tt)+) => {{
        let level = $level;
        if $crate::log::LogSink::enabled(&$sink, level) {
            $crate::log::LogSink::log(&mut $sink, level, $scope, format_args!($($arg)+));
        }
    }};
}
