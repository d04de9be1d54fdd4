//! Command exchange over the serial link
//!
//! One command at a time: wait out the inter-command spacing, write, then
//! read lines until the reply carrying the expected tag shows up. Telemetry
//! read along the way is applied to the dome state in arrival order and
//! does not count as the reply.

use dome_core::log::{Level, LogSink};
use dome_core::{dome_log, DomeError, DomeState, ExchangeTiming, ProtocolVariant};
use dome_hal::{Clock, SerialConfig, SerialPort};
use dome_protocol::{Command, FrameError, Line, LineReader, Response};
use embedded_hal::delay::DelayNs;

const SCOPE: &str = "exchange";

/// Failure to produce a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// Timed out, with or without a partial line
    Frame(FrameError),
    /// The port itself failed
    Transport(E),
}

/// Serial link with command pacing and reply matching
pub struct Exchanger<P, C, D, L> {
    port: P,
    clock: C,
    delay: D,
    pub(crate) log: L,
    timing: ExchangeTiming,
    reader: LineReader,
    last_command_ms: Option<u64>,
}

impl<P, C, D, L> Exchanger<P, C, D, L>
where
    P: SerialPort,
    C: Clock,
    D: DelayNs,
    L: LogSink,
{
    /// Create an exchanger over an unopened port
    pub fn new(port: P, clock: C, delay: D, log: L, timing: ExchangeTiming) -> Self {
        Self {
            port,
            clock,
            delay,
            log,
            timing,
            reader: LineReader::new(),
            last_command_ms: None,
        }
    }

    /// Open the port and forget any previous session
    pub fn open(&mut self, port: &str, config: &SerialConfig) -> Result<(), P::Error> {
        self.reader.reset();
        self.last_command_ms = None;
        self.port.open(port, config)
    }

    /// Drop pending bytes on both sides and close the port
    pub fn close(&mut self) -> Result<(), P::Error> {
        self.reader.reset();
        self.port.purge()?;
        self.port.close()
    }

    /// Whether the underlying port is open
    pub fn is_open(&self) -> bool {
        self.port.is_open()
    }

    /// Blocking sleep
    pub fn sleep_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub fn timing(&self) -> &ExchangeTiming {
        &self.timing
    }

    /// Read one line, waiting at most `timeout_ms` per byte
    ///
    /// Bytes of an interrupted line are kept for the next call.
    pub fn read_line(&mut self, timeout_ms: u32) -> Result<Line, LinkError<P::Error>> {
        loop {
            match self.port.read_byte(timeout_ms).map_err(LinkError::Transport)? {
                Some(byte) => {
                    if let Some(line) = self.reader.feed(byte) {
                        return Ok(line);
                    }
                }
                None if self.reader.has_partial() => {
                    return Err(LinkError::Frame(FrameError::Stalled));
                }
                None => return Err(LinkError::Frame(FrameError::NoData)),
            }
        }
    }

    /// Sleep whatever is left of the inter-command spacing
    fn pace(&mut self) {
        let Some(last) = self.last_command_ms else {
            return;
        };
        let spacing = u64::from(self.timing.inter_command_delay_ms);
        let elapsed = self.clock.elapsed_since(last);
        if elapsed < spacing {
            // Bounded by the u32 spacing, cannot truncate.
            self.delay.delay_ms((spacing - elapsed) as u32);
        }
    }

    /// Write a command without waiting for anything
    pub fn send(&mut self, command: Command) -> Result<(), P::Error> {
        self.pace();
        let line = command.encode();
        dome_log!(self.log, Level::Debug, SCOPE, "tx {}", line.trim_end());
        let result = self
            .port
            .write_blocking(line.as_bytes())
            .and_then(|()| self.port.flush());
        self.last_command_ms = Some(self.clock.now_ms());
        result
    }

    /// Send `command` and wait for the reply containing `expected_tag`
    ///
    /// `None` accepts the first reply of any kind. Replies carrying another
    /// tag are skipped, at most `max_skips` of them. May block for roughly
    /// `(max_rx_timeouts + 1) * read_timeout_ms` when the controller is
    /// silent.
    pub fn execute<V: ProtocolVariant + ?Sized>(
        &mut self,
        command: Command,
        expected_tag: Option<&str>,
        max_skips: u8,
        state: &mut DomeState,
        variant: &V,
    ) -> Result<Line, DomeError<P::Error>> {
        self.send(command).map_err(DomeError::Transport)?;

        let mut rx_timeouts: u8 = 0;
        let mut skipped: u8 = 0;
        let mut side_frames: u16 = 0;

        loop {
            if rx_timeouts > self.timing.max_rx_timeouts {
                dome_log!(
                    self.log,
                    Level::Warn,
                    SCOPE,
                    "{}: no reply after {} empty reads",
                    command.mnemonic(),
                    rx_timeouts
                );
                return Err(DomeError::ReceiveTimeout);
            }

            let line = match self.read_line(self.timing.read_timeout_ms) {
                Ok(line) => line,
                Err(LinkError::Transport(e)) => return Err(DomeError::Transport(e)),
                Err(LinkError::Frame(kind)) => {
                    dome_log!(self.log, Level::Trace, SCOPE, "rx timeout ({:?})", kind);
                    self.delay.delay_ms(self.timing.no_data_backoff_ms);
                    rx_timeouts += 1;
                    continue;
                }
            };
            dome_log!(self.log, Level::Trace, SCOPE, "rx {}", line.as_str());

            match Response::classify(&line) {
                Response::Reply(payload) => {
                    if expected_tag.map_or(true, |tag| payload.contains(tag)) {
                        let mut reply = Line::new();
                        // A payload is a slice of a line, so it fits.
                        let _ = reply.push_str(payload);
                        return Ok(reply);
                    }

                    state.note_motion_report(payload);
                    skipped = skipped.saturating_add(1);
                    dome_log!(
                        self.log,
                        Level::Debug,
                        SCOPE,
                        "{}: skipping reply {}",
                        command.mnemonic(),
                        payload
                    );
                    if skipped > max_skips {
                        dome_log!(
                            self.log,
                            Level::Warn,
                            SCOPE,
                            "{}: expected tag never arrived",
                            command.mnemonic()
                        );
                        return Err(DomeError::ReceiveTimeout);
                    }
                }
                Response::Telemetry(telemetry) => {
                    state.apply_telemetry(telemetry, variant);
                    side_frames = side_frames.saturating_add(1);
                }
                Response::MotorStopped | Response::Ignored => {
                    side_frames = side_frames.saturating_add(1);
                }
            }

            if side_frames > self.timing.max_telemetry_frames {
                dome_log!(
                    self.log,
                    Level::Warn,
                    SCOPE,
                    "{}: reply buried under telemetry",
                    command.mnemonic()
                );
                return Err(DomeError::ReceiveTimeout);
            }
        }
    }

    /// Consume every line already waiting on the link
    ///
    /// Telemetry is applied; a `SER`/`SES` status record marks the end of a
    /// move. Returns the number of lines consumed.
    pub fn drain<V: ProtocolVariant + ?Sized>(
        &mut self,
        state: &mut DomeState,
        variant: &V,
    ) -> Result<usize, DomeError<P::Error>> {
        let mut lines = 0;
        while self.port.bytes_waiting().map_err(DomeError::Transport)? > 0 {
            let line = match self.read_line(self.timing.poll_read_timeout_ms) {
                Ok(line) => line,
                Err(LinkError::Transport(e)) => return Err(DomeError::Transport(e)),
                // Rest of the line arrives later; keep it buffered.
                Err(LinkError::Frame(_)) => break,
            };
            lines += 1;
            dome_log!(self.log, Level::Trace, SCOPE, "async {}", line.as_str());

            match Response::classify(&line) {
                Response::Reply(payload) => {
                    if state.note_motion_report(payload) {
                        dome_log!(self.log, Level::Debug, SCOPE, "motion ended: {}", payload);
                    }
                }
                Response::Telemetry(telemetry) => {
                    let level = if telemetry.is_motion() {
                        Level::Trace
                    } else {
                        Level::Debug
                    };
                    dome_log!(self.log, level, SCOPE, "telemetry {:?}", telemetry);
                    state.apply_telemetry(telemetry, variant);
                }
                Response::MotorStopped | Response::Ignored => {}
            }
        }
        Ok(lines)
    }
}
