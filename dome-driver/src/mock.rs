//! Scripted serial port, clock and delay for host tests, and a dome rig
//! built on them

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use dome_core::log::{LogSink, NullLog};
use dome_core::{DomeConfig, VariantKind};
use dome_hal::{Clock, ErrorType, SerialConfig, SerialPort, SerialRx, SerialTx};
use embedded_hal::delay::DelayNs;

use crate::dome::Dome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Io,
}

#[derive(Default)]
struct Inner {
    open: bool,
    port_name: String,
    written: Vec<String>,
    rx: VecDeque<u8>,
    replies: Vec<(String, Vec<u8>)>,
    once: VecDeque<(String, Vec<u8>)>,
    fail_reads: bool,
    fail_close: bool,
    purges: usize,
}

/// Serial port answering commands from a script
///
/// Clones share the same script, so a test keeps a handle after moving the
/// port into a driver.
#[derive(Clone, Default)]
pub struct MockPort {
    inner: Rc<RefCell<Inner>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `command` (e.g. `@PRR`) with `reply`
    pub fn reply(&self, command: &str, reply: &str) -> &Self {
        let mut inner = self.inner.borrow_mut();
        inner.replies.retain(|(cmd, _)| cmd != command);
        inner
            .replies
            .push((command.to_string(), reply.as_bytes().to_vec()));
        self
    }

    /// Answer the next `command` with `reply`, ahead of any standing reply
    pub fn reply_once(&self, command: &str, reply: &str) -> &Self {
        self.inner
            .borrow_mut()
            .once
            .push_back((command.to_string(), reply.as_bytes().to_vec()));
        self
    }

    /// Stop answering `command`
    pub fn silence(&self, command: &str) {
        self.inner
            .borrow_mut()
            .replies
            .retain(|(cmd, _)| cmd != command);
    }

    /// Queue unsolicited bytes
    pub fn push_rx(&self, bytes: &str) {
        self.inner.borrow_mut().rx.extend(bytes.as_bytes());
    }

    pub fn fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn fail_close(&self, fail: bool) {
        self.inner.borrow_mut().fail_close = fail;
    }

    /// Commands written so far, terminators stripped
    pub fn written(&self) -> Vec<String> {
        self.inner.borrow().written.clone()
    }

    pub fn clear_written(&self) {
        self.inner.borrow_mut().written.clear();
    }

    pub fn count(&self, command: &str) -> usize {
        self.inner
            .borrow()
            .written
            .iter()
            .filter(|w| w.as_str() == command)
            .count()
    }

    pub fn is_port_open(&self) -> bool {
        self.inner.borrow().open
    }

    pub fn port_name(&self) -> String {
        self.inner.borrow().port_name.clone()
    }

    pub fn purges(&self) -> usize {
        self.inner.borrow().purges
    }

    pub fn pending_rx(&self) -> usize {
        self.inner.borrow().rx.len()
    }
}

impl ErrorType for MockPort {
    type Error = MockError;
}

impl SerialTx for MockPort {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), MockError> {
        let mut inner = self.inner.borrow_mut();
        let line = String::from_utf8_lossy(data).trim_end().to_string();
        let mnemonic = line.split(',').next().unwrap_or("").to_string();
        inner.written.push(line);

        let once = inner.once.iter().position(|(cmd, _)| *cmd == mnemonic);
        let reply = match once {
            Some(index) => inner.once.remove(index).map(|(_, reply)| reply),
            None => inner
                .replies
                .iter()
                .find(|(cmd, _)| *cmd == mnemonic)
                .map(|(_, reply)| reply.clone()),
        };
        if let Some(reply) = reply {
            inner.rx.extend(reply);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockError> {
        Ok(())
    }
}

impl SerialRx for MockPort {
    fn read_byte(&mut self, _timeout_ms: u32) -> Result<Option<u8>, MockError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_reads {
            return Err(MockError::Io);
        }
        Ok(inner.rx.pop_front())
    }

    fn bytes_waiting(&mut self) -> Result<usize, MockError> {
        Ok(self.inner.borrow().rx.len())
    }
}

impl SerialPort for MockPort {
    fn open(&mut self, port: &str, _config: &SerialConfig) -> Result<(), MockError> {
        let mut inner = self.inner.borrow_mut();
        inner.open = true;
        inner.port_name = port.to_string();
        Ok(())
    }

    fn close(&mut self) -> Result<(), MockError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_close {
            return Err(MockError::Io);
        }
        inner.open = false;
        Ok(())
    }

    fn purge(&mut self) -> Result<(), MockError> {
        let mut inner = self.inner.borrow_mut();
        inner.rx.clear();
        inner.purges += 1;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.borrow().open
    }
}

/// Millisecond clock advanced only by [`MockDelay`] or by hand
#[derive(Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    /// A delay that moves this clock forward
    pub fn delay(&self) -> MockDelay {
        MockDelay {
            now: self.now.clone(),
            sleeps: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Records every sleep and advances the shared clock
#[derive(Clone)]
pub struct MockDelay {
    now: Rc<Cell<u64>>,
    sleeps: Rc<RefCell<Vec<u32>>>,
}

impl MockDelay {
    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }

    pub fn clear(&self) {
        self.sleeps.borrow_mut().clear();
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_us(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ms(us / 1000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.sleeps.borrow_mut().push(ms);
        self.now.set(self.now.get() + u64::from(ms));
    }
}

pub const PORT: &str = "/dev/ttyUSB0";
/// Rotator status with the home sensor active
pub const AT_HOME: &str = ":SER,0,1,55080,0,300#\n";
/// Rotator status away from home
pub const AWAY: &str = ":SER,100,0,55080,0,300#\n";
pub const CLOSED: &str = ":SES,0,46000,0,1#\n";
pub const OPEN: &str = ":SES,46000,46000,1,0#\n";

/// A controller wired to a scripted port, plus handles on the port and delay
pub struct Rig<L: LogSink = NullLog> {
    pub port: MockPort,
    pub delay: MockDelay,
    pub dome: Dome<MockPort, MockClock, MockDelay, L>,
}

impl<L: LogSink> Rig<L> {
    /// Motor comes to rest and the controller relays its status record
    pub fn stop(&self, status: &str) {
        self.port.push_rx(status);
    }
}

/// Standing replies of a 55080 step dome with a closed shutter
pub fn script(port: &MockPort, config: &DomeConfig) {
    let firmware = match config.variant {
        VariantKind::Legacy => ":FR1.12#\n",
        VariantKind::V3 => ":FR3.1.0#\n",
    };
    port.reply("@FRR", firmware)
        .reply("@RRR", ":RRR55080#\n")
        .reply("@RRS", ":RRS46000#\n")
        .reply("@HRR", ":HRR0#\n")
        .reply("@SRS", CLOSED)
        .reply("@DRR", ":DRR300#\n")
        .reply("@SRR", AWAY);
    for ack in [
        "@GAR", "@GHR", "@PWR", "@SWR", "@SWS", "@OPS", "@CLS", "@RWR", "@HWR", "@DWR",
        "@ZWR", "@ZWS", "@ZRR", "@ZRS", "@ZDR", "@ZDS",
    ] {
        port.reply(ack, &std::format!(":{}#\n", &ack[1..]));
    }
}

pub fn rig_with_log<L: LogSink>(config: DomeConfig, log: L) -> Rig<L> {
    let port = MockPort::new();
    let clock = MockClock::new();
    let delay = clock.delay();
    script(&port, &config);
    let dome = Dome::with_log(port.clone(), clock, delay.clone(), config, log);
    Rig { port, delay, dome }
}

pub fn rig(config: DomeConfig) -> Rig {
    rig_with_log(config, NullLog)
}

/// Connected rig with the connect traffic cleared
pub fn connected(config: DomeConfig) -> Rig {
    let mut rig = rig(config);
    rig.dome.connect(PORT).unwrap();
    rig.port.clear_written();
    rig.delay.clear();
    rig
}

pub fn v3() -> Rig {
    connected(DomeConfig::default())
}

pub fn legacy() -> Rig {
    connected(DomeConfig {
        variant: VariantKind::Legacy,
        ..DomeConfig::default()
    })
}
