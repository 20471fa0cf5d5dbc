use core::slice;
use embedded_hal::blocking::delay::DelayMs;
use log::{debug, trace, warn};

use crate::config::Config;
use crate::control::LineCoding;
use crate::error::{Error, Result};
use crate::link::{CdcDriver, Endpoint, Link};
use crate::time::Clock;

/// Blocking byte transport over an interrupt-driven USB CDC driver.
///
/// Inbound bytes are pushed into the [`Link`]'s ring buffer by the driver's receive interrupt and
/// pulled out by [`read`](Self::read). Outbound bytes go straight to the driver and
/// [`write`](Self::write) waits for the transmit-complete interrupt. Both calls poll with short
/// sleeps and are bounded by a timeout measured from entry.
pub struct Transport<'a, D, C, T, const N: usize> {
    endpoint: Endpoint<'a, N>,
    driver: D,
    clock: C,
    delay: T,
    config: Config,
    registered: bool,
    open: bool,
    overrun_seen: usize,
}

impl<'a, D, C, T, const N: usize> Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    /// Creates a closed transport with the default configuration over the link claimed by
    /// `endpoint` (see [`Link::split`]).
    pub fn new(endpoint: Endpoint<'a, N>, driver: D, clock: C, delay: T) -> Self {
        Self::with_config(endpoint, driver, clock, delay, Config::default())
    }

    pub fn with_config(
        endpoint: Endpoint<'a, N>,
        driver: D,
        clock: C,
        delay: T,
        config: Config,
    ) -> Self {
        let overrun_seen = endpoint.link().rx().overrun_bytes();
        Transport {
            endpoint,
            driver,
            clock,
            delay,
            config,
            registered: false,
            open: false,
            overrun_seen,
        }
    }

    /// Opens the transport. The driver callbacks are registered on the first call only.
    pub fn open(&mut self) -> bool {
        if !self.registered {
            self.driver.register(self.endpoint.hooks());
            self.registered = true;
            debug!("transport callbacks registered");
        }

        self.open = true;
        true
    }

    /// Closes the transport, dropping unread bytes and any pending completion signal. The driver
    /// keeps the callbacks; a later [`open`](Self::open) resumes without registering again.
    pub fn close(&mut self) -> bool {
        let dropped = self.link().rx().len();
        self.link().rx().discard();
        self.link().completion().clear();
        self.open = false;

        debug!("transport closed, {} unread bytes discarded", dropped);
        true
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Reads up to `buf.len()` bytes, waiting at most `timeout_ms` for the first one to arrive.
    ///
    /// Returns the number of bytes copied. Fewer bytes than requested, including zero, is a normal
    /// result. A closed transport reads nothing.
    pub fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> usize {
        self.try_read(buf, timeout_ms).unwrap_or(0)
    }

    /// Like [`read`](Self::read) but reports a closed transport as [`Error::Closed`].
    pub fn try_read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        if !self.open {
            return Err(Error::Closed);
        }

        if buf.is_empty() {
            return Ok(0);
        }

        let start = self.clock.now_ms();
        let count = loop {
            let count = self.link().rx().read_into(buf);
            if count > 0 || self.elapsed_ms(start) >= u64::from(timeout_ms) {
                break count;
            }

            self.delay.delay_ms(self.config.poll_interval_ms);
        };

        self.check_overrun();
        trace!("read {} of {} bytes", count, buf.len());
        Ok(count)
    }

    /// Sends `data` as one unit and waits at most `timeout_ms` for the driver to report completion.
    ///
    /// Returns `data.len()` on completion and 0 otherwise, whether the driver refused the data or
    /// the completion did not arrive in time. Use [`try_write`](Self::try_write) to tell these
    /// apart.
    pub fn write(&mut self, data: &[u8], timeout_ms: u32) -> usize {
        self.try_write(data, timeout_ms).unwrap_or(0)
    }

    /// Like [`write`](Self::write) but reports why nothing was written.
    pub fn try_write(&mut self, data: &[u8], timeout_ms: u32) -> Result<usize> {
        if !self.open {
            return Err(Error::Closed);
        }

        if data.is_empty() {
            return Ok(0);
        }

        let link = self.link();
        let completion = link.completion();

        // A send that timed out earlier may still complete; that signal is not ours.
        completion.clear();

        if let Err(err) = self.driver.send(data) {
            warn!("driver rejected {} byte send: {:?}", data.len(), err);
            return Err(Error::Rejected(err));
        }

        let start = self.clock.now_ms();
        while !completion.is_set() && self.elapsed_ms(start) < u64::from(timeout_ms) {
            self.delay.delay_ms(self.config.poll_interval_ms);
        }

        let done = completion.is_set();
        completion.clear();

        if done {
            trace!("wrote {} bytes", data.len());
            Ok(data.len())
        } else {
            warn!("send of {} bytes not completed within {} ms", data.len(), timeout_ms);
            Err(Error::Timeout)
        }
    }

    /// Number of unread bytes in the receive buffer.
    pub fn available(&self) -> usize {
        self.link().rx().len()
    }

    /// Total number of inbound bytes dropped because the receive buffer was full.
    pub fn overrun_bytes(&self) -> usize {
        self.link().rx().overrun_bytes()
    }

    /// Gets the line coding last set by the host.
    pub fn line_coding(&self) -> LineCoding {
        self.link().control().line_coding()
    }

    /// Gets the DTR (data terminal ready) state
    pub fn dtr(&self) -> bool {
        self.link().control().dtr()
    }

    /// Gets the RTS (ready to send) state
    pub fn rts(&self) -> bool {
        self.link().control().rts()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn link(&self) -> &'a Link<N> {
        self.endpoint.link()
    }

    fn elapsed_ms(&self, start: u64) -> u64 {
        self.clock.now_ms().saturating_sub(start)
    }

    fn check_overrun(&mut self) {
        let total = self.link().rx().overrun_bytes();
        if total != self.overrun_seen {
            warn!(
                "receive buffer overrun: {} bytes dropped",
                total.wrapping_sub(self.overrun_seen)
            );
            self.overrun_seen = total;
        }
    }
}

impl<'a, D, C, T, const N: usize> embedded_hal::serial::Write<u8> for Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    type Error = Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        let timeout_ms = self.config.write_timeout_ms;
        match self.try_write(slice::from_ref(&word), timeout_ms) {
            Ok(_) => Ok(()),
            Err(err) => Err(nb::Error::Other(err)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        // every write already waited for its completion
        Ok(())
    }
}

impl<'a, D, C, T, const N: usize> embedded_hal::serial::Read<u8> for Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let mut byte: u8 = 0;

        match self.try_read(slice::from_mut(&mut byte), 0) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(byte),
            Err(err) => Err(nb::Error::Other(err)),
        }
    }
}
