use embedded_hal::blocking::delay::DelayMs;

use crate::error::Error;
use crate::link::CdcDriver;
use crate::time::Clock;
use crate::transport::Transport;

impl<'a, D, C, T, const N: usize> embedded_io::ErrorType for Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    type Error = Error;
}

impl<'a, D, C, T, const N: usize> embedded_io::Read for Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let poll_ms = self.config().poll_interval_ms();
        loop {
            // We are required by `embedded-io` to keep waiting until at least one byte is read.
            match self.try_read(buf, poll_ms)? {
                0 => {}
                count => return Ok(count),
            }
        }
    }
}

impl<'a, D, C, T, const N: usize> embedded_io::ReadReady for Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if !self.is_open() {
            return Err(Error::Closed);
        }

        Ok(self.available() != 0)
    }
}

impl<'a, D, C, T, const N: usize> embedded_io::Write for Transport<'a, D, C, T, N>
where
    D: CdcDriver<'a>,
    C: Clock,
    T: DelayMs<u32>,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let timeout_ms = self.config().write_timeout_ms();
        self.try_write(buf, timeout_ms)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::Error;
    use crate::link::Link;
    use crate::mock::{manual_time, FakeDriver, SendMode};
    use crate::time::Clock;
    use crate::transport::Transport;
    use embedded_io::{Error as _, ErrorKind, Read, ReadReady, Write};
    use usb_device::UsbError;

    #[test]
    fn read_returns_available_bytes() {
        let link = Link::<8>::new();
        let (clock, delay, _) = manual_time();
        let driver = FakeDriver::new(SendMode::Complete);
        let mut t = Transport::new(link.split().unwrap(), driver, clock, delay);
        t.open();

        assert_eq!(t.read_ready(), Ok(false));
        t.driver().deliver(b"abc");
        assert_eq!(t.read_ready(), Ok(true));

        let mut buf = [0u8; 8];
        assert_eq!(Read::read(&mut t, &mut buf), Ok(3));
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(Read::read(&mut t, &mut []), Ok(0));
    }

    #[test]
    fn read_on_closed_transport_fails() {
        let link = Link::<8>::new();
        let (clock, delay, _) = manual_time();
        let driver = FakeDriver::new(SendMode::Complete);
        let mut t = Transport::new(link.split().unwrap(), driver, clock, delay);

        let mut buf = [0u8; 8];
        let err = Read::read(&mut t, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        assert_eq!(t.read_ready(), Err(Error::Closed));
    }

    #[test]
    fn write_uses_configured_timeout() {
        let link = Link::<8>::new();
        let (clock, delay, time) = manual_time();
        let config = Config::new().with_write_timeout_ms(30);
        let driver = FakeDriver::new(SendMode::Silent);
        let mut t = Transport::with_config(link.split().unwrap(), driver, clock, delay, config);
        t.open();

        let err = Write::write(&mut t, b"data").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        assert_eq!(time.now_ms(), 30);

        t.driver_mut().mode = SendMode::Complete;
        assert_eq!(Write::write(&mut t, b"data"), Ok(4));
        assert_eq!(t.flush(), Ok(()));
    }

    #[test]
    fn rejected_write_kind() {
        let link = Link::<8>::new();
        let (clock, delay, _) = manual_time();
        let driver = FakeDriver::new(SendMode::Reject(UsbError::EndpointOverflow));
        let mut t = Transport::new(link.split().unwrap(), driver, clock, delay);
        t.open();

        let err = Write::write(&mut t, b"data").unwrap_err();
        assert_eq!(err, Error::Rejected(UsbError::EndpointOverflow));
        assert_eq!(err.kind(), ErrorKind::OutOfMemory);
    }
}
