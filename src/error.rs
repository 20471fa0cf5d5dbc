use core::fmt;
use usb_device::UsbError;

/// Failure of a transport call. Absence of data is not an error: reads report it as a short or
/// zero count.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The transport is not open.
    Closed,

    /// The driver refused the transmission right away.
    Rejected(UsbError),

    /// The transmit-complete signal was not observed before the timeout.
    Timeout,
}

impl From<UsbError> for Error {
    fn from(e: UsbError) -> Self {
        Error::Rejected(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Closed => write!(f, "Transport is closed"),
            Error::Rejected(e) => write!(f, "Send rejected by driver: {:?}", e),
            Error::Timeout => write!(f, "Send not completed before timeout"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::Closed => embedded_io::ErrorKind::NotConnected,
            Error::Timeout => embedded_io::ErrorKind::TimedOut,
            Error::Rejected(UsbError::Unsupported) => embedded_io::ErrorKind::Unsupported,
            Error::Rejected(
                UsbError::BufferOverflow
                | UsbError::EndpointOverflow
                | UsbError::EndpointMemoryOverflow,
            ) => embedded_io::ErrorKind::OutOfMemory,
            Error::Rejected(_) => embedded_io::ErrorKind::Other,
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
