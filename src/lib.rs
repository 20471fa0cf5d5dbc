//! Blocking byte transport over an interrupt-driven USB CDC-ACM serial interface.
//!
//! A USB device driver delivers received packets and transmit-complete events from interrupt
//! context. A middleware client, such as a small pub/sub client stack on a microcontroller, wants
//! plain blocking `read` and `write` calls with timeouts instead. This crate sits between the two:
//!
//! * [`Link`] holds the state shared with the interrupt handlers: a lock-free single-producer,
//!   single-consumer [`RingBuffer`] for inbound bytes, the transmit completion flag and the CDC
//!   control state (line coding, DTR/RTS). It is usually placed in a `static`.
//! * [`Transport`] is the client side. It is built from the one [`Endpoint`] that
//!   [`Link::split`] hands out, so each link has a single transport. [`Transport::open`] hands the
//!   driver a [`Hooks`] table once, [`Transport::read`] drains the ring buffer and
//!   [`Transport::write`] sends a chunk and waits for its completion.
//!
//! Both blocking calls poll with short sleeps and give up after their timeout. A read that finds
//! nothing returns 0; a write that is refused or not completed in time returns 0, and
//! [`Transport::try_write`] tells the two cases apart. When inbound data arrives faster than it is
//! read, the newest bytes are dropped and counted, see [`Transport::overrun_bytes`].
//!
//! Example
//! =======
//!
//! The driver side is hardware specific; it only has to implement [`CdcDriver`]:
//!
//! ```no_run
//! # use usbd_serial_transport::{CdcDriver, Clock, Hooks, Link, Transport, DEFAULT_CAPACITY};
//! # struct Driver;
//! # impl CdcDriver<'static> for Driver {
//! #     fn register(&mut self, _hooks: Hooks<'static>) {}
//! #     fn send(&mut self, _data: &[u8]) -> usb_device::Result<()> { Ok(()) }
//! # }
//! # struct Millis;
//! # impl Clock for Millis { fn now_ms(&self) -> u64 { 0 } }
//! # struct Delay;
//! # impl embedded_hal::blocking::delay::DelayMs<u32> for Delay {
//! #     fn delay_ms(&mut self, _ms: u32) {}
//! # }
//! static LINK: Link<DEFAULT_CAPACITY> = Link::new();
//!
//! let endpoint = LINK.split().unwrap();
//! let mut transport = Transport::new(endpoint, Driver, Millis, Delay);
//! transport.open();
//!
//! let mut buf = [0u8; 64];
//! let count = transport.read(&mut buf, 10);
//! // count bytes were read to &buf[..count]
//!
//! let written = transport.write(&buf[..count], 100);
//! // 0 if the driver refused the data or did not finish in time
//! ```

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

mod config;
pub mod control;
mod error;
mod io;
mod link;
mod ring;
mod time;
mod transport;

#[cfg(test)]
mod mock;

pub use crate::config::*;
pub use crate::control::{LineCoding, ParityType, StopBits};
pub use crate::error::{Error, Result};
pub use crate::link::{CdcDriver, Endpoint, Hooks, Link, DEFAULT_CAPACITY};
pub use crate::ring::RingBuffer;
pub use crate::time::Clock;
#[cfg(feature = "std")]
pub use crate::time::{StdClock, StdDelay};
pub use crate::transport::Transport;
pub use embedded_io;
pub use usb_device::UsbError;
