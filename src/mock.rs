//! Test doubles: a scripted driver and a clock that only moves when the transport sleeps.

use core::cell::Cell;
use embedded_hal::blocking::delay::DelayMs;
use std::rc::Rc;
use std::vec::Vec;
use usb_device::{Result, UsbError};

use crate::link::{CdcDriver, Hooks};
use crate::time::Clock;

#[derive(Clone, Copy, Debug)]
pub enum SendMode {
    /// Signals completion from inside `send`, like an interrupt firing before it returns.
    Complete,
    /// Accepts the data but never signals completion.
    Silent,
    Reject(UsbError),
}

pub struct FakeDriver<'a> {
    hooks: Option<Hooks<'a>>,
    pub mode: SendMode,
    pub registrations: usize,
    pub sends: usize,
    pub sent: Vec<u8>,
}

impl<'a> FakeDriver<'a> {
    pub fn new(mode: SendMode) -> Self {
        FakeDriver {
            hooks: None,
            mode,
            registrations: 0,
            sends: 0,
            sent: Vec::new(),
        }
    }

    pub fn hooks(&self) -> &Hooks<'a> {
        self.hooks.as_ref().expect("driver not registered")
    }

    pub fn take_hooks(&mut self) -> Hooks<'a> {
        self.hooks.take().expect("driver not registered")
    }

    pub fn deliver(&self, chunk: &[u8]) -> usize {
        self.hooks().receive(chunk, || {})
    }
}

impl<'a> CdcDriver<'a> for FakeDriver<'a> {
    fn register(&mut self, hooks: Hooks<'a>) {
        self.registrations += 1;
        self.hooks = Some(hooks);
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.sends += 1;

        match self.mode {
            SendMode::Reject(err) => Err(err),
            SendMode::Complete => {
                self.sent.extend_from_slice(data);
                if let Some(hooks) = &self.hooks {
                    hooks.transmit_complete();
                }
                Ok(())
            }
            SendMode::Silent => {
                self.sent.extend_from_slice(data);
                Ok(())
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    sleeps: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

pub struct ManualDelay(ManualClock);

impl DelayMs<u32> for ManualDelay {
    fn delay_ms(&mut self, ms: u32) {
        let clock = &self.0;
        clock.now.set(clock.now.get() + u64::from(ms));
        clock.sleeps.set(clock.sleeps.get() + 1);
    }
}

/// Returns a clock/delay pair plus a handle sharing the same time.
pub fn manual_time() -> (ManualClock, ManualDelay, ManualClock) {
    let clock = ManualClock::default();
    (clock.clone(), ManualDelay(clock.clone()), clock)
}
