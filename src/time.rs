/// Monotonic millisecond time source used to bound blocking calls.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed point. Must never go backwards.
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

#[cfg(any(test, feature = "std"))]
pub use self::host::{StdClock, StdDelay};

#[cfg(any(test, feature = "std"))]
mod host {
    use super::Clock;
    use embedded_hal::blocking::delay::DelayMs;
    use std::thread;
    use std::time::{Duration, Instant};

    /// [`Clock`] backed by [`Instant`], counting from its creation.
    #[derive(Clone, Copy, Debug)]
    pub struct StdClock {
        origin: Instant,
    }

    impl StdClock {
        pub fn new() -> Self {
            StdClock {
                origin: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        fn now_ms(&self) -> u64 {
            self.origin.elapsed().as_millis() as u64
        }
    }

    /// Delay that puts the current thread to sleep.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct StdDelay;

    impl DelayMs<u32> for StdDelay {
        fn delay_ms(&mut self, ms: u32) {
            thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}
