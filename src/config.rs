/// Default time a write waits for the transmit-complete signal.
pub const DEFAULT_WRITE_TIMEOUT_MS: u32 = 100;

/// Default sleep between two polls of a blocking call.
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1;

/// Runtime settings of a [`Transport`](crate::Transport). The receive capacity is fixed at compile
/// time by the [`Link`](crate::Link) type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) write_timeout_ms: u32,
    pub(crate) poll_interval_ms: u32,
}

impl Config {
    pub const fn new() -> Self {
        Config {
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Timeout used by the `embedded-io` and `embedded-hal` write paths.
    pub fn with_write_timeout_ms(mut self, ms: u32) -> Self {
        self.write_timeout_ms = ms;
        self
    }

    /// Sleep between polls. Clamped to at least 1 ms.
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms.max(1);
        self
    }

    pub fn write_timeout_ms(&self) -> u32 {
        self.write_timeout_ms
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.write_timeout_ms(), 100);
        assert_eq!(config.poll_interval_ms(), 1);
    }

    #[test]
    fn poll_interval_is_clamped() {
        let config = Config::new().with_poll_interval_ms(0).with_write_timeout_ms(5);
        assert_eq!(config.poll_interval_ms(), 1);
        assert_eq!(config.write_timeout_ms(), 5);
    }
}
