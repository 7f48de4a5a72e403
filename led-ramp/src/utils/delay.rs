//! Defines the blocking delay primitive used to pace the ramp.

/// Blocks the current thread for the given amount of milliseconds.
#[macro_export]
macro_rules! pause_sync {
    ($ms:expr) => {
        std::thread::sleep(std::time::Duration::from_millis($ms as u64))
    };
}

/// A blocking delay with millisecond granularity.
///
/// Nothing else runs on the calling thread while a delay is in progress.
pub trait Delay {
    /// Blocks for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u64);
}

/// [`Delay`] implementation sleeping the current thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockingDelay;

impl Delay for BlockingDelay {
    fn delay_ms(&mut self, ms: u64) {
        pause_sync!(ms);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn test_blocking_delay() {
        let start = Instant::now();
        BlockingDelay.delay_ms(50);
        let duration = start.elapsed().as_millis();
        assert!(
            duration >= 50,
            "Duration should be at least 50ms (found: {})",
            duration,
        );
    }

    #[test]
    fn test_zero_delay() {
        let start = Instant::now();
        BlockingDelay.delay_ms(0);
        assert!(start.elapsed().as_millis() < 50);
    }
}
