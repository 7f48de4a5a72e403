use crate::animations::StopToken;
use crate::utils::Delay;

/// Mock implementation of [`Delay`]: records the requested delays without sleeping.
///
/// It can also raise a [`StopToken`] once a given number of delays has been requested, which
/// bounds an otherwise endless loop.
#[derive(Clone, Debug, Default)]
pub struct MockDelay {
    /// All requested delays (in ms), in order.
    pub calls: Vec<u64>,
    stop_after: Option<(usize, StopToken)>,
}

impl MockDelay {
    /// Creates a mock delay that raises `token` on the `count`-th call.
    pub fn stopping_after(count: usize, token: &StopToken) -> Self {
        Self {
            calls: vec![],
            stop_after: Some((count, token.clone())),
        }
    }

    /// Total requested delay (in ms).
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().sum()
    }
}

impl Delay for MockDelay {
    fn delay_ms(&mut self, ms: u64) {
        self.calls.push(ms);
        if let Some((count, token)) = &self.stop_after {
            if self.calls.len() >= *count {
                token.stop();
            }
        }
    }
}
