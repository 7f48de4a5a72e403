use std::fmt::{Display, Formatter};

use log::info;

use crate::animations::StopToken;
use crate::devices::{set_brightness, PwmChannel};
use crate::utils::{Delay, DutyCycle};

/// Number of distinct ramp positions: 0 to 100 included.
pub const RAMP_STEPS: u8 = 101;

/// Default pause between two ramp steps (in ms): a full ramp lasts 101 x 50ms ~ 5s.
pub const RAMP_INTERVAL: u64 = 50;

/// Current position in the ramp cycle: a counter within `[0, 100]`.
///
/// The counter wraps from 100 back to 0, so 101 successive [`RampState::next`] calls bring it
/// back where it started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RampState(u8);

impl RampState {
    /// Creates a ramp state (reduced modulo 101).
    pub fn new(value: u8) -> Self {
        Self(value % RAMP_STEPS)
    }

    /// Returns the counter value.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the following state: `(s + 1) mod 101`.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % RAMP_STEPS)
    }
}

impl Display for RampState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a brightness ramp: applies the [`RampState`] as duty cycle, waits, then advances.
///
/// # Example
/// ```
/// use led_ramp::animations::{Ramp, StopToken};
/// use led_ramp::devices::setup;
/// use led_ramp::hardware::Board;
/// use led_ramp::utils::BlockingDelay;
///
/// let board = Board::default().open().unwrap();
/// let mut channel = setup(&board).unwrap();
///
/// // Runs until someone raises the token (here: right away).
/// let stop = StopToken::default();
/// stop.stop();
/// Ramp::default().run_until(&mut channel, &mut BlockingDelay, &stop);
/// ```
#[derive(Clone, Debug)]
pub struct Ramp {
    /// The current position in the cycle.
    state: RampState,
    /// The pause between two steps (in ms).
    interval: u64,
}

impl Default for Ramp {
    fn default() -> Self {
        Self {
            state: RampState::default(),
            interval: RAMP_INTERVAL,
        }
    }
}

impl Ramp {
    /// Sets the pause between two steps (in ms).
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the position the ramp starts from.
    pub fn with_state(mut self, state: RampState) -> Self {
        self.state = state;
        self
    }

    /// Returns the current position in the cycle.
    pub fn get_state(&self) -> RampState {
        self.state
    }

    /// Returns the pause between two steps (in ms).
    pub fn get_interval(&self) -> u64 {
        self.interval
    }

    /// Returns the duration of a full cycle (in ms).
    pub fn get_period(&self) -> u64 {
        self.interval * u64::from(RAMP_STEPS)
    }

    /// Runs a single iteration: apply the state, wait, advance.
    ///
    /// The duty is written every time, even when it did not change.
    pub fn step<D: Delay>(&mut self, channel: &mut PwmChannel, delay: &mut D) -> DutyCycle {
        let applied = set_brightness(channel, self.state.value());
        delay.delay_ms(self.interval);
        self.state = self.state.next();
        applied
    }

    /// Runs iterations until `stop` is raised. The token is checked once per iteration, before
    /// the duty is applied.
    ///
    /// Returns the number of iterations run.
    pub fn run_until<D: Delay>(
        &mut self,
        channel: &mut PwmChannel,
        delay: &mut D,
        stop: &StopToken,
    ) -> usize {
        info!("Ramp started on {}", channel);
        let mut iterations = 0;
        while !stop.is_stopped() {
            self.step(channel, delay);
            iterations += 1;
        }
        info!("Ramp stopped after {} steps at state {}", iterations, self.state);
        iterations
    }
}

/// Ramps the brightness of `channel` from 0 to 100% over and over, starting from 0.
///
/// This never returns: only the termination of the process stops it.
/// Use [`run_until`] for a loop that can be stopped.
pub fn run_forever<D: Delay>(channel: &mut PwmChannel, delay: &mut D) -> ! {
    let mut ramp = Ramp::default();
    info!("Ramp started on {}", channel);
    loop {
        ramp.step(channel, delay);
    }
}

/// Ramps the brightness of `channel` from 0 to 100% over and over, starting from 0, until `stop`
/// is raised.
pub fn run_until<D: Delay>(channel: &mut PwmChannel, delay: &mut D, stop: &StopToken) -> usize {
    Ramp::default().run_until(channel, delay, stop)
}
