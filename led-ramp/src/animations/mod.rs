//! Defines the brightness ramp: a periodic task walking the duty cycle from 0 to 100% and over
//! again, and the token used to stop it.

mod ramp;
mod stop;

pub use ramp::{run_forever, run_until, Ramp, RampState, RAMP_INTERVAL, RAMP_STEPS};
pub use stop::StopToken;
