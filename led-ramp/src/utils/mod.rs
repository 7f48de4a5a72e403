pub use duty::DutyCycle;
pub use delay::{BlockingDelay, Delay};

mod delay;
mod duty;
