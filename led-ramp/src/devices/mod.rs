//! Defines the devices driven by a [`Board`](crate::hardware::Board).

pub use crate::devices::led::{set_brightness, setup, status_message};
pub use crate::devices::pwm_channel::{PwmChannel, PwmConfig};

mod led;
mod pwm_channel;
