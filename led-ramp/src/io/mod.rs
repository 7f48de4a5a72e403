//! Defines the hardware capability consumed by the devices: pins, timers and their drivers.

mod data;
mod protocol;
mod virtual_board;

pub use data::*;
pub use protocol::*;
pub use virtual_board::*;
