//! Mocked hardware and time, used by tests (and available through the `mocks` feature).

mod delay;
mod hardware;
mod io_protocol;

pub use delay::MockDelay;
pub use hardware::*;
pub use io_protocol::MockIoProtocol;
