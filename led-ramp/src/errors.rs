use snafu::Snafu;

pub use crate::errors::Error::*;
use crate::io::PinModeId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Runtime error: the stop signal handler could not be started.
    RuntimeError,
    /// Hardware error: {source}.
    HardwareError { source: HardwareError },
    /// Unknown error: {info}.
    Unknown { info: String },
}

impl From<HardwareError> for Error {
    fn from(value: HardwareError) -> Self {
        Self::HardwareError { source: value }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Unknown {
            info: error.to_string(),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HardwareError {
    /// Board is not connected
    NotConnected,
    /// Unknown pin {pin}
    UnknownPin { pin: String },
    /// Pin ({pin}) not compatible with mode ({mode}) - {context}
    IncompatibleMode {
        pin: String,
        mode: PinModeId,
        context: &'static str,
    },
    /// Unknown timer TIM{timer}
    UnknownTimer { timer: u8 },
    /// Unknown channel {channel} on timer TIM{timer}
    UnknownChannel { timer: u8, channel: u8 },
    /// Frequency {frequency}Hz cannot be produced by timer TIM{timer}
    InvalidFrequency { timer: u8, frequency: u32 },
    /// Timer TIM{timer} already runs at {frequency}Hz for another PWM channel
    TimerInUse { timer: u8, frequency: u32 },
    /// {resource} is already claimed by another PWM channel
    AlreadyClaimed { resource: String },
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::HardwareError::{
        AlreadyClaimed, IncompatibleMode, InvalidFrequency, TimerInUse, UnknownChannel,
        UnknownPin,
    };

    use super::*;

    #[test]
    fn test_error_display() {
        let runtime_error = RuntimeError;
        assert_eq!(
            format!("{}", runtime_error),
            "Runtime error: the stop signal handler could not be started."
        );

        let hardware_error = Error::from(IncompatibleMode {
            pin: String::from("PA0"),
            mode: PinModeId::PWM,
            context: "test context",
        });
        assert_eq!(
            format!("{}", hardware_error),
            "Hardware error: Pin (PA0) not compatible with mode (PWM) - test context."
        );

        let unknown_error = Unknown {
            info: "Some unknown error".to_string(),
        };
        assert_eq!(
            format!("{}", unknown_error),
            "Unknown error: Some unknown error."
        );
    }

    #[test]
    fn test_from_hardware_error() {
        let error: Error = UnknownPin {
            pin: String::from("PZ9"),
        }
        .into();
        assert_eq!(format!("{}", error), "Hardware error: Unknown pin PZ9.");

        let error: Error = UnknownChannel {
            timer: 2,
            channel: 7,
        }
        .into();
        assert_eq!(
            format!("{}", error),
            "Hardware error: Unknown channel 7 on timer TIM2."
        );

        let error: Error = InvalidFrequency {
            timer: 2,
            frequency: 0,
        }
        .into();
        assert_eq!(
            format!("{}", error),
            "Hardware error: Frequency 0Hz cannot be produced by timer TIM2."
        );

        let error: Error = TimerInUse {
            timer: 2,
            frequency: 1000,
        }
        .into();
        assert_eq!(
            format!("{}", error),
            "Hardware error: Timer TIM2 already runs at 1000Hz for another PWM channel."
        );

        let error: Error = AlreadyClaimed {
            resource: String::from("pin PA0"),
        }
        .into();
        assert_eq!(
            format!("{}", error),
            "Hardware error: pin PA0 is already claimed by another PWM channel."
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::Other, "signal handler failed");
        let error: Error = io_error.into();
        assert_eq!(
            format!("{}", error),
            "Unknown error: signal handler failed."
        );
    }
}
