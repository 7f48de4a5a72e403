//! The LED: an active-low LED on pin PA0, dimmed through channel 1 of timer TIM2.

use crate::devices::{PwmChannel, PwmConfig};
use crate::errors::Error;
use crate::hardware::Board;
use crate::utils::DutyCycle;

/// Binds the LED PWM channel: PA0 as push-pull output, driven by TIM2_CH1 at 1000Hz with an
/// inverted polarity.
///
/// A failure here is a wiring or programming defect, not something to retry.
///
/// # Errors
/// See [`PwmChannel::new`]. In particular, calling `setup` again while the first handle is
/// alive fails with `AlreadyClaimed`: the hardware is never bound twice.
///
/// # Example
/// ```
/// use led_ramp::devices::{set_brightness, setup};
/// use led_ramp::hardware::Board;
///
/// let board = Board::default().open().unwrap();
/// let mut led = setup(&board).unwrap();
/// set_brightness(&mut led, 50);
///
/// // The hardware is already bound.
/// assert!(setup(&board).is_err());
/// ```
pub fn setup(board: &Board) -> Result<PwmChannel, Error> {
    PwmChannel::new(board, PwmConfig::default())
}

/// Sets the brightness of the LED to `duty` percent.
///
/// Any number is accepted: values below 0 are applied as 0, values above 100 as 100, and the
/// rest as is. The applied value is reported on the console and returned.
pub fn set_brightness<T: Into<DutyCycle>>(channel: &mut PwmChannel, duty: T) -> DutyCycle {
    let duty = duty.into();
    channel.set_duty(duty);
    println!("{}", status_message(duty));
    duty
}

/// The console line reporting an applied duty cycle.
pub fn status_message(duty: DutyCycle) -> String {
    format!("changing duty to \"{}\"", duty)
}
