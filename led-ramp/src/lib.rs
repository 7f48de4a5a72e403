#![doc(html_root_url = "https://docs.rs/led-ramp/0.1.0")]

//! <h1 align="center">LED-RAMP</h1>
//! <div style="text-align:center;font-style:italic;">Cyclic LED brightness ramp over a hardware PWM channel.</div>
//!
//! # Features
//!
//! **led-ramp** dims a single LED through a hardware PWM channel of a microcontroller board and ramps
//! its brightness from 0 to 100% every ~5 seconds, forever.
//!
//! - Bind a pin to a hardware timer channel as a [`PwmChannel`](devices::PwmChannel): fixed frequency,
//!   fixed polarity, exclusive ownership of the hardware.
//! - Set the LED brightness with [`set_brightness`](devices::set_brightness): any number is accepted and
//!   clamped into `[0, 100]`.
//! - Run the brightness [`Ramp`](animations::Ramp) forever, or until a [`StopToken`](animations::StopToken)
//!   is raised.
//! - Talk to the hardware through an [`IoProtocol`](io::IoProtocol): the [`VirtualBoard`](io::VirtualBoard)
//!   is provided (an in-memory Nucleo-64 board).
//!
//! # Getting Started
//!
//! The following code runs the ramp until Ctrl-C is pressed:
//! ```no_run
//! use led_ramp::animations::{run_until, StopToken};
//! use led_ramp::devices::setup;
//! use led_ramp::hardware::Board;
//! use led_ramp::utils::BlockingDelay;
//!
//! fn main() -> anyhow::Result<()> {
//!     let board = Board::default().open()?;
//!
//!     // PA0 / TIM2_CH1 / 1000Hz / inverted.
//!     let mut led = setup(&board)?;
//!
//!     let stop = StopToken::default();
//!     stop.stop_on_ctrl_c()?;
//!     run_until(&mut led, &mut BlockingDelay, &stop);
//!
//!     led.release()?;
//!     board.close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Feature flags
//!
//! - **mocks** -- Provides mocked hardware and delay (useful for tests mostly).

pub mod animations;
pub mod devices;
pub mod errors;
pub mod hardware;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod utils;
