use anyhow::Result;

use led_ramp::devices::{set_brightness, setup};
use led_ramp::hardware::Board;
use led_ramp::pause_sync;

fn main() -> Result<()> {
    let board = Board::default().open()?;

    // Register the LED: PA0 / TIM2_CH1 / 1000Hz / inverted.
    let mut led = setup(&board)?;

    // Any number is accepted: out of range values are clamped.
    for duty in [-10.0, 0.0, 37.0, 42.5, 100.0, 250.0] {
        let applied = set_brightness(&mut led, duty);
        println!("Requested {}, applied {} - {}", duty, applied, led);
        pause_sync!(500);
    }

    // Give the hardware back and disconnect the board since we finished with it.
    led.release()?;
    board.close()?;
    Ok(())
}
