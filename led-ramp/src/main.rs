use anyhow::Result;

use led_ramp::animations::{run_until, StopToken};
use led_ramp::devices::setup;
use led_ramp::hardware::Board;
use led_ramp::utils::BlockingDelay;

// Ramps the LED brightness from 0 to 100% every ~5s until Ctrl-C is pressed.
// Any hardware configuration error is fatal: the process exits right away.
fn main() -> Result<()> {
    let board = Board::default().open()?;
    let mut led = setup(&board)?;

    let stop = StopToken::default();
    stop.stop_on_ctrl_c()?;
    run_until(&mut led, &mut BlockingDelay, &stop);

    led.release()?;
    board.close()?;
    Ok(())
}
