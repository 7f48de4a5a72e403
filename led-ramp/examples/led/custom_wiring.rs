//! The LED does not have to sit on PA0: this example wires it on PB6 (TIM4_CH1), active-high,
//! and runs two ramp cycles at double speed.
use anyhow::Result;

use led_ramp::animations::{Ramp, StopToken};
use led_ramp::devices::{PwmChannel, PwmConfig};
use led_ramp::hardware::Board;
use led_ramp::io::Polarity;
use led_ramp::utils::BlockingDelay;

fn main() -> Result<()> {
    let board = Board::default().open()?;

    let config = PwmConfig::default()
        .with_pin("PB6")
        .with_timer(4)
        .with_channel(1)
        .with_frequency(2000)
        .with_polarity(Polarity::Normal);
    let mut led = PwmChannel::new(&board, config)?;

    // Stop after two cycles (or on Ctrl-C).
    let stop = StopToken::default();
    stop.stop_on_ctrl_c()?;
    let timer = stop.clone();
    std::thread::spawn(move || {
        led_ramp::pause_sync!(2 * 101 * 25);
        timer.stop();
    });

    let mut ramp = Ramp::default().with_interval(25);
    ramp.run_until(&mut led, &mut BlockingDelay, &stop);
    println!("Stopped at {} on {}", ramp.get_state(), led);

    led.release()?;
    board.close()?;
    Ok(())
}
