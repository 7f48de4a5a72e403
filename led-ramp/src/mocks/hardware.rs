use std::collections::HashMap;

use crate::io::{IoData, Pin, PinModeId, Timer, TimerRoute};

/// Creates a pin usable as a digital input/output.
pub fn create_output_pin(id: u16) -> Pin {
    Pin {
        id,
        name: format!("PA{}", id),
        mode: PinModeId::INPUT,
        supported_modes: vec![PinModeId::INPUT, PinModeId::OUTPUT, PinModeId::OPENDRAIN],
        routes: vec![],
        claimed: false,
    }
}

/// Creates a pin that can additionally be routed to the given timer channel.
pub fn create_pwm_pin(id: u16, timer: u8, channel: u8) -> Pin {
    let mut pin = create_output_pin(id);
    pin.supported_modes.push(PinModeId::PWM);
    pin.routes.push(TimerRoute { timer, channel });
    pin
}

/// Creates a pin reserved by the board: no mode can be set on it.
pub fn create_reserved_pin(id: u16) -> Pin {
    Pin {
        id,
        name: format!("PA{}", id),
        mode: PinModeId::UNSUPPORTED,
        supported_modes: vec![PinModeId::UNSUPPORTED],
        routes: vec![],
        claimed: false,
    }
}

/// Creates a test board: 16 pins 'PA0' to 'PA15' (ids 0 to 15) and two 4-channels timers.
///
/// - PA0 and PA5 can be routed to TIM2_CH1
/// - PA1 can be routed to TIM2_CH2
/// - PA6 can be routed to TIM3_CH1
/// - PA13 is reserved
/// - both timers run from a 1MHz clock
pub fn create_test_io_data() -> IoData {
    let mut pins: HashMap<u16, Pin> = (0..16).map(|id| (id, create_output_pin(id))).collect();
    pins.insert(0, create_pwm_pin(0, 2, 1));
    pins.insert(1, create_pwm_pin(1, 2, 2));
    pins.insert(5, create_pwm_pin(5, 2, 1));
    pins.insert(6, create_pwm_pin(6, 3, 1));
    pins.insert(13, create_reserved_pin(13));

    IoData {
        pins,
        timers: HashMap::from([
            (2, Timer::new(2, 1_000_000, 4)),
            (3, Timer::new(3, 1_000_000, 4)),
        ]),
        board_name: String::from("Test board"),
        connected: false,
    }
}
