use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::{trace, warn};
use parking_lot::RwLock;

use crate::errors::HardwareError::{IncompatibleMode, InvalidFrequency, NotConnected};
use crate::errors::*;
use crate::io::{IoData, IoProtocol, Pin, PinModeId, Polarity, Timer, TimerRoute};

/// Clock feeding the general purpose timers (APB1 x2 on a 84MHz STM32F401).
pub const TIMER_CLOCK: u32 = 84_000_000;

/// Below this many counter ticks per period, a duty cycle has less than 1% resolution.
const MIN_PERIOD_TICKS: u32 = 100;

/// Alternate function table: which timer channel each pin can be routed to.
const TIMER_ROUTES: &[(&str, u8, u8)] = &[
    ("PA8", 1, 1),
    ("PA9", 1, 2),
    ("PA10", 1, 3),
    ("PA11", 1, 4),
    ("PA0", 2, 1),
    ("PA1", 2, 2),
    ("PA2", 2, 3),
    ("PA3", 2, 4),
    ("PA5", 2, 1),
    ("PA15", 2, 1),
    ("PB3", 2, 2),
    ("PB10", 2, 3),
    ("PA6", 3, 1),
    ("PA7", 3, 2),
    ("PB0", 3, 3),
    ("PB1", 3, 4),
    ("PB4", 3, 1),
    ("PB5", 3, 2),
    ("PB6", 4, 1),
    ("PB7", 4, 2),
    ("PB8", 4, 3),
    ("PB9", 4, 4),
];

/// Pins wired to the debug port: they cannot be used.
const RESERVED_PINS: &[&str] = &["PA13", "PA14"];

/// An in-memory Nucleo-64 (STM32F401RE) board.
///
/// Pin modes, timer prescaler/auto-reload and capture/compare registers are computed the way
/// the peripheral would hold them and kept in the shared [`IoData`]; every register write is
/// traced. This is the default board: it needs no attached hardware.
#[derive(Clone, Debug)]
pub struct VirtualBoard {
    data: Arc<RwLock<IoData>>,
}

impl Default for VirtualBoard {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(create_nucleo_io_data())),
        }
    }
}

impl Display for VirtualBoard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let data = self.data.read();
        write!(
            f,
            "{} [board={}, pins={}, timers={}]",
            self.get_protocol_name(),
            data.board_name,
            data.pins.len(),
            data.timers.len(),
        )
    }
}

impl VirtualBoard {
    fn ensure_connected(&self) -> Result<(), Error> {
        match self.is_connected() {
            true => Ok(()),
            false => Err(NotConnected.into()),
        }
    }
}

impl IoProtocol for VirtualBoard {
    fn get_data(&self) -> &Arc<RwLock<IoData>> {
        &self.data
    }

    fn open(&mut self) -> Result<(), Error> {
        let mut lock = self.data.write();
        lock.connected = true;
        trace!("Virtual board {} is opened", lock.board_name);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        let mut lock = self.data.write();
        lock.connected = false;
        trace!("Virtual board {} is closed", lock.board_name);
        Ok(())
    }

    fn set_pin_mode(&mut self, pin: u16, mode: PinModeId) -> Result<(), Error> {
        self.ensure_connected()?;
        let mut lock = self.data.write();
        let pin_instance = lock.get_pin_mut(pin)?;
        if !pin_instance.supports_mode(mode) {
            return Err(IncompatibleMode {
                pin: pin_instance.name.clone(),
                mode,
                context: "try to set pin mode",
            }
            .into());
        }
        pin_instance.mode = mode;
        trace!("{}: MODER <- {}", pin_instance.name, mode);
        Ok(())
    }

    fn timer_check(&self, timer: u8, frequency: u32) -> Result<(), Error> {
        let lock = self.data.read();
        let timer_instance = lock.get_timer(timer)?;
        timer_registers(timer_instance.clock, frequency)
            .ok_or(InvalidFrequency { timer, frequency })?;
        timer_instance.ensure_available(frequency)
    }

    fn timer_config(&mut self, timer: u8, frequency: u32) -> Result<(), Error> {
        self.ensure_connected()?;
        self.timer_check(timer, frequency)?;
        let mut lock = self.data.write();
        let timer_instance = lock.get_timer_mut(timer)?;
        if timer_instance.is_running() {
            trace!("TIM{}: already running at {}Hz", timer, frequency);
            return Ok(());
        }
        let (prescaler, auto_reload) = timer_registers(timer_instance.clock, frequency)
            .ok_or(InvalidFrequency { timer, frequency })?;

        timer_instance.prescaler = prescaler;
        timer_instance.auto_reload = auto_reload;
        timer_instance.frequency = Some(frequency);
        trace!(
            "TIM{}: PSC <- {}, ARR <- {} ({}Hz)",
            timer,
            prescaler,
            auto_reload,
            frequency
        );
        Ok(())
    }

    fn channel_config(
        &mut self,
        timer: u8,
        channel: u8,
        polarity: Polarity,
        pin: u16,
    ) -> Result<(), Error> {
        self.ensure_connected()?;
        let mut lock = self.data.write();

        let pin_instance = lock.get_pin(pin)?;
        if !pin_instance.supports_mode(PinModeId::PWM) || !pin_instance.supports_route(timer, channel)
        {
            return Err(IncompatibleMode {
                pin: pin_instance.name.clone(),
                mode: PinModeId::PWM,
                context: "route pin to timer channel",
            }
            .into());
        }
        let pin_name = pin_instance.name.clone();

        if lock.get_timer(timer)?.frequency.is_none() {
            return Err(InvalidFrequency {
                timer,
                frequency: 0,
            }
            .into());
        }

        let channel_instance = lock.get_channel_mut(timer, channel)?;
        channel_instance.polarity = Some(polarity);
        channel_instance.pin = Some(pin);
        channel_instance.compare = 0;
        channel_instance.duty = 0.0;
        lock.get_pin_mut(pin)?.mode = PinModeId::PWM;
        trace!(
            "TIM{}_CH{}: CCER <- enabled, {} -> {}",
            timer,
            channel,
            polarity,
            pin_name
        );
        Ok(())
    }

    fn channel_release(&mut self, timer: u8, channel: u8) -> Result<(), Error> {
        self.ensure_connected()?;
        let mut lock = self.data.write();
        let channel_instance = lock.get_channel_mut(timer, channel)?;
        let pin = channel_instance.pin.take();
        channel_instance.polarity = None;
        channel_instance.compare = 0;
        channel_instance.duty = 0.0;
        if let Some(pin) = pin {
            lock.get_pin_mut(pin)?.mode = PinModeId::INPUT;
        }
        trace!("TIM{}_CH{}: CCER <- disabled", timer, channel);
        Ok(())
    }

    fn pulse_width_percent(&mut self, timer: u8, channel: u8, percent: f32) {
        let mut lock = self.data.write();
        let period = match lock.get_timer(timer) {
            Ok(timer) => timer.period_ticks(),
            Err(error) => return warn!("Ignored duty write: {}", error),
        };
        match lock.get_channel_mut(timer, channel) {
            Ok(channel_instance) => {
                channel_instance.duty = percent;
                channel_instance.compare = compare_value(period, percent);
                trace!(
                    "TIM{}_CH{}: CCR <- {}",
                    timer,
                    channel,
                    channel_instance.compare
                );
            }
            Err(error) => warn!("Ignored duty write: {}", error),
        }
    }
}

/// Computes the (prescaler, auto-reload) registers producing `frequency` from `clock`.
///
/// The smallest prescaler is picked so that the period keeps the best resolution while fitting
/// in the 16bits auto-reload register.
fn timer_registers(clock: u32, frequency: u32) -> Option<(u16, u16)> {
    if frequency == 0 {
        return None;
    }
    let ticks = clock / frequency;
    if ticks < MIN_PERIOD_TICKS {
        return None;
    }
    let prescaler = ticks.div_ceil(1 << 16);
    let period = ticks / prescaler;
    Some((
        u16::try_from(prescaler - 1).ok()?,
        u16::try_from(period - 1).ok()?,
    ))
}

/// Computes the capture/compare register value for `percent` of a `period`.
fn compare_value(period: u32, percent: f32) -> u32 {
    ((period as f32) * percent / 100.0).round() as u32
}

/// Builds the pins and timers of the Nucleo-64 board.
fn create_nucleo_io_data() -> IoData {
    let mut pins = HashMap::new();
    let names = (0..16u16)
        .map(|n| (n, format!("PA{}", n)))
        .chain((0..16u16).map(|n| (16 + n, format!("PB{}", n))))
        .chain(std::iter::once((45, String::from("PC13"))));

    for (id, name) in names {
        let routes: Vec<TimerRoute> = TIMER_ROUTES
            .iter()
            .filter(|(pin, _, _)| *pin == name)
            .map(|(_, timer, channel)| TimerRoute {
                timer: *timer,
                channel: *channel,
            })
            .collect();
        let supported_modes = match RESERVED_PINS.contains(&name.as_str()) {
            true => vec![PinModeId::UNSUPPORTED],
            false => {
                let mut modes = vec![PinModeId::INPUT, PinModeId::OUTPUT, PinModeId::OPENDRAIN];
                if !routes.is_empty() {
                    modes.push(PinModeId::PWM);
                }
                modes
            }
        };
        let mode = match RESERVED_PINS.contains(&name.as_str()) {
            true => PinModeId::UNSUPPORTED,
            false => PinModeId::INPUT,
        };
        pins.insert(
            id,
            Pin {
                id,
                name,
                mode,
                supported_modes,
                routes,
                claimed: false,
            },
        );
    }

    IoData {
        pins,
        timers: (1..=4u8)
            .map(|id| (id, Timer::new(id, TIMER_CLOCK, 4)))
            .collect(),
        board_name: String::from("NUCLEO-F401RE"),
        connected: false,
    }
}
