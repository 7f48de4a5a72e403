use std::fmt::Display;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::HardwareError::{IncompatibleMode, InvalidFrequency};
use crate::errors::{Error, Unknown};
use crate::io::{IoData, IoProtocol, PinModeId, Polarity};
use crate::mocks::create_test_io_data;

/// Mock implementation of [`IoProtocol`].
/// Uses [`create_test_io_data`] for the hardware and records every duty cycle written.
#[derive(Clone, Debug)]
pub struct MockIoProtocol {
    pub data: Arc<RwLock<IoData>>,
    /// All duty cycles written through [`IoProtocol::pulse_width_percent`], in order.
    pub duty_history: Arc<RwLock<Vec<f32>>>,
    /// When set, the timer cannot be configured (a broken platform).
    pub broken_timer: bool,
}

impl Default for MockIoProtocol {
    fn default() -> Self {
        let mut data = create_test_io_data();
        data.connected = true;
        Self {
            data: Arc::new(RwLock::new(data)),
            duty_history: Arc::new(RwLock::new(vec![])),
            broken_timer: false,
        }
    }
}

impl MockIoProtocol {
    /// Creates a mock whose timer configuration always fails.
    pub fn broken() -> Self {
        Self {
            broken_timer: true,
            ..Default::default()
        }
    }

    /// Returns a copy of all duty cycles written so far.
    pub fn history(&self) -> Vec<f32> {
        self.duty_history.read().clone()
    }
}

impl Display for MockIoProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [board={}]",
            self.get_protocol_name(),
            self.data.read().board_name,
        )
    }
}

impl IoProtocol for MockIoProtocol {
    fn get_data(&self) -> &Arc<RwLock<IoData>> {
        &self.data
    }

    fn open(&mut self) -> Result<(), Error> {
        self.data.write().connected = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.data.write().connected = false;
        Ok(())
    }

    fn set_pin_mode(&mut self, pin: u16, mode: PinModeId) -> Result<(), Error> {
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
        Ok(())
    }

    fn timer_check(&self, timer: u8, frequency: u32) -> Result<(), Error> {
        let lock = self.data.read();
        let timer_instance = lock.get_timer(timer)?;
        auto_reload(timer_instance.clock, frequency)
            .ok_or(InvalidFrequency { timer, frequency })?;
        timer_instance.ensure_available(frequency)
    }

    fn timer_config(&mut self, timer: u8, frequency: u32) -> Result<(), Error> {
        if self.broken_timer {
            return Err(Unknown {
                info: String::from("timer does not respond"),
            });
        }
        self.timer_check(timer, frequency)?;
        let mut lock = self.data.write();
        let timer_instance = lock.get_timer_mut(timer)?;
        if timer_instance.is_running() {
            return Ok(());
        }
        timer_instance.auto_reload = auto_reload(timer_instance.clock, frequency)
            .ok_or(InvalidFrequency { timer, frequency })?;
        timer_instance.frequency = Some(frequency);
        Ok(())
    }

    fn channel_config(
        &mut self,
        timer: u8,
        channel: u8,
        polarity: Polarity,
        pin: u16,
    ) -> Result<(), Error> {
        let mut lock = self.data.write();
        let pin_instance = lock.get_pin_mut(pin)?;
        if !pin_instance.supports_route(timer, channel) {
            return Err(IncompatibleMode {
                pin: pin_instance.name.clone(),
                mode: PinModeId::PWM,
                context: "route pin to timer channel",
            }
            .into());
        }
        pin_instance.mode = PinModeId::PWM;
        let channel_instance = lock.get_channel_mut(timer, channel)?;
        channel_instance.polarity = Some(polarity);
        channel_instance.pin = Some(pin);
        Ok(())
    }

    fn channel_release(&mut self, timer: u8, channel: u8) -> Result<(), Error> {
        let mut lock = self.data.write();
        let channel_instance = lock.get_channel_mut(timer, channel)?;
        channel_instance.polarity = None;
        if let Some(pin) = channel_instance.pin.take() {
            lock.get_pin_mut(pin)?.mode = PinModeId::INPUT;
        }
        Ok(())
    }

    fn pulse_width_percent(&mut self, timer: u8, channel: u8, percent: f32) {
        if let Ok(channel_instance) = self.data.write().get_channel_mut(timer, channel) {
            channel_instance.duty = percent;
        }
        self.duty_history.write().push(percent);
    }
}

/// Keeps it simple: no prescaler, the counter runs at clock speed.
fn auto_reload(clock: u32, frequency: u32) -> Option<u16> {
    if frequency == 0 || frequency > clock {
        return None;
    }
    u16::try_from(clock / frequency - 1).ok()
}
