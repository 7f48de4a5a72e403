use std::fmt::{Display, Formatter};

use log::debug;

use crate::errors::Error;
use crate::errors::HardwareError::NotConnected;
use crate::hardware::Board;
use crate::io::{IoProtocol, PinIdOrName, PinModeId, Polarity};
use crate::utils::DutyCycle;

/// Configuration of a [`PwmChannel`]: which pin, which timer channel, and how the waveform looks.
///
/// The default configuration is the one of the LED: pin `PA0` driven by channel 1 of timer
/// TIM2, at 1000Hz, inverted (the LED is wired active-low).
#[derive(Clone, Debug, PartialEq)]
pub struct PwmConfig {
    /// The pin (id or name) the waveform is output on.
    pub pin: PinIdOrName,
    /// The timer generating the waveform.
    pub timer: u8,
    /// The timer channel routed to the pin.
    pub channel: u8,
    /// The PWM frequency (in Hz).
    pub frequency: u32,
    /// The output polarity.
    pub polarity: Polarity,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            pin: PinIdOrName::from("PA0"),
            timer: 2,
            channel: 1,
            frequency: 1000,
            polarity: Polarity::Inverted,
        }
    }
}

impl PwmConfig {
    pub fn with_pin<T: Into<PinIdOrName>>(mut self, pin: T) -> Self {
        self.pin = pin.into();
        self
    }

    pub fn with_timer(mut self, timer: u8) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }
}

/// Represents a PWM output: one pin bound to one hardware timer channel.
///
/// The handle owns the pin and the timer channel: while it is alive, no other `PwmChannel` can
/// be created on either of them. Dropping the handle does NOT give them back (the binding is
/// meant to last for the process lifetime): use [`PwmChannel::release`] for that.
///
/// Frequency and polarity are fixed at construction. The only runtime operation is
/// [`PwmChannel::set_duty`], which cannot fail.
#[derive(Debug)]
pub struct PwmChannel {
    // ########################################
    // # Basics
    /// The pin (id) of the [`Board`] the waveform is output on.
    pin: u16,
    /// The pin name (for display).
    pin_name: String,
    /// The timer generating the waveform.
    timer: u8,
    /// The timer channel routed to the pin.
    channel: u8,
    /// The PWM frequency (in Hz).
    frequency: u32,
    /// The output polarity.
    polarity: Polarity,
    /// The last applied duty cycle.
    duty: DutyCycle,

    // ########################################
    // # Volatile utility data.
    /// The protocol used by the board to communicate with the device.
    protocol: Box<dyn IoProtocol>,
}

impl PwmChannel {
    /// Creates a [`PwmChannel`] on the given board: configures the pin as push-pull output, sets
    /// the timer frequency and binds the timer channel to the pin with the configured polarity.
    ///
    /// # Errors
    /// * `NotConnected`: the board is not opened.
    /// * `UnknownPin`, `UnknownTimer`, `UnknownChannel`: the resource does not exist on the board.
    /// * `AlreadyClaimed`: the pin or the timer channel is already bound to another handle.
    /// * `IncompatibleMode`: the pin cannot be a push-pull output, or cannot be routed to the timer channel.
    /// * `InvalidFrequency`: the timer cannot produce the frequency.
    /// * `TimerInUse`: another channel of the timer already runs at another frequency.
    ///
    /// Everything is checked before the hardware is touched: a failed creation leaves the pin,
    /// the timer and the channels already running on it as they were.
    pub fn new(board: &Board, config: PwmConfig) -> Result<Self, Error> {
        if !board.is_connected() {
            return Err(NotConnected.into());
        }

        let protocol = board.get_protocol();
        let pin = protocol.get_data().read().get_pin(config.pin)?.clone();
        let previous_mode = pin.mode;
        protocol
            .get_data()
            .write()
            .claim(pin.id, config.timer, config.channel)?;
        debug!(
            "Claimed {} and TIM{}_CH{}",
            pin.name, config.timer, config.channel
        );

        let mut output = Self {
            pin: pin.id,
            pin_name: pin.name,
            timer: config.timer,
            channel: config.channel,
            frequency: config.frequency,
            polarity: config.polarity,
            duty: DutyCycle::MIN,
            protocol,
        };

        if let Err(error) = output.validate() {
            output.unclaim();
            return Err(error);
        }
        if let Err(error) = output.configure() {
            output.restore_pin_mode(previous_mode);
            output.unclaim();
            return Err(error);
        }
        Ok(output)
    }

    fn validate(&self) -> Result<(), Error> {
        self.protocol
            .get_data()
            .read()
            .check_route(self.pin, self.timer, self.channel)?;
        self.protocol.timer_check(self.timer, self.frequency)
    }

    fn configure(&mut self) -> Result<(), Error> {
        self.protocol.set_pin_mode(self.pin, PinModeId::OUTPUT)?;
        self.protocol.timer_config(self.timer, self.frequency)?;
        self.protocol
            .channel_config(self.timer, self.channel, self.polarity, self.pin)?;
        Ok(())
    }

    fn restore_pin_mode(&mut self, mode: PinModeId) {
        let current = self.protocol.get_data().read().get_pin(self.pin).map(|pin| pin.mode);
        if current.is_ok_and(|current| current != mode) {
            let _ = self.protocol.set_pin_mode(self.pin, mode);
            debug!("Restored {} to {}", self.pin_name, mode);
        }
    }

    fn unclaim(&mut self) {
        let _ = self
            .protocol
            .get_data()
            .write()
            .unclaim(self.pin, self.timer, self.channel);
        debug!(
            "Released {} and TIM{}_CH{}",
            self.pin_name, self.timer, self.channel
        );
    }

    /// Applies a duty cycle to the channel.
    pub fn set_duty(&mut self, duty: DutyCycle) -> &Self {
        self.protocol
            .pulse_width_percent(self.timer, self.channel, duty.as_percent() as f32);
        self.duty = duty;
        self
    }

    /// Disables the channel and gives the pin and the timer channel back to the board.
    ///
    /// # Errors
    /// When the channel cannot be disabled (board closed for instance), the pin and the timer
    /// channel stay claimed: nothing else can be bound over a waveform that still runs.
    pub fn release(mut self) -> Result<(), Error> {
        self.protocol.channel_release(self.timer, self.channel)?;
        self.unclaim();
        Ok(())
    }

    // ########################################
    // Setters and Getters.

    /// Returns the pin (id) used by the channel.
    pub fn get_pin(&self) -> u16 {
        self.pin
    }

    /// Returns the timer generating the waveform.
    pub fn get_timer(&self) -> u8 {
        self.timer
    }

    /// Returns the timer channel routed to the pin.
    pub fn get_channel(&self) -> u8 {
        self.channel
    }

    /// Returns the PWM frequency (in Hz).
    pub fn get_frequency(&self) -> u32 {
        self.frequency
    }

    /// Returns the output polarity.
    pub fn get_polarity(&self) -> Polarity {
        self.polarity
    }

    /// Returns the last applied duty cycle.
    pub fn get_duty(&self) -> DutyCycle {
        self.duty
    }
}

impl Display for PwmChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PwmChannel (pin={}, timer={}, channel={}) [frequency={}Hz, polarity={}, duty={}]",
            self.pin_name, self.timer, self.channel, self.frequency, self.polarity, self.duty,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::hardware::Board;
    use crate::io::{PinModeId, Polarity};
    use crate::mocks::MockIoProtocol;

    use super::*;

    #[test]
    fn test_config_default() {
        let config = PwmConfig::default();
        assert_eq!(config.pin, PinIdOrName::from("PA0"));
        assert_eq!(config.timer, 2);
        assert_eq!(config.channel, 1);
        assert_eq!(config.frequency, 1000);
        assert_eq!(config.polarity, Polarity::Inverted);

        let config = PwmConfig::default()
            .with_pin(6)
            .with_timer(3)
            .with_channel(2)
            .with_frequency(500)
            .with_polarity(Polarity::Normal);
        assert_eq!(config.pin, PinIdOrName::Id(6));
        assert_eq!(config.timer, 3);
        assert_eq!(config.channel, 2);
        assert_eq!(config.frequency, 500);
        assert_eq!(config.polarity, Polarity::Normal);
    }

    #[test]
    fn test_creation() {
        let mock = MockIoProtocol::default();
        let channel = PwmChannel::new(&Board::new(mock.clone()), PwmConfig::default()).unwrap();
        assert_eq!(channel.get_pin(), 0);
        assert_eq!(channel.get_timer(), 2);
        assert_eq!(channel.get_channel(), 1);
        assert_eq!(channel.get_frequency(), 1000);
        assert_eq!(channel.get_polarity(), Polarity::Inverted);
        assert_eq!(channel.get_duty(), DutyCycle::MIN);

        let mut lock = mock.data.write();
        let pin = lock.get_pin(0).unwrap();
        assert_eq!(pin.mode, PinModeId::PWM);
        assert!(pin.claimed);
        assert_eq!(lock.get_timer(2).unwrap().frequency, Some(1000));
        let timer_channel = lock.get_channel_mut(2, 1).unwrap();
        assert_eq!(timer_channel.polarity, Some(Polarity::Inverted));
        assert_eq!(timer_channel.pin, Some(0));
        assert!(timer_channel.claimed);
    }

    #[test]
    fn test_creation_errors() {
        let board = Board::new(MockIoProtocol::default());

        let error = PwmChannel::new(&board, PwmConfig::default().with_pin("PZ9")).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Unknown pin PZ9."
        );

        let error = PwmChannel::new(&board, PwmConfig::default().with_timer(9)).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Unknown timer TIM9."
        );

        // PA0 cannot be routed to TIM3.
        let error = PwmChannel::new(&board, PwmConfig::default().with_timer(3)).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Pin (PA0) not compatible with mode (PWM) - route pin to timer channel."
        );

        // PA13 is reserved.
        let error = PwmChannel::new(&board, PwmConfig::default().with_pin(13)).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Pin (PA13) not compatible with mode (OUTPUT) - try to set pin mode."
        );

        let error = PwmChannel::new(&board, PwmConfig::default().with_frequency(0)).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Frequency 0Hz cannot be produced by timer TIM2."
        );

        // None of the failures above kept a claim.
        assert!(PwmChannel::new(&board, PwmConfig::default()).is_ok());
    }

    #[test]
    fn test_creation_on_closed_board() {
        let board = Board::new(MockIoProtocol::default()).close().unwrap();
        let error = PwmChannel::new(&board, PwmConfig::default()).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Board is not connected."
        );
    }

    #[test]
    fn test_creation_on_broken_platform() {
        let mock = MockIoProtocol::broken();
        let board = Board::new(mock.clone());
        let error = PwmChannel::new(&board, PwmConfig::default()).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Unknown error: timer does not respond."
        );
        let lock = mock.data.read();
        let pin = lock.get_pin(0).unwrap();
        assert!(!pin.claimed);
        assert_eq!(pin.mode, PinModeId::INPUT);
    }

    #[test]
    fn test_shared_timer_keeps_its_frequency() {
        let mock = MockIoProtocol::default();
        let board = Board::new(mock.clone());
        let led = PwmChannel::new(&board, PwmConfig::default()).unwrap();

        // Other channel of TIM2, other frequency.
        let error = PwmChannel::new(
            &board,
            PwmConfig::default()
                .with_pin("PA1")
                .with_channel(2)
                .with_frequency(500),
        )
        .err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Timer TIM2 already runs at 1000Hz for another PWM channel."
        );
        assert_eq!(led.get_frequency(), 1000);
        {
            let lock = mock.data.read();
            let timer = lock.get_timer(2).unwrap();
            assert_eq!(timer.frequency, Some(1000));
            assert_eq!(timer.auto_reload, 999);
            let pin = lock.get_pin("PA1").unwrap();
            assert!(!pin.claimed);
            assert_eq!(pin.mode, PinModeId::INPUT);
        }

        // Other channel of TIM2, same frequency.
        let second = PwmChannel::new(&board, PwmConfig::default().with_pin("PA1").with_channel(2));
        assert!(second.is_ok());
        assert_eq!(mock.data.read().get_timer(2).unwrap().auto_reload, 999);
    }

    #[test]
    fn test_failed_creation_leaves_hardware_untouched() {
        let board = Board::default().open().unwrap();
        let mut led = PwmChannel::new(&board, PwmConfig::default()).unwrap();
        led.set_duty(DutyCycle::from(25));
        let before = board.get_io().get_timer(2).unwrap().clone();

        // PC13 cannot be routed to any timer channel.
        let error = PwmChannel::new(
            &board,
            PwmConfig::default()
                .with_pin("PC13")
                .with_channel(3)
                .with_frequency(500),
        )
        .err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Pin (PC13) not compatible with mode (PWM) - route pin to timer channel."
        );

        // 1MHz leaves less than 100 ticks per period.
        let error = PwmChannel::new(
            &board,
            PwmConfig::default()
                .with_pin("PA1")
                .with_channel(2)
                .with_frequency(1_000_000),
        )
        .err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: Frequency 1000000Hz cannot be produced by timer TIM2."
        );

        let io = board.get_io();
        let after = io.get_timer(2).unwrap();
        assert_eq!(after.frequency, before.frequency);
        assert_eq!(after.prescaler, before.prescaler);
        assert_eq!(after.auto_reload, before.auto_reload);
        assert_eq!(after.channels[&1].compare, before.channels[&1].compare);
        assert_eq!(after.channels[&1].compare, 10500);
        assert_eq!(io.get_pin("PC13").unwrap().mode, PinModeId::INPUT);
        assert_eq!(io.get_pin("PA1").unwrap().mode, PinModeId::INPUT);
        assert!(!io.get_pin("PA1").unwrap().claimed);
    }

    #[test]
    fn test_failed_release_keeps_claim() {
        let board = Board::default().open().unwrap();
        let led = PwmChannel::new(&board, PwmConfig::default()).unwrap();

        let board = board.close().unwrap();
        assert_eq!(
            led.release().err().unwrap().to_string(),
            "Hardware error: Board is not connected."
        );

        // The channel still runs: it cannot be bound again.
        let board = board.open().unwrap();
        assert_eq!(
            board.get_io().get_timer(2).unwrap().channels[&1].polarity,
            Some(Polarity::Inverted)
        );
        assert!(PwmChannel::new(&board, PwmConfig::default()).is_err());
    }

    #[test]
    fn test_double_binding() {
        let board = Board::new(MockIoProtocol::default());
        let _first = PwmChannel::new(&board, PwmConfig::default()).unwrap();

        // Same pin and channel.
        let error = PwmChannel::new(&board, PwmConfig::default()).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: pin PA0 is already claimed by another PWM channel."
        );

        // Other pin, same timer channel.
        let error = PwmChannel::new(&board, PwmConfig::default().with_pin("PA5")).err();
        assert_eq!(
            error.unwrap().to_string(),
            "Hardware error: channel 1 of timer TIM2 is already claimed by another PWM channel."
        );

        // Other pin, other channel of the same timer.
        let second = PwmChannel::new(&board, PwmConfig::default().with_pin("PA1").with_channel(2));
        assert!(second.is_ok());
    }

    #[test]
    fn test_binding_survives_drop() {
        let board = Board::new(MockIoProtocol::default());
        drop(PwmChannel::new(&board, PwmConfig::default()).unwrap());
        assert!(PwmChannel::new(&board, PwmConfig::default()).is_err());
    }

    #[test]
    fn test_release() {
        let mock = MockIoProtocol::default();
        let board = Board::new(mock.clone());
        let channel = PwmChannel::new(&board, PwmConfig::default()).unwrap();
        assert!(channel.release().is_ok());

        {
            let mut lock = mock.data.write();
            let pin = lock.get_pin(0).unwrap();
            assert!(!pin.claimed);
            assert_eq!(pin.mode, PinModeId::INPUT);
            assert_eq!(lock.get_channel_mut(2, 1).unwrap().polarity, None);
        }

        assert!(PwmChannel::new(&board, PwmConfig::default()).is_ok());
    }

    #[test]
    fn test_set_duty() {
        let mock = MockIoProtocol::default();
        let mut channel = PwmChannel::new(&Board::new(mock.clone()), PwmConfig::default()).unwrap();
        channel.set_duty(DutyCycle::from(42.5));
        assert_eq!(channel.get_duty().as_percent(), 42.5);
        channel.set_duty(DutyCycle::from(42.5));
        channel.set_duty(DutyCycle::MAX);
        assert_eq!(mock.history(), vec![42.5, 42.5, 100.0]);
        assert_eq!(
            mock.data.write().get_channel_mut(2, 1).unwrap().duty,
            100.0
        );
    }

    #[test]
    fn test_display_impl() {
        let mut channel =
            PwmChannel::new(&Board::new(MockIoProtocol::default()), PwmConfig::default()).unwrap();
        channel.set_duty(DutyCycle::from(37));
        assert_eq!(
            format!("{}", channel),
            "PwmChannel (pin=PA0, timer=2, channel=1) [frequency=1000Hz, polarity=inverted, duty=37%]"
        );
    }
}
