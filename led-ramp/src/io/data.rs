use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Display, Formatter};

use crate::errors::HardwareError::{
    AlreadyClaimed, IncompatibleMode, TimerInUse, UnknownChannel, UnknownPin, UnknownTimer,
};
use crate::errors::*;

/// Represents the internal data that a [`IoProtocol`](crate::io::IoProtocol) handles.
///
/// This struct is hidden behind an `Arc<RwLock<IoData>>` so that the board and the
/// channel handles created from it share a single view of the hardware: pins, timers and
/// which of them are currently claimed.
#[derive(Clone, Debug, Default)]
pub struct IoData {
    /// All `Pin` instances, representing the hardware's pins.
    pub pins: HashMap<u16, Pin>,
    /// All `Timer` instances, indexed by timer number (TIM2 => 2).
    pub timers: HashMap<u8, Timer>,
    /// A string representing the name of the board.
    pub board_name: String,
    /// A boolean indicating whether the IoProtocol is connected.
    pub connected: bool,
}

impl IoData {
    /// Retrieves a reference to a pin by its id or name.
    ///
    /// # Errors
    /// * `UnknownPin` - the pin does not exist on this board.
    pub fn get_pin<T: Into<PinIdOrName>>(&self, pin: T) -> Result<&Pin, Error> {
        let pin = pin.into();
        match &pin {
            PinIdOrName::Id(id) => self.pins.get(id),
            PinIdOrName::Name(name) => self.pins.values().find(|p| p.name == *name),
        }
        .ok_or(Error::from(UnknownPin {
            pin: pin.to_string(),
        }))
    }

    /// Retrieves a mutable reference to a pin by its id or name.
    ///
    /// # Errors
    /// * `UnknownPin` - the pin does not exist on this board.
    pub fn get_pin_mut<T: Into<PinIdOrName>>(&mut self, pin: T) -> Result<&mut Pin, Error> {
        let pin = pin.into();
        match &pin {
            PinIdOrName::Id(id) => self.pins.get_mut(id),
            PinIdOrName::Name(name) => self.pins.values_mut().find(|p| p.name == *name),
        }
        .ok_or(Error::from(UnknownPin {
            pin: pin.to_string(),
        }))
    }

    /// Retrieves a reference to a timer.
    ///
    /// # Errors
    /// * `UnknownTimer` - the timer does not exist on this board.
    pub fn get_timer(&self, timer: u8) -> Result<&Timer, Error> {
        self.timers
            .get(&timer)
            .ok_or(Error::from(UnknownTimer { timer }))
    }

    /// Retrieves a mutable reference to a timer.
    ///
    /// # Errors
    /// * `UnknownTimer` - the timer does not exist on this board.
    pub fn get_timer_mut(&mut self, timer: u8) -> Result<&mut Timer, Error> {
        self.timers
            .get_mut(&timer)
            .ok_or(Error::from(UnknownTimer { timer }))
    }

    /// Retrieves a mutable reference to a timer channel.
    ///
    /// # Errors
    /// * `UnknownTimer` - the timer does not exist on this board.
    /// * `UnknownChannel` - the timer has no such channel.
    pub fn get_channel_mut(&mut self, timer: u8, channel: u8) -> Result<&mut TimerChannel, Error> {
        self.get_timer_mut(timer)?
            .channels
            .get_mut(&channel)
            .ok_or(Error::from(UnknownChannel { timer, channel }))
    }

    /// Records that `pin` and the timer `channel` now belong to a PWM channel handle.
    ///
    /// Nothing is configured here: this is the ownership record checked before touching the
    /// hardware, so a second handle can never be bound on top of a live one.
    ///
    /// # Errors
    /// * `UnknownPin`, `UnknownTimer`, `UnknownChannel` - the resource does not exist.
    /// * `AlreadyClaimed` - the pin or the timer channel is held by another handle.
    pub fn claim(&mut self, pin: u16, timer: u8, channel: u8) -> Result<(), Error> {
        let pin_name = self.get_pin(pin)?.name.clone();
        self.get_channel_mut(timer, channel)?;

        if self.get_pin(pin)?.claimed {
            return Err(AlreadyClaimed {
                resource: format!("pin {}", pin_name),
            }
            .into());
        }
        let timer_channel = self.get_channel_mut(timer, channel)?;
        if timer_channel.claimed {
            return Err(AlreadyClaimed {
                resource: format!("channel {} of timer TIM{}", channel, timer),
            }
            .into());
        }

        timer_channel.claimed = true;
        self.get_pin_mut(pin)?.claimed = true;
        Ok(())
    }

    /// Checks that `pin` can be a push-pull output and be routed to the timer `channel`,
    /// without touching anything.
    ///
    /// # Errors
    /// * `UnknownPin` - the pin does not exist.
    /// * `IncompatibleMode` - the pin cannot be an output, or is not wired to the channel.
    pub fn check_route(&self, pin: u16, timer: u8, channel: u8) -> Result<(), Error> {
        let pin_instance = self.get_pin(pin)?;
        if !pin_instance.supports_mode(PinModeId::OUTPUT) {
            return Err(IncompatibleMode {
                pin: pin_instance.name.clone(),
                mode: PinModeId::OUTPUT,
                context: "try to set pin mode",
            }
            .into());
        }
        if !pin_instance.supports_mode(PinModeId::PWM) || !pin_instance.supports_route(timer, channel)
        {
            return Err(IncompatibleMode {
                pin: pin_instance.name.clone(),
                mode: PinModeId::PWM,
                context: "route pin to timer channel",
            }
            .into());
        }
        Ok(())
    }

    /// Forgets the ownership record made by [`IoData::claim`].
    pub fn unclaim(&mut self, pin: u16, timer: u8, channel: u8) -> Result<(), Error> {
        self.get_pin_mut(pin)?.claimed = false;
        self.get_channel_mut(timer, channel)?.claimed = false;
        Ok(())
    }
}

// ########################################

/// Represents the current state and configuration of a pin.
#[derive(Clone, Default)]
pub struct Pin {
    /// The pin ID, which also corresponds to the index of the [`IoData::pins`] hashmap.
    pub id: u16,
    /// The pin name: 'PA0', 'PB6', 'PC13' for instance.
    pub name: String,
    /// Currently configured mode.
    pub mode: PinModeId,
    /// All pin supported modes.
    pub supported_modes: Vec<PinModeId>,
    /// Timer channels this pin can be routed to (alternate functions).
    pub routes: Vec<TimerRoute>,
    /// Indicates the pin is owned by a PWM channel handle.
    pub claimed: bool,
}

impl Pin {
    /// Verifies if a pin supports the given mode.
    pub fn supports_mode(&self, mode: PinModeId) -> bool {
        self.supported_modes.contains(&mode)
    }

    /// Verifies if a pin can be driven by the given timer channel.
    pub fn supports_route(&self, timer: u8, channel: u8) -> bool {
        self.routes.contains(&TimerRoute { timer, channel })
    }
}

impl Debug for Pin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pin")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &format!("{}", self.mode))
            .field("supported modes", &self.supported_modes)
            .field("routes", &self.routes)
            .field("claimed", &self.claimed)
            .finish()
    }
}

/// A timer channel a pin can be connected to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerRoute {
    pub timer: u8,
    pub channel: u8,
}

impl Display for TimerRoute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "TIM{}_CH{}", self.timer, self.channel)
    }
}

// ########################################

/// Defines a structure to receive either an id or a name for a pin: 0 or 'PA0' for instance.
#[derive(Clone, PartialEq, Debug)]
pub enum PinIdOrName {
    Id(u16),
    Name(String),
}

impl From<u16> for PinIdOrName {
    fn from(n: u16) -> Self {
        PinIdOrName::Id(n)
    }
}

impl From<&str> for PinIdOrName {
    fn from(s: &str) -> Self {
        PinIdOrName::Name(s.to_string())
    }
}

impl From<String> for PinIdOrName {
    fn from(s: String) -> Self {
        PinIdOrName::Name(s)
    }
}

impl Display for PinIdOrName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PinIdOrName::Id(n) => write!(f, "{}", n),
            PinIdOrName::Name(s) => write!(f, "{}", s),
        }
    }
}

// ########################################

/// Enumerates the possible modes for a pin.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[repr(u8)]
pub enum PinModeId {
    /// Floating digital input (reset state).
    INPUT = 0,
    /// Push-pull digital output.
    OUTPUT = 1,
    /// Open-drain digital output.
    OPENDRAIN = 2,
    /// Alternate function: output driven by a timer channel.
    PWM = 3,
    /// Pin reserved by the board (debug port, etc.)
    #[default]
    UNSUPPORTED = 0x7F,
}

impl Display for PinModeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ########################################

/// Output polarity of a PWM channel.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Polarity {
    /// Output is high during the duty part of the period.
    #[default]
    Normal,
    /// Output is low during the duty part of the period (active-low loads).
    Inverted,
}

impl Display for Polarity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Normal => write!(f, "normal"),
            Polarity::Inverted => write!(f, "inverted"),
        }
    }
}

// ########################################

/// Represents a hardware timer and the state of its registers.
#[derive(Clone, Debug, Default)]
pub struct Timer {
    /// The timer number (TIM2 => 2).
    pub id: u8,
    /// Input clock of the timer (in Hz).
    pub clock: u32,
    /// Prescaler register (the counter clock is `clock / (prescaler + 1)`).
    pub prescaler: u16,
    /// Auto-reload register (the period is `auto_reload + 1` counter ticks).
    pub auto_reload: u16,
    /// Configured output frequency (in Hz), if any.
    pub frequency: Option<u32>,
    /// Channels of that timer, indexed by channel number.
    pub channels: BTreeMap<u8, TimerChannel>,
}

impl Timer {
    /// Creates an unconfigured timer with `count` channels (numbered from 1).
    pub fn new(id: u8, clock: u32, count: u8) -> Self {
        Self {
            id,
            clock,
            channels: (1..=count)
                .map(|channel| (channel, TimerChannel::new(channel)))
                .collect(),
            ..Default::default()
        }
    }

    /// Number of counter ticks in one PWM period.
    pub fn period_ticks(&self) -> u32 {
        u32::from(self.auto_reload) + 1
    }

    /// Checks if at least one channel of the timer currently outputs a waveform.
    pub fn is_running(&self) -> bool {
        self.channels.values().any(|channel| channel.polarity.is_some())
    }

    /// Checks the timer can run at `frequency` without changing the waveform of a running channel.
    ///
    /// # Errors
    /// * `TimerInUse` - a channel is running at another frequency.
    pub fn ensure_available(&self, frequency: u32) -> Result<(), Error> {
        match self.frequency {
            Some(current) if current != frequency && self.is_running() => Err(TimerInUse {
                timer: self.id,
                frequency: current,
            }
            .into()),
            _ => Ok(()),
        }
    }
}

/// Represents one output channel of a [`Timer`].
#[derive(Clone, Debug, Default)]
pub struct TimerChannel {
    /// Channel number (starting at 1).
    pub id: u8,
    /// Polarity of the channel when it is configured as PWM.
    pub polarity: Option<Polarity>,
    /// Pin the channel is routed to.
    pub pin: Option<u16>,
    /// Capture/compare register.
    pub compare: u32,
    /// Last duty cycle applied (in percent).
    pub duty: f32,
    /// Indicates the channel is owned by a PWM channel handle.
    pub claimed: bool,
}

impl TimerChannel {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Fraction (in percent) of each period during which the pin is electrically high.
    pub fn high_ratio(&self) -> f32 {
        match self.polarity {
            Some(Polarity::Inverted) => 100.0 - self.duty,
            Some(Polarity::Normal) => self.duty,
            None => 0.0,
        }
    }
}
