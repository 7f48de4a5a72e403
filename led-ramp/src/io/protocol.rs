//! Defines the capability used to drive the pins and timers of a board.

use std::any::type_name;
use std::fmt::{Debug, Display};
use std::sync::Arc;

use dyn_clone::DynClone;
use parking_lot::RwLock;

use crate::errors::*;
use crate::io::{IoData, PinModeId, Polarity, VirtualBoard};

// Makes a Box<dyn IoProtocol> clone (used for Board cloning).
dyn_clone::clone_trait_object!(IoProtocol);

/// Defines the trait all pin/timer drivers must implement.
///
/// Every clone of a protocol must share the same [`IoData`]: the board and the channel
/// handles created from it all operate on the same hardware.
pub trait IoProtocol: DynClone + Send + Sync + Debug + Display {
    // ########################################
    // Inner data related functions

    fn get_data(&self) -> &Arc<RwLock<IoData>>;

    /// Returns the protocol name (used for Display only)
    fn get_protocol_name(&self) -> &'static str {
        type_name::<Self>().split("::").last().unwrap_or("IoProtocol")
    }

    // ########################################
    // Functions specifically bound to the protocol.

    /// Open the communication with the board.
    fn open(&mut self) -> Result<(), Error>;
    /// Gracefully shuts down the communication.
    fn close(&mut self) -> Result<(), Error>;
    /// Checks if the communication is opened.
    fn is_connected(&self) -> bool {
        self.get_data().read().connected
    }

    // ########################################
    // Pins & timers

    /// Set the `mode` of the specified `pin`.
    fn set_pin_mode(&mut self, pin: u16, mode: PinModeId) -> Result<(), Error>;

    /// Checks that `timer` can run at `frequency`, without writing anything.
    ///
    /// A timer is shared by its channels: once one of them outputs a waveform, the timer
    /// frequency cannot change anymore.
    fn timer_check(&self, timer: u8, frequency: u32) -> Result<(), Error>;

    /// Configure `timer` so that its counter overflows `frequency` times per second.
    ///
    /// Nothing is written when a running timer already has that frequency.
    fn timer_config(&mut self, timer: u8, frequency: u32) -> Result<(), Error>;

    /// Configure `channel` of `timer` as a PWM output with the given `polarity`, routed to `pin`.
    ///
    /// The polarity is set once here: [`IoProtocol::pulse_width_percent`] never deals with it.
    fn channel_config(
        &mut self,
        timer: u8,
        channel: u8,
        polarity: Polarity,
        pin: u16,
    ) -> Result<(), Error>;

    /// Disables `channel` of `timer` and disconnects it from its pin.
    fn channel_release(&mut self, timer: u8, channel: u8) -> Result<(), Error>;

    /// Sets the duty cycle of a configured channel, as a percentage of the period.
    ///
    /// `percent` is expected within `[0, 100]`. This call cannot fail: a channel that was
    /// configured successfully always accepts a new duty cycle.
    fn pulse_width_percent(&mut self, timer: u8, channel: u8, percent: f32);
}

#[cfg(not(tarpaulin_include))]
impl Default for Box<dyn IoProtocol> {
    fn default() -> Self {
        Box::new(VirtualBoard::default())
    }
}
