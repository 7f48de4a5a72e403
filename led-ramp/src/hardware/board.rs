use std::fmt::Display;
use std::ops::{Deref, DerefMut};

use log::trace;
use parking_lot::RwLockReadGuard;

use crate::errors::Error;
use crate::io::{IoData, IoProtocol, VirtualBoard};

/// Represents a physical board where your [`PwmChannel`](crate::devices::PwmChannel) can be attached and controlled
/// through this API. The board gives access to [`IoData`] through an [`IoProtocol`].
#[derive(Debug, Clone)]
pub struct Board {
    /// The inner protocol used by this Board.
    protocol: Box<dyn IoProtocol>,
}

impl Default for Board {
    /// Default implementation for a board.
    ///
    /// This method creates a board using the [`VirtualBoard`] protocol.
    ///
    /// **_/!\ The board will NOT be connected until the [`Board::open`] method is called._**
    ///
    /// # Example
    ///
    /// ```
    /// use led_ramp::hardware::Board;
    /// use led_ramp::io::VirtualBoard;
    ///
    /// // Following lines are all equivalent:
    /// let board = Board::default().open().unwrap();
    /// let board = Board::new(VirtualBoard::default()).open().unwrap();
    /// ```
    fn default() -> Self {
        Self::new(VirtualBoard::default())
    }
}

impl Board {
    /// Creates a board using a given protocol.
    pub fn new<P: IoProtocol + 'static>(protocol: P) -> Self {
        Self {
            protocol: Box::new(protocol),
        }
    }

    /// Returns the protocol used.
    ///
    /// NOTE: this is private to the crate since board already gives access to protocol methods via Deref.
    /// This method is only used internally by [`PwmChannel::new()`](crate::devices::PwmChannel::new) to clone
    /// the protocol into the channel.
    pub(crate) fn get_protocol(&self) -> Box<dyn IoProtocol> {
        self.protocol.clone()
    }

    /// Opens the board connexion (using the appropriate configured protocol).
    pub fn open(mut self) -> Result<Self, Error> {
        self.protocol.open()?;
        trace!("Board is ready: {}", self.protocol);
        Ok(self)
    }

    /// Closes the board connexion.
    ///
    /// Channels still bound to the board keep their claims: release them first.
    pub fn close(mut self) -> Result<Self, Error> {
        self.protocol.close()?;
        trace!("Board is closed");
        Ok(self)
    }

    /// Easy access to hardware through the board.
    ///
    /// # Example
    /// ```
    /// use led_ramp::hardware::Board;
    ///
    /// let board = Board::default().open().unwrap();
    /// println!("Board connected: {}", board);
    /// println!("Pins {:#?}", board.get_io().pins);
    /// ```
    pub fn get_io(&self) -> RwLockReadGuard<IoData> {
        self.protocol.get_data().read()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Board ({})", self.protocol)
    }
}

impl Deref for Board {
    type Target = Box<dyn IoProtocol>;

    fn deref(&self) -> &Self::Target {
        &self.protocol
    }
}

impl DerefMut for Board {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.protocol
    }
}

#[cfg(test)]
mod tests {
    use crate::io::PinModeId;
    use crate::mocks::MockIoProtocol;

    use super::*;

    #[test]
    fn test_board_default() {
        let board = Board::default();
        assert_eq!(board.get_protocol_name(), "VirtualBoard");
        assert!(!board.is_connected());
        assert_eq!(board.get_io().board_name, "NUCLEO-F401RE");
    }

    #[test]
    fn test_board_open_close() {
        let board = Board::default().open().unwrap();
        assert!(board.is_connected());

        // Clones share the same hardware.
        let clone = board.clone();
        let board = board.close().unwrap();
        assert!(!board.is_connected());
        assert!(!clone.is_connected());
    }

    #[test]
    fn test_board_custom_protocol() {
        let board = Board::new(MockIoProtocol::default());
        assert_eq!(board.get_protocol_name(), "MockIoProtocol");
        assert_eq!(board.get_io().board_name, "Test board");
    }

    #[test]
    fn test_board_deref() {
        let mut board = Board::default().open().unwrap();
        assert!(board.set_pin_mode(0, PinModeId::OUTPUT).is_ok());
        assert_eq!(board.get_io().get_pin("PA0").unwrap().mode, PinModeId::OUTPUT);
    }

    #[test]
    fn test_board_display() {
        let board = Board::new(MockIoProtocol::default());
        assert_eq!(
            format!("{}", board),
            "Board (MockIoProtocol [board=Test board])"
        );
    }
}
