//! Defines pieces of hardware that can be controlled through an [`IoProtocol`](crate::io::IoProtocol).

mod board;

pub use board::Board;
