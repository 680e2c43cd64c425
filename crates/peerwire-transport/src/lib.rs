//! Stoppable socket abstraction for peer channels.
//!
//! Provides the collaborator that a peer channel reads from and writes to:
//! - [`Authority`]: the immutable address of the remote peer
//! - [`Socket`]: a byte stream split into halves that can be stopped once
//! - [`Acceptor`] and [`connect`]: thin TCP establishment helpers
//!
//! This is the lowest layer of peerwire. Everything else builds on top of
//! the [`Socket`] type provided here.

pub mod authority;
pub mod error;
pub mod socket;
pub mod tcp;

pub use authority::Authority;
pub use error::{Result, TransportError};
pub use socket::{BoxedReader, BoxedWriter, Socket};
pub use tcp::{connect, Acceptor};
