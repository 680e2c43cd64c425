//! Bitcoin-style peer channels.
//!
//! peerwire reads and writes the 24-byte-headed message frames spoken by
//! Bitcoin-family nodes, validates them, dispatches typed messages to
//! subscribers, and tears a connection down through a single stop path.
//!
//! # Crate Structure
//!
//! - [`transport`]: stoppable sockets, peer addresses, TCP accept/connect
//! - [`frame`]: heading codec, checksum, command catalogue, message trait
//! - [`peer`]: the channel engine (behind the `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use peerwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use peerwire_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use peerwire_peer::*;
}
