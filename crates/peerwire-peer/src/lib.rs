//! Peer channel engine.
//!
//! A [`Proxy`] owns one connected [`peerwire_transport::Socket`]. It reads
//! framed messages one at a time, rejects anything that violates framing,
//! dispatches parsed messages to typed subscribers, and serializes outbound
//! writes. Every fatal condition ends in a single [`Proxy::stop`], which
//! tells message subscribers the channel is gone, relays the terminal error
//! to stop subscribers exactly once, and closes the socket.

pub mod dispatch;
pub mod error;
pub mod monitor;
pub mod proxy;
pub mod registry;
pub mod settings;
pub mod stop;

pub use dispatch::{SendHandler, WriteSerializer};
pub use error::{Error, Result};
pub use monitor::InactivityMonitor;
pub use proxy::{NoHooks, Proxy, ProxyHooks};
pub use registry::MessageRegistry;
pub use settings::Settings;
pub use stop::StopRegistry;
