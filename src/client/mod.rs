//! Connection lifecycle: state machine, events, reconnection.

mod client;
mod events;
mod retry;
mod state;

pub use client::{Client, Connector, Handle, TcpConnector};
pub use events::EventHandlers;
pub use retry::{FixedInterval, ReconnectStrategy};
pub use state::LinkState;
