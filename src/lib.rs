//! # rewsock - Reconnecting WebSocket Client
//!
//! `rewsock` is a client-side WebSocket library built on RFC 6455 framing
//! with automatic reconnection.
//!
//! ## Features
//!
//! - **HTTP upgrade handshake** with `Sec-WebSocket-Accept` verification
//! - **RFC 6455 frame codec** with client-side masking
//! - **Automatic reconnection** at a configurable fixed interval
//! - **Callback-based events** (`open`, `message`, `error`, `close`)
//! - **Pluggable transport** for TLS or in-memory test streams
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rewsock::{Client, ClientConfig};
//!
//! let mut client = Client::new("ws://localhost:9001/chat", ClientConfig::default())?;
//! let handle = client.handle();
//! client.on_open(move || handle.send("hello"));
//! client.on_message(|text| println!("received: {text}"));
//! client.run().await;
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;

pub use client::{Client, Connector, FixedInterval, Handle, LinkState, ReconnectStrategy,
    TcpConnector};
pub use codec::FrameCodec;
pub use config::{ClientConfig, Endpoint, Scheme};
pub use error::{Error, Result};
pub use protocol::{compute_accept_key, Frame, OpCode, WS_GUID};
