use std::future::Future;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::client::events::EventHandlers;
use crate::client::retry::{FixedInterval, ReconnectStrategy};
use crate::client::state::LinkState;
use crate::codec::FrameCodec;
use crate::config::{ClientConfig, Endpoint};
use crate::error::{Error, Result};
use crate::protocol::{
    CLOSE_ABNORMAL, CLOSE_NORMAL, ClientHandshake, Frame, HandshakeResponse, OpCode,
};

/// Transport used to establish the underlying byte stream.
///
/// The client owns connection lifecycle and framing; the connector only
/// produces a fresh stream per attempt. Swap it out for TLS transports or
/// scripted streams in tests.
pub trait Connector: Send {
    /// The stream type produced by a successful connect.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Establish a new connection to `host:port`.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = std::io::Result<Self::Stream>> + Send;
}

/// Plain TCP connector backed by [`tokio::net::TcpStream`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&mut self, host: &str, port: u16) -> std::io::Result<TcpStream> {
        TcpStream::connect((host, port)).await
    }
}

enum Command {
    Send(String),
    Close(u16, String),
}

/// Cheap, cloneable handle for talking to a running [`Client`].
///
/// Commands are queued on an unbounded channel and processed by the client
/// task; they never block the caller.
#[derive(Debug, Clone)]
pub struct Handle {
    tx: mpsc::UnboundedSender<Command>,
}

impl Handle {
    /// Queue a text message for sending.
    ///
    /// If the connection is not open when the command is processed, the
    /// message is dropped and reported through `on_error`.
    pub fn send(&self, text: impl Into<String>) {
        let _ = self.tx.send(Command::Send(text.into()));
    }

    /// Request a permanent close with the given status code and reason.
    ///
    /// Cancels any pending reconnect; the client's `run()` returns after
    /// processing this.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.tx.send(Command::Close(code, reason.into()));
    }
}

enum SessionEvent {
    Frame(Result<Frame>),
    Cmd(Command),
}

/// A WebSocket client with automatic reconnection.
///
/// The client runs as a single cooperative task: `run()` connects, performs
/// the upgrade handshake, then loops over incoming frames and queued
/// commands. Any failure falls back to a fixed-interval reconnect until
/// [`Handle::close`] permanently shuts it down.
///
/// ## Example
///
/// ```rust,ignore
/// use rewsock::{Client, ClientConfig};
///
/// let mut client = Client::new("ws://localhost:9001/chat", ClientConfig::default())?;
/// let handle = client.handle();
/// client.on_message(|text| println!("received: {text}"));
/// client.on_open(move || handle.send("hello"));
/// client.run().await;
/// ```
pub struct Client<C: Connector = TcpConnector> {
    endpoint: Endpoint,
    config: ClientConfig,
    connector: C,
    state: LinkState,
    should_reconnect: bool,
    retry: Box<dyn ReconnectStrategy>,
    handlers: EventHandlers,
    cmd_tx: mpsc::UnboundedSender<Command>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
}

impl Client<TcpConnector> {
    /// Create a client for a `ws://` or `wss://` URL over plain TCP.
    ///
    /// Note that `wss` URLs only affect the default port here; supply a
    /// TLS-capable [`Connector`] via [`Client::with_connector`] to actually
    /// encrypt the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed. This is
    /// the only error surfaced synchronously; everything later flows through
    /// the event handlers.
    pub fn new(url: &str, config: ClientConfig) -> Result<Self> {
        Self::with_connector(url, config, TcpConnector)
    }
}

impl<C: Connector> Client<C> {
    /// Create a client with a custom transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the URL cannot be parsed.
    pub fn with_connector(url: &str, config: ClientConfig, connector: C) -> Result<Self> {
        let endpoint = Endpoint::parse(url)?;
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let retry = Box::new(FixedInterval::new(config.retry_interval));
        Ok(Self {
            endpoint,
            config,
            connector,
            state: LinkState::Disconnected,
            should_reconnect: true,
            retry,
            handlers: EventHandlers::new(),
            cmd_tx,
            cmd_rx,
        })
    }

    /// Replace the reconnect strategy (default: fixed interval from config).
    #[must_use]
    pub fn with_retry_strategy(mut self, strategy: impl ReconnectStrategy + 'static) -> Self {
        self.retry = Box::new(strategy);
        self
    }

    /// Handle for sending messages and closing from outside the run loop.
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle {
            tx: self.cmd_tx.clone(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The parsed endpoint this client connects to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Set the handler invoked once per successful handshake.
    pub fn on_open(&mut self, f: impl FnMut() + Send + 'static) {
        self.handlers.set_on_open(f);
    }

    /// Set the handler for incoming text messages.
    pub fn on_message(&mut self, f: impl FnMut(&str) + Send + 'static) {
        self.handlers.set_on_message(f);
    }

    /// Set the handler for recoverable errors.
    pub fn on_error(&mut self, f: impl FnMut(&str) + Send + 'static) {
        self.handlers.set_on_error(f);
    }

    /// Set the handler invoked once per departure from the open state:
    /// `(was_clean, code, reason)`.
    pub fn on_close(&mut self, f: impl FnMut(bool, u16, &str) + Send + 'static) {
        self.handlers.set_on_close(f);
    }

    /// Drive the client until it is permanently closed.
    ///
    /// Connects, retries on failure at the configured interval, and returns
    /// only after [`Handle::close`] has been processed. Calling `run` again
    /// after a permanent close is a no-op.
    pub async fn run(&mut self) {
        if !self.state.can_connect() {
            tracing::warn!(state = %self.state, "run() ignored: client already started or closed");
            return;
        }

        while self.should_reconnect && !self.state.is_terminal() {
            self.attempt().await;
            if self.state.is_terminal() || !self.should_reconnect {
                break;
            }
            self.wait_retry().await;
        }

        self.state = LinkState::PermanentlyClosed;
        tracing::info!(endpoint = %self.endpoint, "client stopped");
    }

    /// One connection attempt: connect, handshake, then the open session.
    /// Leaves `state` at `Disconnected` on failure or peer close, and at
    /// `PermanentlyClosed` after a local close.
    async fn attempt(&mut self) {
        if self.reject_pending_commands() {
            return;
        }
        self.state = LinkState::Connecting;
        tracing::info!(endpoint = %self.endpoint, "connecting");

        let stream = match self
            .connector
            .connect(&self.endpoint.host, self.endpoint.port)
            .await
        {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "connect failed");
                self.handlers.error(&format!("connect failed: {e}"));
                self.state = LinkState::Disconnected;
                return;
            }
        };

        self.state = LinkState::HandshakeInFlight;
        let mut codec = match self.upgrade(stream).await {
            Ok(codec) => codec,
            Err(e) => {
                tracing::warn!(error = %e, "handshake failed");
                self.handlers.error(&format!("handshake failed: {e}"));
                self.state = LinkState::Disconnected;
                return;
            }
        };

        // Commands that arrived during connect/handshake predate the open
        // state and must not reach the fresh connection.
        if self.reject_pending_commands() {
            return;
        }

        self.state = LinkState::Open;
        self.retry.reset();
        tracing::info!(endpoint = %self.endpoint, "connection open");
        self.handlers.open();

        self.session(&mut codec).await;
    }

    /// Send the upgrade request and validate the response, returning a codec
    /// seeded with any frame bytes that arrived past the header terminator.
    async fn upgrade(&mut self, mut stream: C::Stream) -> Result<FrameCodec<C::Stream>> {
        let handshake = ClientHandshake::generate();
        let request = handshake.request(&self.endpoint.authority(), &self.endpoint.path);
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;

        let (head, leftover) =
            read_response_head(&mut stream, self.config.max_handshake_size).await?;
        let response = HandshakeResponse::parse(&head)?;
        handshake.verify(&response)?;

        Ok(FrameCodec::with_leftover(stream, &self.config, leftover))
    }

    /// The open-state loop: frame reads and queued commands, strictly
    /// interleaved on one task. Frame reads are sequential; the codec buffer
    /// makes the read future safe to drop at the select point.
    async fn session<T: AsyncRead + AsyncWrite + Unpin>(&mut self, codec: &mut FrameCodec<T>) {
        loop {
            let event = tokio::select! {
                frame = codec.read_frame() => SessionEvent::Frame(frame),
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(cmd) => SessionEvent::Cmd(cmd),
                    // The client keeps a sender alive, so this cannot fire;
                    // treat it as a lost connection if it ever does.
                    None => SessionEvent::Frame(Err(Error::ConnectionClosed(None))),
                },
            };

            match event {
                SessionEvent::Frame(Ok(frame)) => match frame.opcode {
                    OpCode::Text => match String::from_utf8(frame.into_payload()) {
                        Ok(text) => self.handlers.message(&text),
                        Err(_) => {
                            self.abnormal_close("invalid UTF-8 in text frame");
                            return;
                        }
                    },
                    OpCode::Close => {
                        let code = frame.close_code().unwrap_or(CLOSE_NORMAL);
                        let reason = frame.close_reason().unwrap_or("Normal closure").to_string();
                        // Echo the close frame; the connection is going away
                        // either way, so a failure here is not an error.
                        let _ = codec.write_frame(&Frame::close(code, "")).await;
                        tracing::info!(code, "peer closed connection");
                        self.handlers.close(true, code, &reason);
                        self.state = LinkState::Disconnected;
                        return;
                    }
                    other => {
                        tracing::debug!(opcode = %other, "ignoring frame");
                    }
                },
                SessionEvent::Frame(Err(e)) => {
                    self.abnormal_close(&format!("read failed: {e}"));
                    return;
                }
                SessionEvent::Cmd(Command::Send(text)) => {
                    match codec.write_frame(&Frame::text(text.into_bytes())).await {
                        Ok(()) => {}
                        Err(e @ Error::UnsupportedFrameLength(_)) => {
                            // Encoding failure: drop the message, keep the
                            // connection.
                            self.handlers.error(&format!("send failed: {e}"));
                        }
                        Err(e) => {
                            self.abnormal_close(&format!("write failed: {e}"));
                            return;
                        }
                    }
                }
                SessionEvent::Cmd(Command::Close(code, reason)) => {
                    self.state = LinkState::Closing;
                    if let Err(e) = codec.write_frame(&Frame::close(code, &reason)).await {
                        tracing::warn!(error = %e, "failed to send close frame");
                    }
                    self.handlers.close(true, code, &reason);
                    self.should_reconnect = false;
                    self.state = LinkState::PermanentlyClosed;
                    tracing::info!(code, "connection permanently closed");
                    return;
                }
            }
        }
    }

    /// Drain commands that arrived while no connection was open. Sends are
    /// dropped and reported through `on_error`, never queued for the next
    /// session; a close terminates the client. Returns true on close.
    fn reject_pending_commands(&mut self) -> bool {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(Command::Send(_)) => {
                    self.handlers.error(&Error::NotConnected.to_string());
                }
                Ok(Command::Close(..)) => {
                    self.should_reconnect = false;
                    self.state = LinkState::PermanentlyClosed;
                    tracing::info!("close requested: connection attempt cancelled");
                    return true;
                }
                Err(_) => return false,
            }
        }
    }

    /// The connection was lost without a close exchange: report the error,
    /// fire the single close event for this session, fall back to
    /// `Disconnected` so the retry loop takes over.
    fn abnormal_close(&mut self, message: &str) {
        tracing::warn!(message, "abnormal closure");
        self.handlers.error(message);
        self.handlers.close(false, CLOSE_ABNORMAL, "Abnormal closure");
        self.state = LinkState::Disconnected;
    }

    /// Sleep out the retry interval while still servicing commands: sends
    /// are rejected, a close cancels the pending reconnect.
    async fn wait_retry(&mut self) {
        let delay = self.retry.next_delay();
        tracing::debug!(?delay, "reconnect timer armed");
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            let cmd = tokio::select! {
                () = &mut sleep => return,
                cmd = self.cmd_rx.recv() => cmd,
            };
            match cmd {
                Some(Command::Send(_)) => {
                    self.handlers.error(&Error::NotConnected.to_string());
                }
                Some(Command::Close(..)) | None => {
                    self.should_reconnect = false;
                    self.state = LinkState::PermanentlyClosed;
                    tracing::info!("close requested: reconnect cancelled");
                    return;
                }
            }
        }
    }
}

/// Read the HTTP response head until the blank-line terminator, bounded by
/// `max_size`. Returns the head bytes and anything read past the terminator.
async fn read_response_head<T: AsyncRead + Unpin>(
    io: &mut T,
    max_size: usize,
) -> Result<(BytesMut, BytesMut)> {
    let mut buf = BytesMut::with_capacity(1024);
    loop {
        if let Some(end) = find_terminator(&buf) {
            let leftover = buf.split_off(end);
            return Ok((buf, leftover));
        }
        if buf.len() >= max_size {
            return Err(Error::InvalidHandshake(format!(
                "response exceeds {max_size} bytes"
            )));
        }
        let n = io.read_buf(&mut buf).await?;
        if n == 0 {
            return Err(Error::InvalidHandshake(
                "connection closed before response completed".into(),
            ));
        }
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|p| p + 4)
}
