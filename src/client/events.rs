//! Event handler slots and dispatch.
//!
//! Handlers run inside the client's task. Dispatch goes through a panic
//! boundary so a misbehaving handler cannot corrupt the state machine; a
//! handler panic is reported through the error slot.

use std::panic::{AssertUnwindSafe, catch_unwind};

type OpenFn = Box<dyn FnMut() + Send>;
type MessageFn = Box<dyn FnMut(&str) + Send>;
type ErrorFn = Box<dyn FnMut(&str) + Send>;
type CloseFn = Box<dyn FnMut(bool, u16, &str) + Send>;

/// User-assignable callback slots. All default to no-ops.
#[derive(Default)]
pub struct EventHandlers {
    on_open: Option<OpenFn>,
    on_message: Option<MessageFn>,
    on_error: Option<ErrorFn>,
    on_close: Option<CloseFn>,
}

impl EventHandlers {
    /// Create handlers with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handler invoked once per successful handshake.
    pub fn set_on_open(&mut self, f: impl FnMut() + Send + 'static) {
        self.on_open = Some(Box::new(f));
    }

    /// Set the handler for incoming text messages.
    pub fn set_on_message(&mut self, f: impl FnMut(&str) + Send + 'static) {
        self.on_message = Some(Box::new(f));
    }

    /// Set the handler for recoverable errors.
    pub fn set_on_error(&mut self, f: impl FnMut(&str) + Send + 'static) {
        self.on_error = Some(Box::new(f));
    }

    /// Set the handler invoked once per departure from the open state:
    /// `(was_clean, code, reason)`.
    pub fn set_on_close(&mut self, f: impl FnMut(bool, u16, &str) + Send + 'static) {
        self.on_close = Some(Box::new(f));
    }

    pub(crate) fn open(&mut self) {
        let panicked = match self.on_open.as_mut() {
            Some(cb) => catch_unwind(AssertUnwindSafe(|| cb())).is_err(),
            None => false,
        };
        if panicked {
            self.handler_panicked("open");
        }
    }

    pub(crate) fn message(&mut self, text: &str) {
        let panicked = match self.on_message.as_mut() {
            Some(cb) => catch_unwind(AssertUnwindSafe(|| cb(text))).is_err(),
            None => false,
        };
        if panicked {
            self.handler_panicked("message");
        }
    }

    pub(crate) fn error(&mut self, message: &str) {
        let panicked = match self.on_error.as_mut() {
            Some(cb) => catch_unwind(AssertUnwindSafe(|| cb(message))).is_err(),
            None => false,
        };
        if panicked {
            // The error slot itself failed; nowhere left to report.
            tracing::error!("error handler panicked");
        }
    }

    pub(crate) fn close(&mut self, was_clean: bool, code: u16, reason: &str) {
        let panicked = match self.on_close.as_mut() {
            Some(cb) => catch_unwind(AssertUnwindSafe(|| cb(was_clean, code, reason))).is_err(),
            None => false,
        };
        if panicked {
            self.handler_panicked("close");
        }
    }

    fn handler_panicked(&mut self, which: &str) {
        tracing::error!(handler = which, "event handler panicked");
        self.error(&format!("{which} handler panicked"));
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_message", &self.on_message.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}
