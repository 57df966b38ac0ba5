//! The notification vocabulary the orchestrator speaks to the core.
//!
//! Every raw protocol event is converted into exactly one [`SessionEvent`]
//! before it reaches the engine. Console arguments stay unresolved
//! ([`ArgumentHandle`]) until the transcript builder walks its resolution
//! strategies over them.

use crate::console::Severity;
use crate::network::{Headers, ResponseStatus};
use std::fmt;
use thiserror::Error;

/// Why a single resolution strategy could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ResolveError(pub String);

impl ResolveError {
    /// Convenience constructor.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A console argument as handed over by the page session.
///
/// The orchestrator decides what each attempt means for its protocol; the
/// core only decides the order in which they are tried.
pub trait ArgumentHandle: Send {
    /// Resolve to a JSON structure (the argument's serialized value).
    ///
    /// # Errors
    ///
    /// Fails when the value has no serialized form.
    fn structured(&self) -> Result<serde_json::Value, ResolveError>;

    /// Resolve to the argument's text content.
    ///
    /// # Errors
    ///
    /// Fails when no textual form is available.
    fn text_content(&self) -> Result<String, ResolveError>;

    /// Generic string conversion, the last resort.
    ///
    /// # Errors
    ///
    /// Fails only when the handle carries nothing at all.
    fn generic(&self) -> Result<String, ResolveError>;
}

/// Replayed and test events carry plain JSON as their arguments.
impl ArgumentHandle for serde_json::Value {
    fn structured(&self) -> Result<serde_json::Value, ResolveError> {
        Ok(self.clone())
    }

    fn text_content(&self) -> Result<String, ResolveError> {
        Ok(self.to_string())
    }

    fn generic(&self) -> Result<String, ResolveError> {
        Ok(self.to_string())
    }
}

/// One notification from the page session.
pub enum SessionEvent {
    /// `console.*` call.
    Console {
        /// Severity reported by the page
        severity: Severity,
        /// The message text as the page rendered it
        raw_text: String,
        /// Unresolved argument handles, in call order
        args: Vec<Box<dyn ArgumentHandle>>,
    },
    /// Uncaught exception.
    PageError {
        /// Exception message
        message: String,
    },
    /// A request is about to be sent.
    RequestStart {
        /// Request URL
        url: String,
        /// HTTP method
        method: String,
        /// Request headers, in the order sent
        headers: Headers,
        /// Request body, if any
        body: Option<String>,
        /// Resource type (script, stylesheet, image, xhr, ...)
        resource_type: String,
        /// Whether this is a websocket upgrade request
        is_upgrade: bool,
    },
    /// A response arrived.
    Response {
        /// Request URL
        url: String,
        /// HTTP method of the originating request
        method: String,
        /// Status code
        status: ResponseStatus,
        /// Response headers
        headers: Headers,
    },
    /// A request failed before a response arrived.
    RequestFailed {
        /// Request URL
        url: String,
        /// HTTP method
        method: String,
        /// Failure reason reported by the browser
        reason: String,
        /// Resource type
        resource_type: String,
    },
    /// A websocket was opened. `handle` is the orchestrator's own identifier
    /// and is used by the later close/error events.
    WebSocketOpened {
        /// Orchestrator handle
        handle: String,
        /// Socket URL
        url: String,
    },
    /// A websocket closed cleanly.
    WebSocketClosed {
        /// Orchestrator handle from `WebSocketOpened`
        handle: String,
    },
    /// A websocket reported an error.
    WebSocketError {
        /// Orchestrator handle from `WebSocketOpened`
        handle: String,
        /// Error message
        reason: String,
    },
}

impl SessionEvent {
    /// Whether this event belongs to the network stream.
    #[must_use]
    pub fn is_network(&self) -> bool {
        !matches!(self, SessionEvent::Console { .. } | SessionEvent::PageError { .. })
    }
}

impl fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::Console { severity, raw_text, args } => f
                .debug_struct("Console")
                .field("severity", severity)
                .field("raw_text", raw_text)
                .field("args", &args.len())
                .finish(),
            SessionEvent::PageError { message } => {
                f.debug_struct("PageError").field("message", message).finish()
            }
            SessionEvent::RequestStart { url, method, resource_type, is_upgrade, .. } => f
                .debug_struct("RequestStart")
                .field("url", url)
                .field("method", method)
                .field("resource_type", resource_type)
                .field("is_upgrade", is_upgrade)
                .finish_non_exhaustive(),
            SessionEvent::Response { url, method, status, .. } => f
                .debug_struct("Response")
                .field("url", url)
                .field("method", method)
                .field("status", status)
                .finish_non_exhaustive(),
            SessionEvent::RequestFailed { url, method, reason, .. } => f
                .debug_struct("RequestFailed")
                .field("url", url)
                .field("method", method)
                .field("reason", reason)
                .finish_non_exhaustive(),
            SessionEvent::WebSocketOpened { handle, url } => f
                .debug_struct("WebSocketOpened")
                .field("handle", handle)
                .field("url", url)
                .finish(),
            SessionEvent::WebSocketClosed { handle } => {
                f.debug_struct("WebSocketClosed").field("handle", handle).finish()
            }
            SessionEvent::WebSocketError { handle, reason } => f
                .debug_struct("WebSocketError")
                .field("handle", handle)
                .field("reason", reason)
                .finish(),
        }
    }
}
