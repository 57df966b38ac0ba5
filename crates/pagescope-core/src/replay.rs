//! Recorded sessions.
//!
//! A recording is a JSON-lines file, one notification per line, each
//! stamped with its offset from the start of the window:
//!
//! ```text
//! {"atMs": 0,   "event": "request", "url": "https://site.test/app.js", "resourceType": "script"}
//! {"atMs": 120, "event": "response", "url": "https://site.test/app.js", "status": 200}
//! {"atMs": 130, "event": "console", "severity": "log", "text": "ready", "args": ["ready"]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Replaying drives a
//! [`ManualClock`], so durations and ages come out exactly as recorded.

use crate::clock::ManualClock;
use crate::console::Severity;
use crate::error::{CoreError, Result};
use crate::event::{ArgumentHandle, SessionEvent};
use crate::network::{Headers, ResponseStatus};
use crate::session::Session;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

fn default_method() -> String {
    "GET".to_string()
}

fn default_resource_type() -> String {
    "other".to_string()
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RecordedEvent {
    /// `console.*` call
    Console {
        /// Severity name
        severity: Severity,
        /// Raw message text
        text: String,
        /// Arguments as JSON
        #[serde(default)]
        args: Vec<serde_json::Value>,
    },
    /// Uncaught exception
    PageError {
        /// Exception message
        message: String,
    },
    /// Request start
    Request {
        /// Request URL
        url: String,
        /// HTTP method
        #[serde(default = "default_method")]
        method: String,
        /// Request headers
        #[serde(default)]
        headers: Headers,
        /// Request body
        #[serde(default)]
        body: Option<String>,
        /// Resource type
        #[serde(default = "default_resource_type")]
        resource_type: String,
        /// Upgrade request flag
        #[serde(default)]
        upgrade: bool,
    },
    /// Response
    Response {
        /// Request URL
        url: String,
        /// HTTP method
        #[serde(default = "default_method")]
        method: String,
        /// Status code or sentinel
        status: ResponseStatus,
        /// Response headers
        #[serde(default)]
        headers: Headers,
    },
    /// Request failure
    RequestFailed {
        /// Request URL
        url: String,
        /// HTTP method
        #[serde(default = "default_method")]
        method: String,
        /// Failure reason
        reason: String,
        /// Resource type
        #[serde(default = "default_resource_type")]
        resource_type: String,
    },
    /// Websocket opened
    WebSocketOpened {
        /// Handle used by later events
        handle: String,
        /// Socket URL
        url: String,
    },
    /// Websocket closed
    WebSocketClosed {
        /// Handle from `webSocketOpened`
        handle: String,
    },
    /// Websocket error
    WebSocketError {
        /// Handle from `webSocketOpened`
        handle: String,
        /// Error message
        reason: String,
    },
}

impl From<RecordedEvent> for SessionEvent {
    fn from(event: RecordedEvent) -> Self {
        match event {
            RecordedEvent::Console { severity, text, args } => SessionEvent::Console {
                severity,
                raw_text: text,
                args: args
                    .into_iter()
                    .map(|a| Box::new(a) as Box<dyn ArgumentHandle>)
                    .collect(),
            },
            RecordedEvent::PageError { message } => SessionEvent::PageError { message },
            RecordedEvent::Request { url, method, headers, body, resource_type, upgrade } => {
                SessionEvent::RequestStart { url, method, headers, body, resource_type, is_upgrade: upgrade }
            }
            RecordedEvent::Response { url, method, status, headers } => {
                SessionEvent::Response { url, method, status, headers }
            }
            RecordedEvent::RequestFailed { url, method, reason, resource_type } => {
                SessionEvent::RequestFailed { url, method, reason, resource_type }
            }
            RecordedEvent::WebSocketOpened { handle, url } => SessionEvent::WebSocketOpened { handle, url },
            RecordedEvent::WebSocketClosed { handle } => SessionEvent::WebSocketClosed { handle },
            RecordedEvent::WebSocketError { handle, reason } => {
                SessionEvent::WebSocketError { handle, reason }
            }
        }
    }
}

/// A recorded notification with its offset into the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedLine {
    /// Milliseconds since the window opened
    pub at_ms: i64,
    /// The notification
    #[serde(flatten)]
    pub event: RecordedEvent,
}

/// Parses a JSON-lines recording.
///
/// # Errors
///
/// Returns `InvalidEvent` with the 1-based line number of the first line
/// that does not decode, or that goes back in time.
pub fn parse_recording(input: &str) -> Result<Vec<RecordedLine>> {
    let mut lines = Vec::new();
    let mut last_at = 0;

    for (index, raw) in input.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line: RecordedLine =
            serde_json::from_str(trimmed).map_err(|e| CoreError::InvalidEvent {
                line: index + 1,
                reason: e.to_string(),
            })?;
        if line.at_ms < last_at {
            return Err(CoreError::InvalidEvent {
                line: index + 1,
                reason: format!("atMs {} is earlier than the previous event ({last_at})", line.at_ms),
            });
        }
        last_at = line.at_ms;
        lines.push(line);
    }

    Ok(lines)
}

/// Feeds a recording into `session`, moving `clock` to each event's offset
/// from `start`. Leaves the clock at `start + window_ms`, or at the last
/// event if that is later.
pub fn replay(
    lines: Vec<RecordedLine>,
    start: DateTime<Utc>,
    window_ms: i64,
    clock: &ManualClock,
    session: &mut Session,
) {
    let mut end = window_ms;
    for line in lines {
        clock.set(start + Duration::milliseconds(line.at_ms));
        end = end.max(line.at_ms);
        session.apply(line.event.into());
    }
    clock.set(start + Duration::milliseconds(end));
}
