//! Error types for browser session operations.
//!
//! Distinguishes the ways an observation can fail before it produces
//! anything: the browser would not start, the DevTools connection dropped,
//! or an event subscription was refused. Once a window is running, problems
//! with individual notifications are never errors; they show up in the
//! transcript or the ledger instead.

use thiserror::Error;

/// The main error type for browser session operations.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Failed to launch the browser process.
    ///
    /// This typically occurs when Chrome/Chromium is not installed,
    /// or when there are permission issues with the executable.
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Subscribing to a protocol event stream failed.
    #[error("could not subscribe to {event} events: {reason}")]
    SubscriptionFailed {
        /// The event that could not be subscribed to
        event: &'static str,
        /// Reason reported by the connection
        reason: String,
    },

    /// An operation was attempted on a closed browser instance.
    #[error("browser instance is already closed")]
    AlreadyClosed,

    /// A DevTools command failed or the connection dropped.
    #[error("CDP connection failed: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),
}

/// A specialized Result type for browser operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_error_names_the_event() {
        let err = BrowserError::SubscriptionFailed {
            event: "Network.responseReceived",
            reason: "target closed".into(),
        };
        assert_eq!(
            err.to_string(),
            "could not subscribe to Network.responseReceived events: target closed"
        );
    }

    #[test]
    fn protocol_errors_convert_into_connection_failures() {
        fn fail() -> Result<()> {
            let sent: std::result::Result<(), chromiumoxide::error::CdpError> =
                Err(chromiumoxide::error::CdpError::NoResponse);
            sent?;
            Ok(())
        }

        let err = fail().unwrap_err();
        assert!(matches!(err, BrowserError::ChromiumOxide(_)));
        assert_eq!(
            err.to_string(),
            "CDP connection failed: Received no response from the chromium instance."
        );
    }
}
