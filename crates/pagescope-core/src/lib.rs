//! # pagescope-core
//!
//! The capture, correlation and summarization engine behind pagescope.
//!
//! A browser session emits two independent, asynchronous streams: console
//! activity and network traffic. This crate turns those raw notifications into
//! an ordered transcript and a health report. It has no knowledge of how the
//! notifications are produced; the orchestrator (see `pagescope-browser`)
//! converts protocol events into [`SessionEvent`] values and feeds them to a
//! [`Session`].
//!
//! ## Architecture
//!
//! - **format**: bounded rendering of captured values
//! - **console**: ordered console/page-error transcript
//! - **network**: the in-flight and completed exchange ledger
//! - **diagnostics**: pure summarization of a ledger snapshot
//! - **session**: single-owner aggregate that dispatches events
//! - **replay**: JSON-lines recordings fed through a manual clock
//!
//! ## Example
//!
//! ```
//! use pagescope_core::{ManualClock, Session, SummaryPolicy};
//! use pagescope_core::network::Headers;
//! use chrono::{TimeZone, Utc};
//!
//! let clock = ManualClock::new(Utc.timestamp_millis_opt(0).unwrap());
//! let mut session = Session::new(clock.clone());
//!
//! session.network_mut().on_request_start(
//!     "https://example.com/app.js", "GET", Headers::new(), None, "script", false,
//! );
//!
//! let report = session.summarize(&SummaryPolicy::default());
//! assert_eq!(report.counts.pending, 1);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clock;
pub mod console;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod format;
pub mod network;
pub mod replay;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use console::{
    ConsoleClass, ConsoleRecord, ConsoleTranscript, PageErrorRecord, ResolvedArg, Severity,
    TranscriptEntry,
};
pub use diagnostics::{summarize, DiagnosticsReport, SummaryPolicy};
pub use error::{CoreError, Result};
pub use event::{ArgumentHandle, ResolveError, SessionEvent};
pub use format::{format_value, CapturedValue, DEFAULT_MAX_LEN, ELLIPSIS};
pub use network::{
    ExchangeId, ExchangeKind, Headers, LedgerAnomaly, NetworkExchange, NetworkLedger, Outcome,
    ResponseStatus,
};
pub use session::Session;
