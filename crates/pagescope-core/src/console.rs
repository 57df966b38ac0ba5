//! Console transcript building.
//!
//! The transcript is an append-only, arrival-ordered list of console calls
//! and uncaught page errors. Each console argument is resolved through an
//! ordered list of strategies; the first one that succeeds wins and running
//! out of strategies yields a marker, never an error.

use crate::clock::Clock;
use crate::event::ArgumentHandle;
use crate::format::{format_value, CapturedValue, DEFAULT_MAX_LEN};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

/// Rendered in place of an argument no strategy could resolve.
pub const UNRESOLVED_MARKER: &str = "[unresolvable]";

/// The severity of a console message.
///
/// Maps directly to the console method that produced it. Unknown kinds
/// (`table`, `trace`, `dir`, ...) pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    /// `console.log()`
    Log,
    /// `console.warn()`
    Warning,
    /// `console.error()`
    Error,
    /// `console.info()`
    Info,
    /// `console.debug()`
    Debug,
    /// Anything else, by name
    Other(String),
}

/// Display class used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleClass {
    /// Nothing to worry about
    Normal,
    /// Warnings
    Caution,
    /// Errors
    Alert,
}

impl Severity {
    /// Three-way display classification: errors alert, warnings caution,
    /// everything else is normal.
    #[must_use]
    pub fn class(&self) -> ConsoleClass {
        match self {
            Severity::Error => ConsoleClass::Alert,
            Severity::Warning => ConsoleClass::Caution,
            _ => ConsoleClass::Normal,
        }
    }

    /// Returns true if this is an error-level message.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns true if this is a warning or error.
    #[must_use]
    pub fn is_warning_or_error(&self) -> bool {
        matches!(self, Severity::Warning | Severity::Error)
    }

    /// The console method name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Log => "log",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Other(name) => name,
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "log" => Severity::Log,
            "warning" | "warn" => Severity::Warning,
            "error" => Severity::Error,
            "info" => Severity::Info,
            "debug" => Severity::Debug,
            other => Severity::Other(other.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Severity::from(s.as_str())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

/// Which strategy produced an argument's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// [`ArgumentHandle::structured`]
    Structured,
    /// [`ArgumentHandle::text_content`]
    TextContent,
    /// [`ArgumentHandle::generic`]
    Generic,
}

/// Strategies in the order they are attempted.
pub const RESOLUTION_ORDER: [ResolutionStrategy; 3] = [
    ResolutionStrategy::Structured,
    ResolutionStrategy::TextContent,
    ResolutionStrategy::Generic,
];

/// A console argument after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "via", content = "value", rename_all = "camelCase")]
pub enum ResolvedArg {
    /// Structured JSON value
    Structured(serde_json::Value),
    /// Text content
    Text(String),
    /// Generic string conversion
    Generic(String),
    /// Every strategy failed
    Unresolved,
}

impl ResolvedArg {
    /// Renders the argument, bounded to `max_len`.
    #[must_use]
    pub fn render(&self, max_len: usize) -> String {
        match self {
            ResolvedArg::Structured(value) => {
                format_value(&CapturedValue::Json(value.clone()), max_len)
            }
            ResolvedArg::Text(text) => format_value(&CapturedValue::Text(text.clone()), max_len),
            ResolvedArg::Generic(text) => {
                format_value(&CapturedValue::Opaque(text.clone()), max_len)
            }
            ResolvedArg::Unresolved => UNRESOLVED_MARKER.to_string(),
        }
    }
}

/// Walks [`RESOLUTION_ORDER`] over one handle.
#[must_use]
pub fn resolve_argument(handle: &dyn ArgumentHandle) -> ResolvedArg {
    for strategy in RESOLUTION_ORDER {
        let attempt = match strategy {
            ResolutionStrategy::Structured => handle.structured().map(ResolvedArg::Structured),
            ResolutionStrategy::TextContent => handle.text_content().map(ResolvedArg::Text),
            ResolutionStrategy::Generic => handle.generic().map(ResolvedArg::Generic),
        };
        match attempt {
            Ok(resolved) => return resolved,
            Err(e) => trace!(?strategy, reason = %e, "argument resolution strategy failed"),
        }
    }
    ResolvedArg::Unresolved
}

/// One console call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleRecord {
    /// Severity level
    pub severity: Severity,
    /// Message text exactly as the page rendered it
    pub raw_text: String,
    /// Resolved arguments, in call order
    pub args: Vec<ResolvedArg>,
    /// Display text (raw text, plus formatted arguments when they add
    /// information)
    pub text: String,
    /// When the notification was observed
    pub observed_at: DateTime<Utc>,
}

impl ConsoleRecord {
    /// Display class for this record.
    #[must_use]
    pub fn class(&self) -> ConsoleClass {
        self.severity.class()
    }
}

/// One uncaught exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageErrorRecord {
    /// Exception message
    pub message: String,
    /// When the notification was observed
    pub observed_at: DateTime<Utc>,
}

/// A transcript line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TranscriptEntry {
    /// From a console call
    Console(ConsoleRecord),
    /// From an uncaught exception
    PageError(PageErrorRecord),
}

impl TranscriptEntry {
    /// Display class. Page errors always alert.
    #[must_use]
    pub fn class(&self) -> ConsoleClass {
        match self {
            TranscriptEntry::Console(record) => record.class(),
            TranscriptEntry::PageError(_) => ConsoleClass::Alert,
        }
    }

    /// The text to display.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            TranscriptEntry::Console(record) => &record.text,
            TranscriptEntry::PageError(record) => &record.message,
        }
    }

    /// When the entry was observed.
    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        match self {
            TranscriptEntry::Console(record) => record.observed_at,
            TranscriptEntry::PageError(record) => record.observed_at,
        }
    }
}

/// Accumulates console and page-error records in arrival order.
///
/// Owned by exactly one session; the only way in is through the `on_*`
/// methods and the only way out is a snapshot.
pub struct ConsoleTranscript {
    entries: Vec<TranscriptEntry>,
    clock: Arc<dyn Clock>,
    max_len: usize,
}

impl ConsoleTranscript {
    /// Creates an empty transcript that timestamps with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Vec::new(),
            clock,
            max_len: DEFAULT_MAX_LEN,
        }
    }

    /// Overrides the per-argument render limit.
    #[must_use]
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Records a console call.
    pub fn on_console_event(
        &mut self,
        severity: Severity,
        raw_text: impl Into<String>,
        args: &[Box<dyn ArgumentHandle>],
    ) {
        let raw_text = raw_text.into();
        let args: Vec<ResolvedArg> = args.iter().map(|a| resolve_argument(a.as_ref())).collect();
        let text = display_text(&raw_text, &args, self.max_len);

        self.entries.push(TranscriptEntry::Console(ConsoleRecord {
            severity,
            raw_text,
            args,
            text,
            observed_at: self.clock.now(),
        }));
    }

    /// Records an uncaught exception.
    pub fn on_page_error(&mut self, message: impl Into<String>) {
        self.entries.push(TranscriptEntry::PageError(PageErrorRecord {
            message: message.into(),
            observed_at: self.clock.now(),
        }));
    }

    /// The transcript so far, in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }

    /// Borrowed view of the entries.
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Console records with the given severity.
    #[must_use]
    pub fn with_severity(&self, severity: &Severity) -> Vec<&ConsoleRecord> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TranscriptEntry::Console(record) if &record.severity == severity => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Console errors plus page errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.class() == ConsoleClass::Alert)
            .count()
    }

    /// Console warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.class() == ConsoleClass::Caution)
            .count()
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Appends the formatted arguments to the raw text unless the first
/// argument already reads the same as the raw text. The raw text and each
/// argument are bounded to `max_len` independently.
fn display_text(raw_text: &str, args: &[ResolvedArg], max_len: usize) -> String {
    let bounded_raw = format_value(&CapturedValue::Text(raw_text.to_string()), max_len);
    match args.first() {
        Some(first) if first.render(usize::MAX) != raw_text => {
            let formatted: Vec<String> = args.iter().map(|a| a.render(max_len)).collect();
            format!("{bounded_raw} {}", formatted.join(" "))
        }
        _ => bounded_raw,
    }
}
