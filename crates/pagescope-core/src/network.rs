//! The network ledger: in-flight and completed exchanges.
//!
//! Response and failure notifications do not carry a request identity, so
//! they are correlated by `(url, method)` plus arrival order. For a given key
//! the earliest still-pending exchange is matched first (FIFO per key).
//! Several requests to one endpoint may be in flight at once (polling,
//! retries); responses are not assumed to alternate with requests.
//!
//! Invariants:
//! - one exchange per request-start notification, never merged
//! - an outcome moves out of `Pending` at most once
//! - terminal exchanges are never touched again

use crate::clock::Clock;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered header map.
pub type Headers = IndexMap<String, String>;

/// Status sentinel used when a websocket closes cleanly.
pub const WEBSOCKET_CLOSED: &str = "CLOSED";

/// URL recorded for exchanges whose request was never seen.
pub const UNKNOWN_URL: &str = "<unknown>";

/// Opaque handle to an exchange, valid for the ledger that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(usize);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of traffic an exchange represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExchangeKind {
    /// Ordinary HTTP request
    Http,
    /// HTTP request asking for a protocol upgrade
    WebsocketUpgrade,
    /// An open websocket connection
    Websocket,
}

/// A response status: a numeric HTTP code or a textual sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseStatus {
    /// HTTP status code
    Code(u16),
    /// Sentinel such as `CLOSED`
    Label(String),
}

impl ResponseStatus {
    /// The numeric code, if this is one.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match self {
            ResponseStatus::Code(code) => Some(*code),
            ResponseStatus::Label(_) => None,
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Code(code) => write!(f, "{code}"),
            ResponseStatus::Label(label) => f.write_str(label),
        }
    }
}

impl From<u16> for ResponseStatus {
    fn from(code: u16) -> Self {
        ResponseStatus::Code(code)
    }
}

/// The request half of an exchange. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Request headers, in the order sent
    pub headers: Headers,
    /// Request body, if any
    pub body: Option<String>,
    /// Resource type as reported by the browser
    pub resource_type: String,
    /// When the request started
    pub started_at: DateTime<Utc>,
}

/// Where an exchange ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Outcome {
    /// Still waiting
    Pending,
    /// A response arrived
    #[serde(rename_all = "camelCase")]
    Completed {
        /// Status code or sentinel
        status: ResponseStatus,
        /// Response headers
        headers: Headers,
        /// Time from request start to response
        duration_ms: i64,
    },
    /// The request failed
    Failed {
        /// Failure reason
        reason: String,
    },
}

impl Outcome {
    /// Returns true while no outcome has been recorded.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }
}

/// One tracked request and its eventual outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkExchange {
    /// Ledger handle
    pub id: ExchangeId,
    /// Request URL
    pub url: String,
    /// HTTP method, upper-cased
    pub method: String,
    /// Exchange kind
    pub kind: ExchangeKind,
    /// The request
    pub request: RequestInfo,
    /// The outcome so far
    pub outcome: Outcome,
}

impl NetworkExchange {
    /// Returns true while the exchange has no outcome.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.outcome.is_pending()
    }
}

/// The `(url, method)` pair used to correlate outcomes with requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    url: String,
    method: String,
}

impl CorrelationKey {
    /// Builds a key. Methods compare case-insensitively.
    #[must_use]
    pub fn new(url: &str, method: &str) -> Self {
        Self {
            url: url.to_string(),
            method: method.to_ascii_uppercase(),
        }
    }
}

/// A notification that could not be correlated cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerAnomaly {
    /// A response with no pending request; dropped.
    UnmatchedResponse {
        /// Response URL
        url: String,
        /// Request method
        method: String,
        /// Status that was dropped
        status: ResponseStatus,
    },
    /// A failure with no pending request; recorded as a new failed exchange.
    SynthesizedFailure {
        /// The exchange that was created
        id: ExchangeId,
        /// Request URL
        url: String,
        /// Failure reason
        reason: String,
    },
    /// A websocket notification named an exchange the ledger never issued.
    UnknownExchange {
        /// The unknown handle
        id: ExchangeId,
    },
    /// A websocket close or error named a handle that was never opened.
    UnknownSocket {
        /// The orchestrator's handle
        handle: String,
        /// The failed exchange recorded for an error, if any
        id: Option<ExchangeId>,
    },
    /// An outcome arrived for an exchange that already had one.
    AlreadyTerminal {
        /// The terminal exchange
        id: ExchangeId,
    },
}

/// Owns every exchange observed during one window.
pub struct NetworkLedger {
    exchanges: Vec<NetworkExchange>,
    pending_by_key: FxHashMap<CorrelationKey, VecDeque<ExchangeId>>,
    anomalies: Vec<LedgerAnomaly>,
    clock: Arc<dyn Clock>,
}

impl NetworkLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            exchanges: Vec::new(),
            pending_by_key: FxHashMap::default(),
            anomalies: Vec::new(),
            clock,
        }
    }

    /// Records a new request. Always creates a fresh pending exchange, even
    /// when another exchange with the same key is still in flight.
    pub fn on_request_start(
        &mut self,
        url: impl Into<String>,
        method: &str,
        headers: Headers,
        body: Option<String>,
        resource_type: impl Into<String>,
        is_upgrade: bool,
    ) -> ExchangeId {
        let url = url.into();
        let key = CorrelationKey::new(&url, method);
        let kind = if is_upgrade {
            ExchangeKind::WebsocketUpgrade
        } else {
            ExchangeKind::Http
        };

        let id = self.push(url, key.method.clone(), kind, headers, body, resource_type.into(), Outcome::Pending);
        self.pending_by_key.entry(key).or_default().push_back(id);
        id
    }

    /// Completes the earliest pending exchange for `(url, method)`.
    ///
    /// Unmatched responses are dropped and noted as anomalies. Returns the
    /// exchange that was completed, if any.
    pub fn on_response(
        &mut self,
        url: &str,
        method: &str,
        status: ResponseStatus,
        headers: Headers,
    ) -> Option<ExchangeId> {
        let key = CorrelationKey::new(url, method);
        let Some(id) = self.match_earliest_pending(&key) else {
            debug!(url, method, %status, "dropping response with no pending request");
            self.anomalies.push(LedgerAnomaly::UnmatchedResponse {
                url: url.to_string(),
                method: key.method,
                status,
            });
            return None;
        };

        let started_at = self.exchanges[id.0].request.started_at;
        let duration_ms = (self.clock.now() - started_at).num_milliseconds().max(0);
        self.transition(id, Outcome::Completed { status, headers, duration_ms });
        Some(id)
    }

    /// Fails the earliest pending exchange for `(url, method)`.
    ///
    /// A failure with nothing to match is still recorded, as a new exchange
    /// that is already failed. Returns the exchange that now holds the
    /// failure.
    pub fn on_request_failed(
        &mut self,
        url: &str,
        method: &str,
        reason: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> ExchangeId {
        let reason = reason.into();
        let key = CorrelationKey::new(url, method);

        if let Some(id) = self.match_earliest_pending(&key) {
            self.transition(id, Outcome::Failed { reason });
            return id;
        }

        let id = self.push(
            url.to_string(),
            key.method,
            ExchangeKind::Http,
            Headers::new(),
            None,
            resource_type.into(),
            Outcome::Failed { reason: reason.clone() },
        );
        debug!(url, %id, "synthesized failed exchange for unmatched failure");
        self.anomalies.push(LedgerAnomaly::SynthesizedFailure {
            id,
            url: url.to_string(),
            reason,
        });
        id
    }

    /// Records a websocket connection. The capability does not expose the
    /// literal upgrade request, so its headers are synthesized.
    pub fn on_websocket_open(&mut self, url: impl Into<String>) -> ExchangeId {
        let headers: Headers = [
            ("Upgrade", "websocket"),
            ("Connection", "Upgrade"),
            ("Sec-WebSocket-Version", "13"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        self.push(
            url.into(),
            "GET".to_string(),
            ExchangeKind::Websocket,
            headers,
            None,
            "websocket".to_string(),
            Outcome::Pending,
        )
    }

    /// Marks a websocket as closed.
    pub fn on_websocket_closed(&mut self, id: ExchangeId) {
        let duration_ms = self
            .exchanges
            .get(id.0)
            .map_or(0, |e| (self.clock.now() - e.request.started_at).num_milliseconds().max(0));
        self.transition(
            id,
            Outcome::Completed {
                status: ResponseStatus::Label(WEBSOCKET_CLOSED.to_string()),
                headers: Headers::new(),
                duration_ms,
            },
        );
    }

    /// Marks a websocket as failed.
    pub fn on_websocket_error(&mut self, id: ExchangeId, reason: impl Into<String>) {
        self.transition(id, Outcome::Failed { reason: reason.into() });
    }

    /// Notes a close for a websocket handle that was never opened. There is
    /// nothing to complete, so only the anomaly is kept.
    pub fn on_unknown_socket_closed(&mut self, handle: impl Into<String>) {
        let handle = handle.into();
        debug!(%handle, "close for a websocket that was never opened");
        self.anomalies.push(LedgerAnomaly::UnknownSocket { handle, id: None });
    }

    /// Records an error for a websocket handle that was never opened as a
    /// new websocket exchange that is already failed.
    pub fn on_unknown_socket_error(
        &mut self,
        handle: impl Into<String>,
        reason: impl Into<String>,
    ) -> ExchangeId {
        let handle = handle.into();
        let id = self.push(
            UNKNOWN_URL.to_string(),
            "GET".to_string(),
            ExchangeKind::Websocket,
            Headers::new(),
            None,
            "websocket".to_string(),
            Outcome::Failed { reason: reason.into() },
        );
        debug!(%handle, %id, "synthesized failed exchange for unknown websocket");
        self.anomalies.push(LedgerAnomaly::UnknownSocket { handle, id: Some(id) });
        id
    }

    /// The exchange the next response for `key` would complete, if any.
    ///
    /// Read-only; matching itself stays inside the ledger.
    #[must_use]
    pub fn earliest_pending(&self, key: &CorrelationKey) -> Option<ExchangeId> {
        self.pending_by_key
            .get(key)?
            .iter()
            .copied()
            .find(|id| self.exchanges[id.0].is_pending())
    }

    /// The earliest exchange for `key` that is still pending, removed from
    /// the key's queue.
    ///
    /// Ties between in-flight duplicates are broken by creation order:
    /// the first request started is the first one matched.
    pub(crate) fn match_earliest_pending(&mut self, key: &CorrelationKey) -> Option<ExchangeId> {
        let queue = self.pending_by_key.get_mut(key)?;
        let mut found = None;
        while let Some(id) = queue.pop_front() {
            if self.exchanges[id.0].is_pending() {
                found = Some(id);
                break;
            }
        }
        if queue.is_empty() {
            self.pending_by_key.remove(key);
        }
        found
    }

    /// Every exchange, in creation order.
    #[must_use]
    pub fn snapshot(&self) -> &[NetworkExchange] {
        &self.exchanges
    }

    /// Looks up one exchange.
    #[must_use]
    pub fn get(&self, id: ExchangeId) -> Option<&NetworkExchange> {
        self.exchanges.get(id.0)
    }

    /// Correlation anomalies, in the order they happened.
    #[must_use]
    pub fn anomalies(&self) -> &[LedgerAnomaly] {
        &self.anomalies
    }

    /// Number of exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        url: String,
        method: String,
        kind: ExchangeKind,
        headers: Headers,
        body: Option<String>,
        resource_type: String,
        outcome: Outcome,
    ) -> ExchangeId {
        let id = ExchangeId(self.exchanges.len());
        self.exchanges.push(NetworkExchange {
            id,
            url,
            method,
            kind,
            request: RequestInfo {
                headers,
                body,
                resource_type,
                started_at: self.clock.now(),
            },
            outcome,
        });
        id
    }

    fn transition(&mut self, id: ExchangeId, outcome: Outcome) {
        let Some(exchange) = self.exchanges.get_mut(id.0) else {
            warn!(%id, "outcome for unknown exchange");
            self.anomalies.push(LedgerAnomaly::UnknownExchange { id });
            return;
        };
        if !exchange.is_pending() {
            debug!(%id, url = %exchange.url, "ignoring outcome for terminal exchange");
            self.anomalies.push(LedgerAnomaly::AlreadyTerminal { id });
            return;
        }
        exchange.outcome = outcome;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn ledger() -> (NetworkLedger, ManualClock) {
        let clock = ManualClock::new(Utc.timestamp_millis_opt(10_000).unwrap());
        (NetworkLedger::new(Arc::new(clock.clone())), clock)
    }

    fn start(ledger: &mut NetworkLedger, url: &str) -> ExchangeId {
        ledger.on_request_start(url, "GET", Headers::new(), None, "fetch", false)
    }

    fn status_of(ledger: &NetworkLedger, id: ExchangeId) -> Option<ResponseStatus> {
        match &ledger.get(id).unwrap().outcome {
            Outcome::Completed { status, .. } => Some(status.clone()),
            _ => None,
        }
    }

    #[test]
    fn duplicate_requests_are_tracked_separately() {
        let (mut l, _) = ledger();
        let a = start(&mut l, "https://api.test/poll");
        let b = start(&mut l, "https://api.test/poll");

        assert_ne!(a, b);
        assert_eq!(l.len(), 2);
        assert!(l.snapshot().iter().all(NetworkExchange::is_pending));
    }

    #[test]
    fn responses_match_fifo_per_key() {
        let (mut l, _) = ledger();
        let first = start(&mut l, "https://api.test/poll");
        let second = start(&mut l, "https://api.test/poll");

        l.on_response("https://api.test/poll", "GET", ResponseStatus::Code(200), Headers::new());
        assert_eq!(status_of(&l, first), Some(ResponseStatus::Code(200)));
        assert!(l.get(second).unwrap().is_pending());

        l.on_response("https://api.test/poll", "GET", ResponseStatus::Code(503), Headers::new());
        assert_eq!(status_of(&l, second), Some(ResponseStatus::Code(503)));
    }

    #[test]
    fn looking_up_the_next_match_does_not_consume_it() {
        let (mut l, _) = ledger();
        let key = CorrelationKey::new("https://api.test/poll", "get");
        assert_eq!(l.earliest_pending(&key), None);

        let first = start(&mut l, "https://api.test/poll");
        let second = start(&mut l, "https://api.test/poll");
        assert_eq!(l.earliest_pending(&key), Some(first));
        assert_eq!(l.earliest_pending(&key), Some(first));

        l.on_response("https://api.test/poll", "GET", ResponseStatus::Code(200), Headers::new());
        assert_eq!(status_of(&l, first), Some(ResponseStatus::Code(200)));
        assert_eq!(l.earliest_pending(&key), Some(second));

        l.on_response("https://api.test/poll", "GET", ResponseStatus::Code(200), Headers::new());
        assert_eq!(l.earliest_pending(&key), None);
        assert!(l.anomalies().is_empty());
    }

    #[test]
    fn method_is_part_of_the_key() {
        let (mut l, _) = ledger();
        let get = start(&mut l, "https://api.test/items");
        let post = l.on_request_start("https://api.test/items", "post", Headers::new(), Some("{}".into()), "fetch", false);

        l.on_response("https://api.test/items", "POST", ResponseStatus::Code(201), Headers::new());
        assert!(l.get(get).unwrap().is_pending());
        assert_eq!(status_of(&l, post), Some(ResponseStatus::Code(201)));
        assert_eq!(l.get(post).unwrap().method, "POST");
    }

    #[test]
    fn duration_is_measured_from_request_start() {
        let (mut l, clock) = ledger();
        let id = start(&mut l, "https://cdn.test/app.js");
        clock.advance_ms(120);
        l.on_response("https://cdn.test/app.js", "GET", ResponseStatus::Code(200), Headers::new());

        match &l.get(id).unwrap().outcome {
            Outcome::Completed { duration_ms, .. } => assert_eq!(*duration_ms, 120),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn unmatched_response_is_dropped() {
        let (mut l, _) = ledger();
        l.on_response("https://nowhere.test/", "GET", ResponseStatus::Code(200), Headers::new());

        assert!(l.is_empty());
        assert!(matches!(l.anomalies()[0], LedgerAnomaly::UnmatchedResponse { .. }));
    }

    #[test]
    fn unmatched_failure_synthesizes_one_failed_exchange() {
        let (mut l, _) = ledger();
        l.on_request_failed("https://gone.test/x.css", "GET", "net::ERR_NAME_NOT_RESOLVED", "stylesheet");

        assert_eq!(l.len(), 1);
        let exchange = &l.snapshot()[0];
        assert_eq!(exchange.request.resource_type, "stylesheet");
        assert_eq!(
            exchange.outcome,
            Outcome::Failed { reason: "net::ERR_NAME_NOT_RESOLVED".into() }
        );
        assert!(matches!(l.anomalies()[0], LedgerAnomaly::SynthesizedFailure { .. }));
    }

    #[test]
    fn matched_failure_does_not_create_new_exchange() {
        let (mut l, _) = ledger();
        let id = start(&mut l, "https://api.test/slow");
        l.on_request_failed("https://api.test/slow", "GET", "net::ERR_ABORTED", "fetch");

        assert_eq!(l.len(), 1);
        assert!(matches!(l.get(id).unwrap().outcome, Outcome::Failed { .. }));
        assert!(l.anomalies().is_empty());
    }

    #[test]
    fn terminal_exchange_is_not_matched_again() {
        let (mut l, _) = ledger();
        let id = start(&mut l, "https://api.test/once");
        l.on_response("https://api.test/once", "GET", ResponseStatus::Code(200), Headers::new());
        l.on_request_failed("https://api.test/once", "GET", "late failure", "fetch");

        assert_eq!(status_of(&l, id), Some(ResponseStatus::Code(200)));
        // The late failure had nothing pending to match, so it stands alone.
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn websocket_lifecycle() {
        let (mut l, _) = ledger();
        let ws = l.on_websocket_open("wss://live.test/socket");

        let exchange = l.get(ws).unwrap();
        assert_eq!(exchange.kind, ExchangeKind::Websocket);
        assert_eq!(exchange.request.headers["Upgrade"], "websocket");
        assert!(exchange.is_pending());

        l.on_websocket_closed(ws);
        assert_eq!(status_of(&l, ws), Some(ResponseStatus::Label(WEBSOCKET_CLOSED.into())));

        l.on_websocket_error(ws, "too late");
        assert_eq!(status_of(&l, ws), Some(ResponseStatus::Label(WEBSOCKET_CLOSED.into())));
        assert!(matches!(l.anomalies()[0], LedgerAnomaly::AlreadyTerminal { .. }));
    }

    #[test]
    fn websockets_are_not_matched_by_key() {
        let (mut l, _) = ledger();
        let ws = l.on_websocket_open("wss://live.test/socket");
        l.on_response("wss://live.test/socket", "GET", ResponseStatus::Code(101), Headers::new());

        assert!(l.get(ws).unwrap().is_pending());
    }

    #[test]
    fn upgrade_requests_are_flagged() {
        let (mut l, _) = ledger();
        let id = l.on_request_start("https://live.test/socket", "GET", Headers::new(), None, "websocket", true);
        assert_eq!(l.get(id).unwrap().kind, ExchangeKind::WebsocketUpgrade);
    }

    #[test]
    fn unknown_websocket_id_is_an_anomaly() {
        let (mut l, _) = ledger();
        l.on_websocket_error(ExchangeId(42), "boom");
        assert_eq!(l.anomalies(), &[LedgerAnomaly::UnknownExchange { id: ExchangeId(42) }]);
    }
}
