//! The single owner of one observation window's state.
//!
//! The orchestrator converts every protocol notification into a
//! [`SessionEvent`] and hands it to [`Session::apply`], one at a time, in
//! delivery order. Nothing else mutates the transcript or the ledger; the
//! presentation layer only ever sees snapshots.

use crate::clock::Clock;
use crate::console::{ConsoleTranscript, TranscriptEntry};
use crate::diagnostics::{summarize, DiagnosticsReport, SummaryPolicy};
use crate::event::SessionEvent;
use crate::format::DEFAULT_MAX_LEN;
use crate::network::{ExchangeId, LedgerAnomaly, NetworkExchange, NetworkLedger};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Aggregates the console transcript and the network ledger.
pub struct Session {
    clock: Arc<dyn Clock>,
    console: ConsoleTranscript,
    network: NetworkLedger,
    sockets: FxHashMap<String, ExchangeId>,
}

impl Session {
    /// Creates an empty session reading time from `clock`.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_max_len(clock, DEFAULT_MAX_LEN)
    }

    /// Creates an empty session with a custom render limit for console
    /// arguments.
    pub fn with_max_len(clock: impl Clock + 'static, max_len: usize) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(clock);
        Self {
            console: ConsoleTranscript::new(clock.clone()).with_max_len(max_len),
            network: NetworkLedger::new(clock.clone()),
            clock,
            sockets: FxHashMap::default(),
        }
    }

    /// Applies one notification.
    ///
    /// Returns the exchange that was created or changed, if any, so a live
    /// display can pull just that record.
    pub fn apply(&mut self, event: SessionEvent) -> Option<ExchangeId> {
        match event {
            SessionEvent::Console { severity, raw_text, args } => {
                self.console.on_console_event(severity, raw_text, &args);
                None
            }
            SessionEvent::PageError { message } => {
                self.console.on_page_error(message);
                None
            }
            SessionEvent::RequestStart { url, method, headers, body, resource_type, is_upgrade } => {
                Some(self.network.on_request_start(url, &method, headers, body, resource_type, is_upgrade))
            }
            SessionEvent::Response { url, method, status, headers } => {
                self.network.on_response(&url, &method, status, headers)
            }
            SessionEvent::RequestFailed { url, method, reason, resource_type } => {
                Some(self.network.on_request_failed(&url, &method, reason, resource_type))
            }
            SessionEvent::WebSocketOpened { handle, url } => {
                let id = self.network.on_websocket_open(url);
                self.sockets.insert(handle, id);
                Some(id)
            }
            SessionEvent::WebSocketClosed { handle } => {
                let Some(&id) = self.sockets.get(&handle) else {
                    self.network.on_unknown_socket_closed(handle);
                    return None;
                };
                self.network.on_websocket_closed(id);
                Some(id)
            }
            SessionEvent::WebSocketError { handle, reason } => match self.sockets.get(&handle) {
                Some(&id) => {
                    self.network.on_websocket_error(id, reason);
                    Some(id)
                }
                None => Some(self.network.on_unknown_socket_error(handle, reason)),
            },
        }
    }

    /// The console transcript, in arrival order.
    #[must_use]
    pub fn console_snapshot(&self) -> Vec<TranscriptEntry> {
        self.console.snapshot()
    }

    /// Every exchange, in creation order.
    #[must_use]
    pub fn network_snapshot(&self) -> Vec<NetworkExchange> {
        self.network.snapshot().to_vec()
    }

    /// Summarizes the ledger as of now.
    #[must_use]
    pub fn summarize(&self, policy: &SummaryPolicy) -> DiagnosticsReport {
        summarize(self.network.snapshot(), || self.clock.now(), policy)
    }

    /// Read access to the transcript builder.
    #[must_use]
    pub fn console(&self) -> &ConsoleTranscript {
        &self.console
    }

    /// Read access to the ledger.
    #[must_use]
    pub fn network(&self) -> &NetworkLedger {
        &self.network
    }

    /// Direct access to the ledger, for orchestrators that already speak
    /// its vocabulary.
    pub fn network_mut(&mut self) -> &mut NetworkLedger {
        &mut self.network
    }

    /// Correlation anomalies seen so far.
    #[must_use]
    pub fn anomalies(&self) -> &[LedgerAnomaly] {
        self.network.anomalies()
    }
}
