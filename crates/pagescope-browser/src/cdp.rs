//! Translation from DevTools Protocol notifications to session events.
//!
//! CDP splits one request's life across several notifications that do not
//! repeat each other: `Network.responseReceived` has no method and
//! `Network.loadingFailed` has neither URL nor method. [`CdpTranslator`]
//! keeps the request-id bookkeeping needed to fill those gaps, so the core
//! only ever sees complete `(url, method)` identities.

use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
    EventWebSocketClosed, EventWebSocketCreated, EventWebSocketFrameError, Headers as CdpHeaders,
    Response,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use pagescope_core::network::UNKNOWN_URL;
use pagescope_core::{ArgumentHandle, Headers, ResolveError, ResponseStatus, SessionEvent, Severity};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::debug;

impl ArgumentHandle for RemoteObject {
    fn structured(&self) -> Result<Value, ResolveError> {
        self.value
            .clone()
            .ok_or_else(|| ResolveError::new("remote object has no serialized value"))
    }

    fn text_content(&self) -> Result<String, ResolveError> {
        if let Some(description) = &self.description {
            return Ok(description.clone());
        }
        self.unserializable_value
            .as_ref()
            .map(|v| v.inner().clone())
            .ok_or_else(|| ResolveError::new("remote object has no description"))
    }

    fn generic(&self) -> Result<String, ResolveError> {
        let ty = self.r#type.as_ref();
        if ty == "undefined" {
            Ok("undefined".to_string())
        } else {
            Ok(format!("[{ty}]"))
        }
    }
}

/// Maps the protocol's console call type to a transcript severity.
pub(crate) fn severity_of(ty: &ConsoleApiCalledType) -> Severity {
    match ty {
        ConsoleApiCalledType::Log => Severity::Log,
        ConsoleApiCalledType::Info => Severity::Info,
        ConsoleApiCalledType::Warning => Severity::Warning,
        ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => Severity::Error,
        ConsoleApiCalledType::Debug => Severity::Debug,
        other => Severity::Other(other.as_ref().to_string()),
    }
}

/// The text the page would have printed: string values unquoted, other
/// values by their best available form, space-separated.
pub(crate) fn raw_text(args: &[RemoteObject]) -> String {
    args.iter()
        .map(|arg| match &arg.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => arg
                .description
                .clone()
                .or_else(|| arg.unserializable_value.as_ref().map(|v| v.inner().clone()))
                .unwrap_or_else(|| arg.r#type.as_ref().to_string()),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flattens protocol headers into an ordered string map.
///
/// Non-string values (the protocol allows them) are rendered as JSON.
pub(crate) fn headers_from_cdp(headers: &CdpHeaders) -> Headers {
    match serde_json::to_value(headers) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect(),
        _ => Headers::new(),
    }
}

fn status_of(code: i64) -> ResponseStatus {
    u16::try_from(code).map_or_else(|_| ResponseStatus::Label(code.to_string()), ResponseStatus::Code)
}

fn is_upgrade(headers: &Headers) -> bool {
    headers
        .iter()
        .any(|(name, value)| name.eq_ignore_ascii_case("upgrade") && value.eq_ignore_ascii_case("websocket"))
}

#[derive(Debug, Clone)]
struct InFlight {
    url: String,
    method: String,
}

/// Stateful converter from CDP network notifications to [`SessionEvent`]s.
///
/// A request id is held with its identity until the response arrives, then
/// only as a bare id until loading finishes or fails.
#[derive(Debug, Default)]
pub struct CdpTranslator {
    requests: FxHashMap<String, InFlight>,
    responded: FxHashSet<String>,
}

impl CdpTranslator {
    /// Creates a translator with no known requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of request ids still tracked, awaiting a response or the end
    /// of their body.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.requests.len() + self.responded.len()
    }

    /// A request is about to be sent.
    ///
    /// When CDP reports a redirect it reuses the request id and carries the
    /// previous hop's response; that response is emitted first so the earlier
    /// exchange completes before the next hop starts.
    #[allow(clippy::too_many_arguments)]
    pub fn request_will_be_sent(
        &mut self,
        request_id: &str,
        url: &str,
        method: &str,
        headers: Headers,
        body: Option<String>,
        resource_type: &str,
        redirect: Option<(ResponseStatus, Headers)>,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::with_capacity(2);

        if let Some((status, redirect_headers)) = redirect {
            if let Some(previous) = self.requests.remove(request_id) {
                events.push(SessionEvent::Response {
                    url: previous.url,
                    method: previous.method,
                    status,
                    headers: redirect_headers,
                });
            } else {
                debug!(request_id, "redirect for a request that was never seen");
            }
        }

        self.responded.remove(request_id);
        self.requests.insert(
            request_id.to_string(),
            InFlight { url: url.to_string(), method: method.to_string() },
        );

        let upgrade = is_upgrade(&headers);
        events.push(SessionEvent::RequestStart {
            url: url.to_string(),
            method: method.to_string(),
            headers,
            body,
            resource_type: resource_type.to_ascii_lowercase(),
            is_upgrade: upgrade,
        });
        events
    }

    /// A response arrived.
    ///
    /// A known id answers with the URL and method its request was sent
    /// with, whatever URL the response reports. Responses for unknown ids
    /// still go out with the response's own URL and `GET`; the ledger
    /// decides whether they match anything.
    pub fn response_received(
        &mut self,
        request_id: &str,
        url: &str,
        status: ResponseStatus,
        headers: Headers,
    ) -> SessionEvent {
        let (url, method) = match self.requests.remove(request_id) {
            Some(known) => {
                self.responded.insert(request_id.to_string());
                (known.url, known.method)
            }
            None => {
                debug!(request_id, url, "response for an unknown request id");
                (url.to_string(), "GET".to_string())
            }
        };
        SessionEvent::Response { url, method, status, headers }
    }

    /// The body finished loading; the id is no longer needed.
    pub fn loading_finished(&mut self, request_id: &str) {
        if !self.responded.remove(request_id) {
            self.requests.remove(request_id);
        }
    }

    /// Loading failed.
    ///
    /// A failure after the response arrived (an aborted body, say) is not a
    /// second outcome for the exchange and yields nothing.
    pub fn loading_failed(
        &mut self,
        request_id: &str,
        reason: &str,
        resource_type: &str,
    ) -> Option<SessionEvent> {
        if self.responded.remove(request_id) {
            debug!(request_id, reason, "failure after response ignored");
            return None;
        }
        let (url, method) = match self.requests.remove(request_id) {
            Some(known) => (known.url, known.method),
            None => {
                debug!(request_id, "failure for an unknown request id");
                (UNKNOWN_URL.to_string(), "GET".to_string())
            }
        };
        Some(SessionEvent::RequestFailed {
            url,
            method,
            reason: reason.to_string(),
            resource_type: resource_type.to_ascii_lowercase(),
        })
    }

    /// Converts a `Network.requestWillBeSent` notification.
    pub fn on_request(&mut self, event: &EventRequestWillBeSent) -> Vec<SessionEvent> {
        let request = &event.request;
        let body = serde_json::to_value(request)
            .ok()
            .and_then(|v| v.get("postData").and_then(Value::as_str).map(str::to_string));
        let resource_type = event.r#type.as_ref().map_or("other", |ty| ty.as_ref());
        let redirect = event.redirect_response.as_ref().map(response_parts);

        self.request_will_be_sent(
            event.request_id.inner(),
            &request.url,
            &request.method,
            headers_from_cdp(&request.headers),
            body,
            resource_type,
            redirect,
        )
    }

    /// Converts a `Network.responseReceived` notification.
    pub fn on_response(&mut self, event: &EventResponseReceived) -> SessionEvent {
        let (status, headers) = response_parts(&event.response);
        self.response_received(event.request_id.inner(), &event.response.url, status, headers)
    }

    /// Handles a `Network.loadingFinished` notification.
    pub fn on_loading_finished(&mut self, event: &EventLoadingFinished) {
        self.loading_finished(event.request_id.inner());
    }

    /// Converts a `Network.loadingFailed` notification.
    pub fn on_loading_failed(&mut self, event: &EventLoadingFailed) -> Option<SessionEvent> {
        self.loading_failed(event.request_id.inner(), &event.error_text, event.r#type.as_ref())
    }
}

fn response_parts(response: &Response) -> (ResponseStatus, Headers) {
    (status_of(response.status), headers_from_cdp(&response.headers))
}

/// Converts a `Runtime.consoleAPICalled` notification.
pub(crate) fn console_event(event: &EventConsoleApiCalled) -> SessionEvent {
    SessionEvent::Console {
        severity: severity_of(&event.r#type),
        raw_text: raw_text(&event.args),
        args: event
            .args
            .iter()
            .cloned()
            .map(|arg| Box::new(arg) as Box<dyn ArgumentHandle>)
            .collect(),
    }
}

/// Converts a `Runtime.exceptionThrown` notification.
pub(crate) fn page_error_event(event: &EventExceptionThrown) -> SessionEvent {
    let details = &event.exception_details;
    let message = details
        .exception
        .as_ref()
        .and_then(|ex| ex.description.clone())
        .unwrap_or_else(|| details.text.clone());
    SessionEvent::PageError { message }
}

pub(crate) fn websocket_opened(event: &EventWebSocketCreated) -> SessionEvent {
    SessionEvent::WebSocketOpened {
        handle: event.request_id.inner().clone(),
        url: event.url.clone(),
    }
}

pub(crate) fn websocket_closed(event: &EventWebSocketClosed) -> SessionEvent {
    SessionEvent::WebSocketClosed { handle: event.request_id.inner().clone() }
}

pub(crate) fn websocket_error(event: &EventWebSocketFrameError) -> SessionEvent {
    SessionEvent::WebSocketError {
        handle: event.request_id.inner().clone(),
        reason: event.error_message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chromiumoxide::cdp::js_protocol::runtime::RemoteObjectType;
    use serde_json::json;

    fn remote(ty: RemoteObjectType, value: Option<Value>, description: Option<&str>) -> RemoteObject {
        let mut builder = RemoteObject::builder().r#type(ty);
        if let Some(value) = value {
            builder = builder.value(value);
        }
        if let Some(description) = description {
            builder = builder.description(description);
        }
        builder.build().unwrap()
    }

    #[test]
    fn remote_object_resolution_order() {
        let plain = remote(RemoteObjectType::String, Some(json!("hi")), None);
        assert_eq!(plain.structured().unwrap(), json!("hi"));

        let node = remote(RemoteObjectType::Object, None, Some("HTMLDivElement"));
        assert!(node.structured().is_err());
        assert_eq!(node.text_content().unwrap(), "HTMLDivElement");

        let bare = remote(RemoteObjectType::Function, None, None);
        assert!(bare.text_content().is_err());
        assert_eq!(bare.generic().unwrap(), "[function]");
    }

    #[test]
    fn raw_text_unquotes_strings() {
        let args = vec![
            remote(RemoteObjectType::String, Some(json!("count")), None),
            remote(RemoteObjectType::Number, Some(json!(3)), None),
            remote(RemoteObjectType::Object, None, Some("Window")),
        ];
        assert_eq!(raw_text(&args), "count 3 Window");
    }

    #[test]
    fn console_types_map_to_severities() {
        assert_eq!(severity_of(&ConsoleApiCalledType::Warning), Severity::Warning);
        assert_eq!(severity_of(&ConsoleApiCalledType::Error), Severity::Error);
        assert_eq!(severity_of(&ConsoleApiCalledType::Log), Severity::Log);
        assert_eq!(severity_of(&ConsoleApiCalledType::Table), Severity::Other("table".into()));
    }

    #[test]
    fn failure_recovers_url_and_method() {
        let mut translator = CdpTranslator::new();
        translator.request_will_be_sent("7", "https://a.test/api", "POST", Headers::new(), None, "Fetch", None);
        assert_eq!(translator.tracked(), 1);

        match translator.loading_failed("7", "net::ERR_ABORTED", "Fetch") {
            Some(SessionEvent::RequestFailed { url, method, resource_type, .. }) => {
                assert_eq!(url, "https://a.test/api");
                assert_eq!(method, "POST");
                assert_eq!(resource_type, "fetch");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(translator.tracked(), 0);
    }

    #[test]
    fn unknown_failure_uses_placeholder_url() {
        let mut translator = CdpTranslator::new();
        match translator.loading_failed("99", "net::ERR_FAILED", "Other") {
            Some(SessionEvent::RequestFailed { url, .. }) => assert_eq!(url, UNKNOWN_URL),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn response_borrows_method_from_request() {
        let mut translator = CdpTranslator::new();
        translator.request_will_be_sent("1", "https://a.test/form", "PUT", Headers::new(), Some("x=1".into()), "XHR", None);
        match translator.response_received("1", "https://a.test/form", ResponseStatus::Code(204), Headers::new()) {
            SessionEvent::Response { method, status, .. } => {
                assert_eq!(method, "PUT");
                assert_eq!(status, ResponseStatus::Code(204));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn failure_after_response_is_dropped() {
        let mut translator = CdpTranslator::new();
        translator.request_will_be_sent("2", "https://a.test/big.bin", "GET", Headers::new(), None, "Other", None);
        translator.response_received("2", "https://a.test/big.bin", ResponseStatus::Code(200), Headers::new());
        assert!(translator.loading_failed("2", "net::ERR_ABORTED", "Other").is_none());
        assert_eq!(translator.tracked(), 0);
    }

    #[test]
    fn responded_requests_are_released() {
        let mut translator = CdpTranslator::new();
        for id in 0..100 {
            let id = id.to_string();
            translator.request_will_be_sent(&id, "https://a.test/poll", "GET", Headers::new(), None, "Fetch", None);
            translator.response_received(&id, "https://a.test/poll", ResponseStatus::Code(200), Headers::new());
            translator.loading_finished(&id);
        }
        assert_eq!(translator.tracked(), 0);

        translator.request_will_be_sent("a", "https://a.test/slow", "GET", Headers::new(), None, "Fetch", None);
        translator.response_received("a", "https://a.test/slow", ResponseStatus::Code(200), Headers::new());
        assert_eq!(translator.tracked(), 1);
        assert!(translator.loading_failed("a", "net::ERR_ABORTED", "Fetch").is_none());
        assert_eq!(translator.tracked(), 0);
    }

    #[test]
    fn finished_without_response_releases_request() {
        let mut translator = CdpTranslator::new();
        translator.request_will_be_sent("b", "https://a.test/beacon", "POST", Headers::new(), None, "Ping", None);
        translator.loading_finished("b");
        assert_eq!(translator.tracked(), 0);
    }

    #[test]
    fn response_keeps_the_request_url() {
        let mut translator = CdpTranslator::new();
        translator.request_will_be_sent("4", "https://a.test/page#top", "GET", Headers::new(), None, "Document", None);
        match translator.response_received("4", "https://a.test/page", ResponseStatus::Code(200), Headers::new()) {
            SessionEvent::Response { url, .. } => assert_eq!(url, "https://a.test/page#top"),
            other => panic!("unexpected event: {other:?}"),
        }

        match translator.response_received("unseen", "https://a.test/other", ResponseStatus::Code(200), Headers::new()) {
            SessionEvent::Response { url, method, .. } => {
                assert_eq!(url, "https://a.test/other");
                assert_eq!(method, "GET");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn redirect_completes_previous_hop_first() {
        let mut translator = CdpTranslator::new();
        translator.request_will_be_sent("3", "http://a.test/", "GET", Headers::new(), None, "Document", None);
        let events = translator.request_will_be_sent(
            "3",
            "https://a.test/",
            "GET",
            Headers::new(),
            None,
            "Document",
            Some((ResponseStatus::Code(301), Headers::new())),
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], SessionEvent::Response { url, .. } if url == "http://a.test/"));
        assert!(matches!(&events[1], SessionEvent::RequestStart { url, .. } if url == "https://a.test/"));
    }

    #[test]
    fn upgrade_header_marks_request() {
        let mut translator = CdpTranslator::new();
        let headers: Headers = [("Upgrade".to_string(), "websocket".to_string())].into_iter().collect();
        let events = translator.request_will_be_sent("5", "wss://a.test/live", "GET", headers, None, "WebSocket", None);
        assert!(matches!(&events[0], SessionEvent::RequestStart { is_upgrade: true, .. }));
    }

    #[test]
    fn non_numeric_status_becomes_label() {
        assert_eq!(status_of(200), ResponseStatus::Code(200));
        assert_eq!(status_of(-1), ResponseStatus::Label("-1".into()));
    }
}
