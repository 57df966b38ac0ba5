//! The observation window.
//!
//! One task owns the [`Session`]. Every CDP stream is polled from a single
//! `tokio::select!` loop, so no event is ever applied concurrently with
//! another and no locks are needed. The loop is biased: pending request
//! starts are always applied before any response or failure.

use crate::cdp::{self, CdpTranslator};
use crate::error::{BrowserError, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    self, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived,
    EventWebSocketClosed, EventWebSocketCreated, EventWebSocketFrameError,
};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use chromiumoxide::cdp::IntoEventKind;
use chromiumoxide::page::Page;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use pagescope_core::{ExchangeId, Session, SessionEvent, SystemClock, DEFAULT_MAX_LEN};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default observation window.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(5000);

/// Every notification other than a request start, in arrival order.
enum Notification {
    Console(Arc<EventConsoleApiCalled>),
    Exception(Arc<EventExceptionThrown>),
    Response(Arc<EventResponseReceived>),
    Failed(Arc<EventLoadingFailed>),
    Finished(Arc<EventLoadingFinished>),
    SocketOpened(Arc<EventWebSocketCreated>),
    SocketClosed(Arc<EventWebSocketClosed>),
    SocketError(Arc<EventWebSocketFrameError>),
}

impl Notification {
    fn translate(&self, translator: &mut CdpTranslator) -> Option<SessionEvent> {
        match self {
            Self::Console(event) => Some(cdp::console_event(event)),
            Self::Exception(event) => Some(cdp::page_error_event(event)),
            Self::Response(event) => Some(translator.on_response(event)),
            Self::Failed(event) => translator.on_loading_failed(event),
            Self::Finished(event) => {
                translator.on_loading_finished(event);
                None
            }
            Self::SocketOpened(event) => Some(cdp::websocket_opened(event)),
            Self::SocketClosed(event) => Some(cdp::websocket_closed(event)),
            Self::SocketError(event) => Some(cdp::websocket_error(event)),
        }
    }
}

/// Runs observation windows against a page.
#[derive(Debug, Clone)]
pub struct Observer {
    window: Duration,
    max_value_len: usize,
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl Observer {
    /// Creates an observer with the given window length.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window, max_value_len: DEFAULT_MAX_LEN }
    }

    /// Sets the render limit for console arguments.
    #[must_use]
    pub fn with_max_value_len(mut self, max_value_len: usize) -> Self {
        self.max_value_len = max_value_len;
        self
    }

    /// The configured window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Subscribes to the page's console and network streams, navigates to
    /// `url`, and records everything that happens until the window closes.
    ///
    /// `on_update` is called after every applied event with the exchange it
    /// touched, if any.
    ///
    /// # Errors
    ///
    /// Fails only if a subscription cannot be set up. A failed navigation is
    /// logged and the window still runs to completion.
    pub async fn observe<U>(&self, page: &Page, url: &str, on_update: U) -> Result<Session>
    where
        U: FnMut(&Session, Option<ExchangeId>),
    {
        let requests = listen::<EventRequestWillBeSent>(page, "Network.requestWillBeSent").await?;
        let others = stream::select_all(vec![
            listen::<EventConsoleApiCalled>(page, "Runtime.consoleAPICalled")
                .await?
                .map(Notification::Console)
                .boxed(),
            listen::<EventExceptionThrown>(page, "Runtime.exceptionThrown")
                .await?
                .map(Notification::Exception)
                .boxed(),
            listen::<EventResponseReceived>(page, "Network.responseReceived")
                .await?
                .map(Notification::Response)
                .boxed(),
            listen::<EventLoadingFailed>(page, "Network.loadingFailed")
                .await?
                .map(Notification::Failed)
                .boxed(),
            listen::<EventLoadingFinished>(page, "Network.loadingFinished")
                .await?
                .map(Notification::Finished)
                .boxed(),
            listen::<EventWebSocketCreated>(page, "Network.webSocketCreated")
                .await?
                .map(Notification::SocketOpened)
                .boxed(),
            listen::<EventWebSocketClosed>(page, "Network.webSocketClosed")
                .await?
                .map(Notification::SocketClosed)
                .boxed(),
            listen::<EventWebSocketFrameError>(page, "Network.webSocketFrameError")
                .await?
                .map(Notification::SocketError)
                .boxed(),
        ]);

        page.execute(network::EnableParams::default()).await?;

        info!(url, window_ms = self.window.as_millis() as u64, "observation window opened");

        let mut translator = CdpTranslator::new();
        let mut session = Session::with_max_len(SystemClock, self.max_value_len);
        let navigation = async move { page.goto(url).await.map(|_| ()) };

        run_window(
            &mut session,
            requests,
            others,
            navigation,
            self.window,
            |event: Arc<EventRequestWillBeSent>, t: &mut CdpTranslator| t.on_request(&event),
            |notification: Notification, t: &mut CdpTranslator| notification.translate(t),
            &mut translator,
            on_update,
        )
        .await;

        info!(
            console = session.console().len(),
            network = session.network().len(),
            "observation window closed"
        );
        Ok(session)
    }
}

async fn listen<T>(page: &Page, event: &'static str) -> Result<BoxStream<'static, Arc<T>>>
where
    T: IntoEventKind + Unpin + Send + std::fmt::Debug + 'static,
{
    let stream = page
        .event_listener::<T>()
        .await
        .map_err(|e| BrowserError::SubscriptionFailed { event, reason: e.to_string() })?;
    Ok(stream.boxed())
}

/// The select loop behind [`Observer::observe`], independent of any live
/// connection.
///
/// Request starts and other notifications arrive on separate streams and are
/// turned into session events by the two translation closures, which share
/// `state`. The navigation future runs alongside; its outcome is logged and
/// never ends the window. The loop returns when `window` has elapsed.
#[allow(clippy::too_many_arguments)]
pub async fn run_window<S, R, O, RI, OI, N, E, TR, TO, U>(
    session: &mut Session,
    requests: R,
    others: O,
    navigation: N,
    window: Duration,
    mut translate_request: TR,
    mut translate_other: TO,
    state: &mut S,
    mut on_update: U,
) where
    R: Stream<Item = RI>,
    O: Stream<Item = OI>,
    N: Future<Output = std::result::Result<(), E>>,
    E: Display,
    TR: FnMut(RI, &mut S) -> Vec<SessionEvent>,
    TO: FnMut(OI, &mut S) -> Option<SessionEvent>,
    U: FnMut(&Session, Option<ExchangeId>),
{
    let requests = requests.fuse();
    let others = others.fuse();
    let deadline = tokio::time::sleep(window);
    tokio::pin!(requests, others, navigation, deadline);
    let mut navigated = false;

    loop {
        tokio::select! {
            biased;

            Some(item) = requests.next() => {
                for event in translate_request(item, state) {
                    let touched = session.apply(event);
                    on_update(session, touched);
                }
            }
            Some(item) = others.next() => {
                if let Some(event) = translate_other(item, state) {
                    let touched = session.apply(event);
                    on_update(session, touched);
                }
            }
            result = &mut navigation, if !navigated => {
                navigated = true;
                match result {
                    Ok(()) => debug!("navigation finished"),
                    Err(e) => warn!(error = %e, "navigation failed; continuing to observe"),
                }
            }
            () = &mut deadline => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagescope_core::{Headers, ResponseStatus, SummaryPolicy};
    use std::future::ready;

    fn start(url: &str) -> SessionEvent {
        SessionEvent::RequestStart {
            url: url.to_string(),
            method: "GET".to_string(),
            headers: Headers::new(),
            body: None,
            resource_type: "fetch".to_string(),
            is_upgrade: false,
        }
    }

    fn respond(url: &str, status: u16) -> SessionEvent {
        SessionEvent::Response {
            url: url.to_string(),
            method: "GET".to_string(),
            status: ResponseStatus::Code(status),
            headers: Headers::new(),
        }
    }

    #[tokio::test]
    async fn starts_are_applied_before_their_responses() {
        let mut session = Session::new(SystemClock);
        let mut updates = 0;

        // Both streams are ready at once; the response would be unmatched
        // if it were applied first.
        run_window(
            &mut session,
            stream::iter(vec![start("https://a.test/x")]),
            stream::iter(vec![respond("https://a.test/x", 200)]),
            ready(Ok::<(), String>(())),
            Duration::from_millis(20),
            |event, _: &mut ()| vec![event],
            |event, _: &mut ()| Some(event),
            &mut (),
            |_, _| updates += 1,
        )
        .await;

        assert_eq!(updates, 2);
        assert!(session.anomalies().is_empty());
        let report = session.summarize(&SummaryPolicy::default());
        assert_eq!(report.counts.successful, 1);
        assert_eq!(report.counts.pending, 0);
    }

    #[tokio::test]
    async fn failed_navigation_does_not_end_the_window() {
        let mut session = Session::new(SystemClock);

        run_window(
            &mut session,
            stream::iter(vec![start("https://a.test/slow")]),
            stream::empty::<SessionEvent>(),
            ready(Err::<(), _>("net::ERR_NAME_NOT_RESOLVED")),
            Duration::from_millis(20),
            |event, _: &mut ()| vec![event],
            |event, _: &mut ()| Some(event),
            &mut (),
            |_, _| {},
        )
        .await;

        assert_eq!(session.summarize(&SummaryPolicy::default()).counts.pending, 1);
    }

    #[tokio::test]
    async fn window_closes_with_streams_still_open() {
        let mut session = Session::new(SystemClock);
        let started = std::time::Instant::now();

        run_window(
            &mut session,
            stream::pending::<SessionEvent>(),
            stream::pending::<SessionEvent>(),
            std::future::pending::<std::result::Result<(), String>>(),
            Duration::from_millis(30),
            |event, _: &mut ()| vec![event],
            |event, _: &mut ()| Some(event),
            &mut (),
            |_, _| {},
        )
        .await;

        assert!(started.elapsed() >= Duration::from_millis(30));
        assert!(session.network_snapshot().is_empty());
    }

    #[test]
    fn observer_defaults() {
        let observer = Observer::default().with_max_value_len(64);
        assert_eq!(observer.window(), DEFAULT_WINDOW);
        assert_eq!(observer.max_value_len, 64);
    }
}
