//! Realtime notification channel.
//!
//! SYSTEM CONTEXT
//! ==============
//! One channel runs per authenticated session. [`RealtimeChannel::spawn`]
//! starts a driver task that dials the notification socket (forwarding the
//! session cookies), keeps it alive with a JSON ping every 30 s, and feeds
//! every frame through [`machine::ChannelCore`]. Pushed notifications reach the
//! rest of the process through [`bus::NotificationBus`].
//!
//! LIFECYCLE
//! =========
//! 1. Connecting: dial; success → Open, failure → Closed
//! 2. Open: keepalive interval armed; frames dispatched by `type`
//! 3. Closed: interval dropped; 1000/4001/4003 stop, anything else sleeps
//!    3 s and goes back to 1
//! 4. [`ChannelHandle::shutdown`] closes with 1000 and cancels any pending
//!    reconnect, so no reconnect fires after teardown
//!
//! A stalled socket that never reports a close is not detected; pongs are
//! not checked for absence.

pub mod bus;
pub mod endpoint;
pub mod machine;
pub mod message;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::header::{COOKIE, HeaderValue};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use self::bus::{NotificationBus, Toaster};
use self::machine::{ChannelCore, NotificationList};
use self::message::ClientMessage;
use self::state::{CLOSE_FORBIDDEN, CLOSE_UNAUTHORIZED, ConnectionState, ReconnectDecision};
use crate::config::ClientConfig;
use crate::error::RealtimeError;
use crate::session::SessionCookies;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Floor for the keepalive period; tokio intervals reject a zero period.
pub const MIN_PING_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct RealtimeOptions {
    pub url: String,
    /// Cookies forwarded on every handshake; read fresh on each attempt.
    pub session: Option<SessionCookies>,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
}

impl RealtimeOptions {
    /// # Errors
    ///
    /// Returns an error if no realtime URL can be resolved from `config`.
    pub fn from_config(config: &ClientConfig, session: SessionCookies) -> Result<Self, RealtimeError> {
        Ok(Self {
            url: endpoint::resolve_ws_url(config)?,
            session: Some(session),
            ping_interval: config.ping_interval,
            reconnect_delay: config.reconnect_delay,
        })
    }
}

pub struct RealtimeChannel;

impl RealtimeChannel {
    /// Start the driver task. Must be called inside a Tokio runtime.
    #[must_use]
    pub fn spawn(
        options: RealtimeOptions,
        bus: NotificationBus,
        toaster: Arc<dyn Toaster>,
    ) -> ChannelHandle {
        let core = ChannelCore::new(bus.clone(), toaster, options.reconnect_delay);
        let state = core.watch_state();
        let notifications = core.notifications();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(drive(core, options, shutdown_rx));

        ChannelHandle {
            state,
            notifications,
            bus,
            shutdown: shutdown_tx,
            task,
        }
    }
}

pub struct ChannelHandle {
    state: watch::Receiver<ConnectionState>,
    notifications: NotificationList,
    bus: NotificationBus,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ChannelHandle {
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_open()
    }

    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationList {
        self.notifications.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::types::Notification> {
        self.bus.subscribe()
    }

    /// True once the driver stopped on its own (normal or auth close).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Close with code 1000, cancel timers, and wait for the driver to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(error) = self.task.await {
            tracing::warn!(%error, "notification channel task failed");
        }
    }
}

// =============================================================================
// DRIVER
// =============================================================================

enum SessionEnd {
    Shutdown,
    Closed(Option<u16>),
}

async fn drive(mut core: ChannelCore, options: RealtimeOptions, mut shutdown: watch::Receiver<bool>) {
    loop {
        core.begin_connect();
        let connected = tokio::select! {
            () = wait_shutdown(&mut shutdown) => {
                core.on_shutdown();
                return;
            }
            result = connect(&options) => result,
        };

        let code = match connected {
            Ok(stream) => {
                core.on_open();
                match run_session(&mut core, stream, &options, &mut shutdown).await {
                    SessionEnd::Shutdown => {
                        core.on_shutdown();
                        return;
                    }
                    SessionEnd::Closed(code) => code,
                }
            }
            Err(error) => {
                tracing::warn!(%error, url = %options.url, "notification channel connect failed");
                handshake_close_code(&error)
            }
        };

        match core.on_close(code) {
            ReconnectDecision::Stop(reason) => {
                tracing::info!(?reason, "notification channel will not reconnect");
                return;
            }
            ReconnectDecision::After(delay) => {
                tokio::select! {
                    () = wait_shutdown(&mut shutdown) => {
                        core.on_shutdown();
                        return;
                    }
                    () = tokio::time::sleep(delay) => {
                        tracing::info!("reconnecting notification channel");
                    }
                }
            }
        }
    }
}

async fn connect(options: &RealtimeOptions) -> Result<WsStream, RealtimeError> {
    let mut request = options
        .url
        .as_str()
        .into_client_request()
        .map_err(|_| RealtimeError::InvalidUrl(options.url.clone()))?;
    if let Some(cookie) = options.session.as_ref().and_then(SessionCookies::cookie_header) {
        request
            .headers_mut()
            .insert(COOKIE, HeaderValue::from_str(&cookie)?);
    }

    let (stream, _) = connect_async(request)
        .await
        .map_err(|error| RealtimeError::Connect(Box::new(error)))?;
    Ok(stream)
}

/// A handshake refused with 401/403 is the same rejection as close 4001/4003.
fn handshake_close_code(error: &RealtimeError) -> Option<u16> {
    let RealtimeError::Connect(inner) = error else {
        return None;
    };
    let tungstenite::Error::Http(response) = inner.as_ref() else {
        return None;
    };
    match response.status().as_u16() {
        401 => Some(CLOSE_UNAUTHORIZED),
        403 => Some(CLOSE_FORBIDDEN),
        _ => None,
    }
}

async fn run_session(
    core: &mut ChannelCore,
    stream: WsStream,
    options: &RealtimeOptions,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut sink, mut source) = stream.split();

    // Lives only as long as this session, so it can never outlive the socket.
    let period = options.ping_interval.max(MIN_PING_INTERVAL);
    let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = wait_shutdown(shutdown) => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "".into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                let _ = sink.close().await;
                return SessionEnd::Shutdown;
            }
            _ = keepalive.tick() => {
                let ping = ClientMessage::ping_now().to_text();
                if let Err(error) = sink.send(Message::Text(ping.into())).await {
                    tracing::warn!(%error, "keepalive ping failed");
                    return SessionEnd::Closed(None);
                }
            }
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    core.on_text(text.as_str());
                }
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        core.on_text(text);
                    }
                    Err(_) => tracing::debug!(len = bytes.len(), "ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    // Flush the queued close reply so the handshake completes.
                    let _ = sink.close().await;
                    return SessionEnd::Closed(frame.map(|f| u16::from(f.code)));
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::warn!(%error, "notification channel error");
                    return SessionEnd::Closed(None);
                }
                None => return SessionEnd::Closed(None),
            },
        }
    }
}

/// Resolves when shutdown was requested or the handle was dropped.
async fn wait_shutdown(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
