// SPDX-FileCopyrightText: 2026 Penny Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Websocket receive loop.
//!
//! Connects to the channel's streaming endpoint, hands every inbound
//! message to its own task, and reconnects after a delay when the
//! connection drops. Each receive waits at most `receive_timeout` so the
//! loop notices cancellation even on a silent connection.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use penny_config::model::ListenerConfig;
use penny_core::ChannelAdapter;
use tokio::sync::Semaphore;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::message::MessageAgent;

/// Receives inbound payloads and dispatches them to the [`MessageAgent`].
pub struct Listener {
    channel: Arc<dyn ChannelAdapter>,
    handler: Arc<MessageAgent>,
    permits: Arc<Semaphore>,
    receive_timeout: Duration,
    reconnect_delay: Duration,
}

impl Listener {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        handler: Arc<MessageAgent>,
        config: &ListenerConfig,
    ) -> Self {
        Self {
            channel,
            handler,
            permits: Arc::new(Semaphore::new(config.max_concurrent_handlers.max(1))),
            receive_timeout: Duration::from_secs(config.receive_timeout_secs),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
        }
    }

    /// Runs until `cancel` fires. Handler tasks are spawned on `tracker`;
    /// the caller closes and waits on it.
    pub async fn run(&self, cancel: CancellationToken, tracker: &TaskTracker) {
        let url = self.channel.connection_url();
        info!(url = %url, "listener started");

        while !cancel.is_cancelled() {
            let connected = tokio::select! {
                _ = cancel.cancelled() => break,
                result = tokio_tungstenite::connect_async(url.as_str()) => result,
            };

            match connected {
                Ok((stream, _)) => {
                    info!(url = %url, "connected");
                    self.receive(stream, &cancel, tracker).await;
                }
                Err(e) => warn!(url = %url, error = %e, "connection failed"),
            }

            if cancel.is_cancelled() {
                break;
            }
            debug!(delay = ?self.reconnect_delay, "reconnecting after delay");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!("listener stopped");
    }

    async fn receive<S>(&self, stream: S, cancel: &CancellationToken, tracker: &TaskTracker)
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        let mut stream = stream;
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return,
                next = tokio::time::timeout(self.receive_timeout, stream.next()) => next,
            };

            match next {
                Err(_) => continue,
                Ok(None) => {
                    warn!("connection closed by server");
                    return;
                }
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "receive failed");
                    return;
                }
                Ok(Some(Ok(Message::Text(text)))) => self.dispatch(text.as_str(), tracker, cancel),
                Ok(Some(Ok(Message::Close(frame)))) => {
                    info!(?frame, "server sent close");
                    return;
                }
                Ok(Some(Ok(_))) => {}
            }
        }
    }

    /// Decodes one payload and spawns a handler task for it.
    ///
    /// Payloads that are not JSON or carry no message are dropped. The task
    /// is abandoned, wherever it is, once `cancel` fires.
    pub fn dispatch(&self, payload: &str, tracker: &TaskTracker, cancel: &CancellationToken) {
        let raw: serde_json::Value = match serde_json::from_str(payload) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "ignoring non-JSON payload");
                return;
            }
        };
        let Some(inbound) = self.channel.extract_message(&raw) else {
            debug!("payload carries no message");
            return;
        };

        let handler = Arc::clone(&self.handler);
        let permits = Arc::clone(&self.permits);
        let cancel = cancel.clone();
        tracker.spawn(async move {
            let sender = inbound.sender.clone();
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(sender = %sender, "message handling abandoned on shutdown");
                }
                permit = permits.acquire_owned() => {
                    let Ok(_permit) = permit else {
                        return;
                    };
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!(sender = %sender, "message handling abandoned on shutdown");
                        }
                        _ = handler.handle(inbound) => {}
                    }
                }
            }
        });
    }
}
