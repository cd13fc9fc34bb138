//! Websocket signal relay with reconnect backoff.
//!
//! Connects to a node's signal endpoint, decodes each text frame as a
//! [`Signal`] and forwards it to the event loop. Reconnection lives here;
//! the list controller only ever sees signals.

use crate::config::ReconnectConfig;
use crate::error::ClientError;
use crate::events::ClientEvent;
use futures_util::StreamExt;
use holonotes_core::Signal;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, Clone)]
pub struct SignalRelay {
    endpoint: String,
    reconnect: ReconnectConfig,
}

impl SignalRelay {
    pub fn new(endpoint: impl Into<String>, reconnect: ReconnectConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect,
        }
    }

    pub async fn connect(&self) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, ClientError> {
        let (stream, _) = tokio_tungstenite::connect_async(self.endpoint.as_str()).await?;
        Ok(stream)
    }

    pub fn reconnect_config(&self) -> &ReconnectConfig {
        &self.reconnect
    }
}

/// Run the relay until the receiving side of `sender` is dropped.
pub fn spawn_signal_relay(relay: SignalRelay, sender: mpsc::Sender<ClientEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = relay.reconnect_config().initial_ms;
        loop {
            match relay.connect().await {
                Ok(mut stream) => {
                    tracing::info!(endpoint = %relay.endpoint, "signal relay connected");
                    if sender.send(ClientEvent::RelayConnected).await.is_err() {
                        return;
                    }
                    backoff = relay.reconnect_config().initial_ms;

                    while let Some(message) = stream.next().await {
                        let event = match message {
                            Ok(Message::Text(text)) => decode_frame(&text),
                            Ok(Message::Close(_)) => break,
                            Ok(_) => continue,
                            Err(err) => {
                                let _ = sender.send(ClientEvent::RelayError(err.to_string())).await;
                                break;
                            }
                        };
                        if sender.send(event).await.is_err() {
                            return;
                        }
                    }

                    if sender
                        .send(ClientEvent::RelayDisconnected {
                            reason: "connection closed".to_string(),
                        })
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                Err(err) => {
                    if sender.send(ClientEvent::RelayError(err.to_string())).await.is_err() {
                        return;
                    }
                }
            }

            let delay = jittered_backoff(backoff, relay.reconnect_config().jitter_ms);
            tracing::debug!(delay_ms = delay, "signal relay reconnecting");
            tokio::time::sleep(Duration::from_millis(delay)).await;
            backoff = next_backoff(backoff, relay.reconnect_config());
        }
    })
}

fn decode_frame(text: &str) -> ClientEvent {
    match serde_json::from_str::<Signal>(text) {
        Ok(signal) => ClientEvent::Signal(Box::new(signal)),
        Err(err) => ClientEvent::RelayError(format!("signal decode error: {err}")),
    }
}

fn next_backoff(current_ms: u64, config: &ReconnectConfig) -> u64 {
    let next = (current_ms as f64 * config.multiplier) as u64;
    next.min(config.max_ms)
}

fn jittered_backoff(base_ms: u64, jitter_ms: u64) -> u64 {
    if jitter_ms == 0 {
        return base_ms;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_nanos(0))
        .subsec_nanos() as u64;
    base_ms.saturating_add(nanos % jitter_ms)
}
