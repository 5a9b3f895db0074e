//! Push-channel subscription.
//!
//! One `ConnectionClient` owns one WebSocket for as long as the view that
//! opened it. Events are pulled with [`ConnectionClient::recv`]; `close`
//! consumes the client, so nothing can be received after teardown.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use agentnet_core::error::{AgentNetError, Result};
use agentnet_core::types::{PushEvent, SendRequest};

use crate::protocol::{encode_send_frame, parse_push_frame};

const EVENT_BUFFER: usize = 256;
const OUTBOUND_BUFFER: usize = 32;

pub struct ConnectionClient {
    events: mpsc::Receiver<PushEvent>,
    outbound: mpsc::Sender<SendRequest>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionClient {
    /// Start the subscription. Connection happens in the background; the
    /// first event is either `Connected` or `Error`.
    pub fn open(url: impl Into<String>) -> Self {
        let url = url.into();
        let (event_tx, events) = mpsc::channel(EVENT_BUFFER);
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_subscription(
            url,
            event_tx,
            outbound_rx,
            cancel.clone(),
        ));

        Self {
            events,
            outbound,
            cancel,
            task: Some(task),
        }
    }

    /// Next event, or `None` once the subscription has ended and drained.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.events.recv().await
    }

    /// Ask the backend to route `message` from `sender` over the open socket.
    pub async fn send(&self, req: SendRequest) -> Result<()> {
        self.outbound
            .send(req)
            .await
            .map_err(|_| AgentNetError::PushChannel("subscription closed".into()))
    }

    /// Tear the subscription down and wait for the reader to stop.
    pub async fn close(mut self) {
        self.cancel.cancel();
        self.events.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Push channel task ended abnormally");
            }
        }
        debug!("Push channel closed");
    }
}

impl Drop for ConnectionClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_subscription(
    url: String,
    events: mpsc::Sender<PushEvent>,
    mut outbound: mpsc::Receiver<SendRequest>,
    cancel: CancellationToken,
) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws_stream = match connected {
        Ok((stream, _)) => stream,
        Err(e) => {
            warn!(url = %url, error = %e, "Push channel connect failed");
            let _ = events.send(PushEvent::Error(e.to_string())).await;
            return;
        }
    };

    info!(url = %url, "Push channel connected");
    if events.send(PushEvent::Connected).await.is_err() {
        return;
    }

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_tx.send(WsMessage::Close(None)).await;
                break;
            }
            Some(req) = outbound.recv() => {
                let json = match encode_send_frame(&req) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode outbound frame");
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(WsMessage::Text(json.into())).await {
                    warn!(error = %e, "Push channel write failed");
                    let _ = events.send(PushEvent::Error(e.to_string())).await;
                    break;
                }
            }
            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        warn!(error = %e, "Push channel read failed");
                        let _ = events.send(PushEvent::Error(e.to_string())).await;
                        break;
                    }
                    None => {
                        debug!("Push channel stream ended");
                        break;
                    }
                };

                match msg {
                    WsMessage::Text(text) => {
                        let frame = match parse_push_frame(text.as_str()) {
                            Ok(frame) => frame,
                            Err(e) => {
                                debug!(error = %e, "Dropping malformed push frame");
                                continue;
                            }
                        };
                        if events.send(PushEvent::Frame(frame)).await.is_err() {
                            break;
                        }
                    }
                    WsMessage::Ping(data) => {
                        let _ = ws_tx.send(WsMessage::Pong(data)).await;
                    }
                    WsMessage::Close(_) => {
                        debug!("Push channel close frame");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
}
