use anyhow::{bail, Context, Result};
use dedupdash_core::domain::ConnectionId;
use dedupdash_core::ports::{PushTransport, TransportEvent};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info};
use url::Url;

pub const EVENTS_PATH: &str = "/events";

/// How long a closing reader may spend getting the Close frame out
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Derive the push channel endpoint from the server base URL
pub fn events_endpoint(server_url: &str) -> Result<Url> {
    let mut url =
        Url::parse(server_url).with_context(|| format!("Invalid server URL: {}", server_url))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => bail!("Unsupported server URL scheme: {}", other),
    };
    if url.set_scheme(scheme).is_err() {
        bail!("Cannot derive push channel URL from {}", server_url);
    }
    url.set_path(EVENTS_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// WebSocket push transport.
///
/// Each `connect` spawns one reader task that reports `Opened`, every text
/// frame, and exactly one `Closed`, all tagged with the connection id.
/// A connection closed from our side sends a Close frame to the server and
/// reports nothing further.
pub struct WsTransport {
    endpoint: Url,
    events: mpsc::UnboundedSender<TransportEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    pub fn new(endpoint: Url, events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            endpoint,
            events,
            shutdown: None,
            task: None,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl PushTransport for WsTransport {
    fn connect(&mut self, id: ConnectionId) {
        self.close();
        info!("Connecting push channel {} to {}", id, self.endpoint);
        let endpoint = self.endpoint.clone();
        let events = self.events.clone();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown = Some(shutdown_tx);
        self.task = Some(tokio::spawn(run_connection(
            endpoint,
            id,
            events,
            shutdown_rx,
        )));
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            debug!("Closing push channel");
            let _ = shutdown.send(());
        }
        // The reader exits on its own once the Close frame is out
        self.task.take();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_connection(
    endpoint: Url,
    id: ConnectionId,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        result = connect_async(endpoint.as_str()) => result,
        _ = &mut shutdown => return,
    };

    let reason = match connected {
        Ok((socket, _)) => {
            if events.send(TransportEvent::Opened { id }).is_err() {
                return;
            }
            let (mut sink, mut stream) = socket.split();
            loop {
                let message = tokio::select! {
                    message = stream.next() => message,
                    _ = &mut shutdown => {
                        let sent = tokio::time::timeout(CLOSE_GRACE, sink.send(Message::Close(None)));
                        match sent.await {
                            Ok(Ok(())) => debug!("Push channel {} closed", id),
                            Ok(Err(e)) => debug!("Push channel {} close frame failed: {}", id, e),
                            Err(_) => debug!("Push channel {} close frame timed out", id),
                        }
                        return;
                    }
                };
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Frame { id, text }).is_err() {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty());
                    }
                    // Ping/pong are answered by tungstenite; binary frames carry nothing for us
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break None,
                }
            }
        }
        Err(e) => Some(e.to_string()),
    };
    let _ = events.send(TransportEvent::Closed { id, reason });
}
