//! DevTools websocket connection with request/response correlation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::protocol::{signal_from_event, Command, Incoming, ProtocolFailure};
use crate::infrastructure::ports::{RenderError, RenderSignal};

type Reply = Result<Value, ProtocolFailure>;

/// In-flight commands awaiting a response, keyed by command id.
#[derive(Default)]
struct PendingCommands {
    inner: HashMap<u64, oneshot::Sender<Reply>>,
}

impl PendingCommands {
    fn insert(&mut self, id: u64, tx: oneshot::Sender<Reply>) {
        self.inner.insert(id, tx);
    }

    fn remove(&mut self, id: u64) {
        self.inner.remove(&id);
    }

    /// Returns true if a pending command was found.
    fn resolve(&mut self, id: u64, reply: Reply) -> bool {
        match self.inner.remove(&id) {
            Some(tx) => {
                let _ = tx.send(reply);
                true
            }
            None => false,
        }
    }

    /// Drop every waiter; their receivers observe a closed channel.
    fn clear(&mut self) -> usize {
        let count = self.inner.len();
        self.inner.clear();
        count
    }
}

/// One browser-level websocket connection.
///
/// Events from the watched page session are translated into
/// [`RenderSignal`]s and forwarded to the receiver returned by `connect`.
pub struct CdpConnection {
    outgoing: mpsc::Sender<Message>,
    pending: Arc<Mutex<PendingCommands>>,
    watched_session: Arc<Mutex<Option<String>>>,
    next_id: AtomicU64,
    command_timeout: Duration,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl CdpConnection {
    pub async fn connect(
        ws_url: &str,
        command_timeout: Duration,
    ) -> Result<(Self, mpsc::Receiver<RenderSignal>), RenderError> {
        let (stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| RenderError::protocol(format!("connect {ws_url}: {e}")))?;
        let (mut write, mut read) = stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::channel::<Message>(32);
        let (signals, signals_rx) = mpsc::channel::<RenderSignal>(64);
        let pending = Arc::new(Mutex::new(PendingCommands::default()));
        let watched_session: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

        let writer = tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    tracing::debug!(error = %e, "DevTools write failed");
                    break;
                }
            }
        });

        let reader_pending = Arc::clone(&pending);
        let reader_session = Arc::clone(&watched_session);
        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "DevTools connection error");
                        break;
                    }
                };
                match Incoming::parse(&text) {
                    Ok(Incoming::Response { id, result }) => {
                        reader_pending.lock().await.resolve(id, result);
                    }
                    Ok(Incoming::Event {
                        method,
                        params,
                        session_id,
                    }) => {
                        let watched = reader_session.lock().await.clone();
                        if watched.is_none() || session_id != watched {
                            continue;
                        }
                        if let Some(signal) = signal_from_event(&method, &params) {
                            if signals.send(signal).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Unparseable DevTools message"),
                }
            }
            let dropped = reader_pending.lock().await.clear();
            tracing::debug!(dropped, "DevTools reader finished");
            // `signals` drops here, ending the signal stream.
        });

        Ok((
            Self {
                outgoing,
                pending,
                watched_session,
                next_id: AtomicU64::new(1),
                command_timeout,
                reader,
                writer,
            },
            signals_rx,
        ))
    }

    /// Forward signals from this page session only.
    pub async fn watch_session(&self, session_id: &str) {
        *self.watched_session.lock().await = Some(session_id.to_string());
    }

    /// Send a command and wait for its result.
    pub async fn call(
        &self,
        method: &str,
        params: Value,
        session_id: Option<&str>,
    ) -> Result<Value, RenderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let text = serde_json::to_string(&Command {
            id,
            method,
            params,
            session_id,
        })
        .map_err(RenderError::protocol)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if self.outgoing.send(Message::Text(text)).await.is_err() {
            self.pending.lock().await.remove(id);
            return Err(RenderError::protocol(format!("{method}: connection closed")));
        }

        match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(failure))) => Err(RenderError::protocol(format!(
                "{method}: {} ({})",
                failure.message, failure.code
            ))),
            Ok(Err(_)) => Err(RenderError::protocol(format!(
                "{method}: connection closed"
            ))),
            Err(_) => {
                self.pending.lock().await.remove(id);
                Err(RenderError::protocol(format!(
                    "{method}: no response within {:?}",
                    self.command_timeout
                )))
            }
        }
    }

    /// Ask the browser to exit, waiting at most `grace` for its reply.
    pub async fn close_browser(&self, grace: Duration) -> bool {
        matches!(
            tokio::time::timeout(grace, self.call("Browser.close", json!({}), None)).await,
            Ok(Ok(_))
        )
    }

    pub fn shutdown(&self) {
        self.reader.abort();
        self.writer.abort();
    }
}

impl Drop for CdpConnection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_delivers_reply_once() {
        let mut pending = PendingCommands::default();
        let (tx, rx) = oneshot::channel();
        pending.insert(7, tx);

        assert!(pending.resolve(7, Ok(json!({ "ok": true }))));
        assert!(!pending.resolve(7, Ok(Value::Null)));
        assert_eq!(rx.await.unwrap().unwrap(), json!({ "ok": true }));
    }

    #[tokio::test]
    async fn close_browser_is_delivered_before_shutdown() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let browser = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                panic!("expected a command frame");
            };
            let command: Value = serde_json::from_str(&text).unwrap();
            ws.send(Message::Text(
                json!({ "id": command["id"], "result": {} }).to_string(),
            ))
            .await
            .unwrap();
            command["method"].as_str().unwrap_or_default().to_string()
        });

        let (connection, _signals) =
            CdpConnection::connect(&format!("ws://{addr}"), Duration::from_secs(5))
                .await
                .unwrap();
        assert!(connection.close_browser(Duration::from_secs(5)).await);
        connection.shutdown();

        assert_eq!(browser.await.unwrap(), "Browser.close");
    }

    #[tokio::test]
    async fn clear_closes_waiters() {
        let mut pending = PendingCommands::default();
        let (tx, rx) = oneshot::channel();
        pending.insert(1, tx);

        assert_eq!(pending.clear(), 1);
        assert!(rx.await.is_err());
    }
}
