//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, PageInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub(crate) type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type EventHandlers = Arc<DashMap<String, mpsc::UnboundedSender<CdpResponse>>>;

/// Time allowed for any single CDP command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Pending request waiting for response.
pub(crate) struct PendingRequest {
    pub tx: oneshot::Sender<Result<Value, CdpError>>,
}

/// Shared command channel used by the client and every page session.
#[derive(Clone)]
pub(crate) struct Transport {
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    request_id: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
}

impl Transport {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }
}

/// CDP client connected to one browser.
///
/// Responses are matched to requests by id; events are routed to the page
/// session they belong to.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    transport: Transport,
    /// Event channels by session ID.
    event_handlers: EventHandlers,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint.
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("http://127.0.0.1:9222").await?;
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!(
            "Connected to browser: {} (protocol {})",
            version.browser, version.protocol_version
        );

        let (ws_stream, _) = tokio_tungstenite::connect_async(&version.web_socket_debugger_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let transport = Transport {
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            request_id: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
        };
        let event_handlers: EventHandlers = Arc::new(DashMap::new());

        let recv_task = {
            let pending = transport.pending.clone();
            let event_handlers = event_handlers.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending, event_handlers).await;
            })
        };

        Ok(Self {
            http_endpoint,
            transport,
            event_handlers,
            _recv_task: recv_task,
        })
    }

    /// WebSocket receive loop.
    async fn receive_loop(
        mut ws_source: WsSource,
        pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
        event_handlers: EventHandlers,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => Self::route(resp, &pending, &event_handlers),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        // Dropping the senders fails outstanding calls and ends every event pump.
        pending.lock().clear();
        event_handlers.clear();
    }

    fn route(
        resp: CdpResponse,
        pending: &Mutex<HashMap<u64, PendingRequest>>,
        event_handlers: &DashMap<String, mpsc::UnboundedSender<CdpResponse>>,
    ) {
        if let Some(id) = resp.id {
            let pending_req = pending.lock().remove(&id);
            if let Some(req) = pending_req {
                let result = match resp.error {
                    Some(error) => Err(CdpError::Protocol {
                        code: error.code,
                        message: error.message,
                    }),
                    None => Ok(resp.result.unwrap_or(Value::Null)),
                };
                let _ = req.tx.send(result);
            }
            return;
        }

        match (resp.method.as_deref(), resp.session_id.as_deref()) {
            (Some("Target.detachedFromTarget"), None) => {
                if let Some(session_id) = resp
                    .params
                    .as_ref()
                    .and_then(|p| p["sessionId"].as_str())
                {
                    debug!("Session {} detached", session_id);
                    event_handlers.remove(session_id);
                }
            }
            (Some(_), Some(session_id)) => {
                if let Some(tx) = event_handlers.get(session_id) {
                    let _ = tx.send(resp);
                }
            }
            _ => {}
        }
    }

    /// Send a browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    // ========================================================================
    // Target Management
    // ========================================================================

    /// List all pages.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// Create a new page target. Returns its target id.
    pub async fn create_target(&self, url: &str, background: bool) -> Result<String, CdpError> {
        let result = self
            .call(
                "Target.createTarget",
                Some(json!({
                    "url": url,
                    "background": background,
                })),
            )
            .await?;

        let target_id = result["targetId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))?
            .to_string();

        debug!("Created target {} ({})", target_id, url);
        Ok(target_id)
    }

    /// Attach to a page target and enable the domains sessions rely on.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.event_handlers.insert(session_id.clone(), event_tx);

        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.transport.clone(),
            event_rx,
        );

        if let Err(e) = session.enable_domains().await {
            self.detach(session.session_id());
            return Err(e);
        }

        Ok(session)
    }

    /// Stop routing events to a session.
    pub fn detach(&self, session_id: &str) {
        self.event_handlers.remove(session_id);
    }

    /// Close a page target.
    pub async fn close_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({"targetId": target_id})))
            .await?;
        Ok(())
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> CdpResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_route_delivers_response_to_pending_request() {
        let pending = Mutex::new(HashMap::new());
        let handlers = DashMap::new();
        let (tx, mut rx) = oneshot::channel();
        pending.lock().insert(5, PendingRequest { tx });

        CdpClient::route(event(r#"{"id": 5, "result": {"ok": true}}"#), &pending, &handlers);

        let result = rx.try_recv().unwrap().unwrap();
        assert_eq!(result["ok"], true);
        assert!(pending.lock().is_empty());
    }

    #[test]
    fn test_route_converts_error_response() {
        let pending = Mutex::new(HashMap::new());
        let handlers = DashMap::new();
        let (tx, mut rx) = oneshot::channel();
        pending.lock().insert(2, PendingRequest { tx });

        CdpClient::route(
            event(r#"{"id": 2, "error": {"code": -32601, "message": "not found"}}"#),
            &pending,
            &handlers,
        );

        let result = rx.try_recv().unwrap();
        assert!(matches!(result, Err(CdpError::Protocol { code: -32601, .. })));
    }

    #[test]
    fn test_route_sends_events_to_their_session_only() {
        let pending = Mutex::new(HashMap::new());
        let handlers = DashMap::new();
        let (a_tx, mut a_rx) = mpsc::unbounded_channel();
        let (b_tx, mut b_rx) = mpsc::unbounded_channel();
        handlers.insert("A".to_string(), a_tx);
        handlers.insert("B".to_string(), b_tx);

        CdpClient::route(
            event(r#"{"method": "Page.loadEventFired", "params": {}, "sessionId": "B"}"#),
            &pending,
            &handlers,
        );

        assert!(a_rx.try_recv().is_err());
        assert_eq!(
            b_rx.try_recv().unwrap().method.as_deref(),
            Some("Page.loadEventFired")
        );
    }

    #[test]
    fn test_route_drops_handler_on_detach() {
        let pending = Mutex::new(HashMap::new());
        let handlers = DashMap::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        handlers.insert("S1".to_string(), tx);

        CdpClient::route(
            event(r#"{"method": "Target.detachedFromTarget", "params": {"sessionId": "S1", "targetId": "T1"}}"#),
            &pending,
            &handlers,
        );

        assert!(handlers.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
