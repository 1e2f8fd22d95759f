// SSE transport: clients open an event stream and POST messages back to it

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use kube_mcp::McpServer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Responses buffered per session before the POST handler waits
const SESSION_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseConfig {
    /// Address to bind
    pub address: SocketAddr,
    /// Public base URL advertised in the `endpoint` event
    pub base_url: String,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://localhost:8080".to_string(),
        }
    }
}

type Sessions = Arc<Mutex<HashMap<String, mpsc::Sender<String>>>>;

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    sessions: Sessions,
    message_url: Arc<str>,
    shutdown: CancellationToken,
}

/// Bind and serve until `shutdown` fires.
pub async fn serve(
    server: Arc<McpServer>,
    config: SseConfig,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router(server, &config.base_url, shutdown.clone());

    let listener = tokio::net::TcpListener::bind(config.address).await?;
    tracing::info!(address = %listener.local_addr()?, base_url = %config.base_url, "SSE server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

/// Create the SSE router
pub fn router(server: Arc<McpServer>, base_url: &str, shutdown: CancellationToken) -> Router {
    let state = SseState {
        server,
        sessions: Arc::new(Mutex::new(HashMap::new())),
        message_url: format!("{}/message", base_url.trim_end_matches('/')).into(),
        shutdown,
    };

    Router::new()
        .route("/sse", get(open_stream))
        .route("/message", post(post_message))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Removes its session from the table when the event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.remove(&self.id);
        }
        tracing::debug!(session = %self.id, "SSE session closed");
    }
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel(SESSION_BUFFER);

    if let Ok(mut sessions) = state.sessions.lock() {
        sessions.insert(session_id.clone(), tx);
    }
    tracing::debug!(session = %session_id, "SSE session opened");

    let endpoint = format!("{}?sessionId={}", state.message_url, session_id);
    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };

    let messages = ReceiverStream::new(rx).map(move |message| {
        let _session = &guard;
        Ok(Event::default().event("message").data(message))
    });

    let stream = futures::stream::once(async move {
        Ok::<_, Infallible>(Event::default().event("endpoint").data(endpoint))
    })
    .chain(messages)
    .take_until(state.shutdown.cancelled_owned());

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Error body for rejected POSTs
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    fn reply(status: StatusCode, error: impl Into<String>) -> Response {
        (status, Json(Self { error: error.into() })).into_response()
    }
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return ErrorResponse::reply(StatusCode::BAD_REQUEST, "Missing sessionId");
    };

    let sender = state
        .sessions
        .lock()
        .ok()
        .and_then(|sessions| sessions.get(&session_id).cloned());
    let Some(sender) = sender else {
        return ErrorResponse::reply(StatusCode::NOT_FOUND, "Invalid session ID");
    };

    if let Some(response) = state.server.handle_message(&body).await {
        if sender.send(response).await.is_err() {
            return ErrorResponse::reply(StatusCode::GONE, "Session closed");
        }
    }

    StatusCode::ACCEPTED.into_response()
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": kube_mcp::SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
