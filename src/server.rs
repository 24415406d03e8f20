//! HTTP and WebSocket serving.
//!
//! Every WebSocket connection gets its own [`Session`], which owns a fresh
//! [`FilterMenu`]; the catalog and view are shared read-only.

use crate::element::{ClientMessage, ServerMessage};
use crate::menu::{FilterMenu, MenuError};
use crate::presets::Catalog;
use crate::view::View;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{Html, IntoResponse},
    routing::get,
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use tokio::sync::mpsc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by every connection.
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Catalog>,
    view: Arc<View>,
}

impl AppState {
    pub fn new(catalog: Catalog) -> Self {
        let view = View::new(&catalog);
        Self {
            catalog: Arc::new(catalog),
            view: Arc::new(view),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view(&self) -> &View {
        &self.view
    }
}

/// One browser connection and the filter menu it drives.
pub struct Session {
    id: u64,
    menu: FilterMenu,
    view: Arc<View>,
}

impl Session {
    pub fn new(state: &AppState) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            menu: FilterMenu::new(Arc::clone(&state.catalog)),
            view: Arc::clone(&state.view),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn menu(&self) -> &FilterMenu {
        &self.menu
    }

    /// Full page state, sent once when the socket opens.
    pub fn init(&self) -> ServerMessage {
        ServerMessage::Init {
            elements: self.view.elements(&self.menu),
        }
    }

    /// Applies one client frame and returns the updates to send back.
    pub fn handle_text(&mut self, text: &str) -> Vec<ServerMessage> {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(session = self.id, error = %e, "ignoring malformed message");
                return Vec::new();
            }
        };
        let event = match self.view.event_for(&message) {
            Ok(event) => event,
            Err(e) => {
                warn!(session = self.id, error = %e, "ignoring message");
                return Vec::new();
            }
        };

        let updates = match self.menu.handle(event) {
            Ok(updates) => updates,
            Err(MenuError::Selection { key, source }) => {
                warn!(session = self.id, %key, error = %source, "rejected selection");
                self.menu.refresh(&key)
            }
            Err(e) => {
                warn!(session = self.id, error = %e, "ignoring event");
                return Vec::new();
            }
        };
        debug!(session = self.id, count = updates.len(), "sending updates");

        self.view
            .render_updates(&self.menu, &updates)
            .into_iter()
            .map(ServerMessage::update)
            .collect()
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| websocket(socket, state))
}

async fn websocket(stream: WebSocket, state: AppState) {
    use futures_util::sink::SinkExt;
    use futures_util::stream::StreamExt;

    let (mut sender, mut receiver) = stream.split();
    let mut session = Session::new(&state);
    let session_id = session.id();
    info!(session = session_id, "session opened");

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    if tx.send(session.init()).is_err() {
        return;
    }

    // Forward this session's messages to the browser
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(session = session_id, error = %e, "could not encode message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Apply incoming events in arrival order
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    for update in session.handle_text(text.as_str()) {
                        if tx.send(update).is_err() {
                            return;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }
    info!(session = session_id, "session closed");
}

// Default HTML template - wraps generated layout
fn generate_html(title: &str, body_content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/webui.css">
</head>
<body>
<main class="container">
{body_content}</main>
    <script src="/static/webui.js"></script>
</body>
</html>"#, title = title, body_content = body_content)
}

/// Configuration for creating the filter-menu router
pub struct RouterConfig {
    /// Shared application state
    pub state: AppState,
    /// Path to static files directory
    pub static_dir: String,
    /// HTML page title
    pub title: String,
}

impl RouterConfig {
    /// Creates a new router configuration for a catalog
    pub fn new(catalog: Catalog) -> Self {
        Self {
            state: AppState::new(catalog),
            static_dir: "static".to_string(),
            title: "Audience Filters".to_string(),
        }
    }

    /// Sets the page title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the static files directory
    pub fn static_dir(mut self, dir: impl Into<String>) -> Self {
        self.static_dir = dir.into();
        self
    }
}

/// Creates the Axum router.
///
/// The router includes:
/// - `/` - Serves the page with both audience cards
/// - `/ws` - WebSocket endpoint, one session per connection
/// - `/static` - Serves static files (webui.js, webui.css)
pub fn create_router(config: RouterConfig) -> Router {
    let body = config.state.view().layout_html(config.state.catalog());
    let html_content = generate_html(&config.title, &body);

    Router::new()
        .route("/", get(move || async move {
            Html(html_content)
        }))
        .route("/ws", get(websocket_handler))
        .nest_service("/static", ServeDir::new(config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(config.state)
}

/// Binds `addr` and serves the router until the process stops.
pub async fn start_server(config: RouterConfig, addr: impl AsRef<str>) -> Result<(), std::io::Error> {
    let variables = config.state.catalog().len();
    let app = create_router(config);

    let listener = tokio::net::TcpListener::bind(addr.as_ref()).await?;
    info!(addr = addr.as_ref(), variables, "server running");

    axum::serve(listener, app).await
}
