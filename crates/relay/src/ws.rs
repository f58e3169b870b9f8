//! WebSocket-Listener – Bindet Socket, nimmt Upgrades an
//!
//! Der `RelayServer` bindet einen TCP-Socket und bedient ihn mit axum.
//! Jede angenommene WebSocket-Verbindung laeuft in einem eigenen Task
//! als `ClientConnection`.

use axum::extract::State;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use plauderstube_observability::request_timing_layer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::connection::ClientConnection;
use crate::server_state::RelayState;
use crate::transport::QueueTransport;

/// Zustand der Upgrade-Handler
#[derive(Clone)]
struct WsKontext {
    state: Arc<RelayState<QueueTransport>>,
    shutdown_rx: watch::Receiver<bool>,
}

/// WebSocket-Chat-Server
pub struct RelayServer {
    state: Arc<RelayState<QueueTransport>>,
    bind_addr: SocketAddr,
}

impl RelayServer {
    /// Erstellt einen neuen RelayServer
    pub fn neu(state: Arc<RelayState<QueueTransport>>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Baut den axum-Router (`GET /` und `GET /ws`)
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        let kontext = WsKontext {
            state: Arc::clone(&self.state),
            shutdown_rx,
        };

        Router::new()
            .route("/", get(ws_upgrade))
            .route("/ws", get(ws_upgrade))
            .layer(request_timing_layer())
            .with_state(kontext)
    }

    /// Bindet den Socket und bedient Verbindungen
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.starten_mit_listener(listener, shutdown_rx).await
    }

    /// Bedient einen bereits gebundenen Listener
    pub async fn starten_mit_listener(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let lokale_addr = listener.local_addr()?;
        tracing::info!(adresse = %lokale_addr, "WebSocket Chat-Server gestartet");

        let app = self.router(shutdown_rx.clone());
        let mut shutdown_rx = shutdown_rx;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while shutdown_rx.changed().await.is_ok() {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            })
            .await?;

        tracing::info!("Chat-Server gestoppt");
        Ok(())
    }
}

/// Nimmt ein WebSocket-Upgrade an oder lehnt es bei vollem Server ab
///
/// Der Platz wird vor dem Upgrade reserviert, damit gleichzeitige Upgrades
/// `max_clients` nicht ueberschreiten.
async fn ws_upgrade(ws: WebSocketUpgrade, State(kontext): State<WsKontext>) -> Response {
    let Some(platz) = kontext.state.platz_reservieren() else {
        tracing::warn!(
            belegt = kontext.state.belegte_plaetze(),
            max = kontext.state.config.max_clients,
            "Server voll – Verbindung abgelehnt"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Server voll").into_response();
    };

    let WsKontext { state, shutdown_rx } = kontext;
    ws.on_upgrade(move |socket: WebSocket| async move {
        ClientConnection::neu(state, platz)
            .verarbeiten(socket, shutdown_rx)
            .await;
    })
}
