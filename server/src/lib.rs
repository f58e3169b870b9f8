//! plauderstube-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use anyhow::{Context, Result};
use config::ServerConfig;
use plauderstube_observability::{PlauderMetrics, observability_server_starten};
use plauderstube_relay::{IdentityPool, QueueTransport, RelayServer, RelayState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Konfiguration validieren (Fehler sind fatal, noch kein Socket)
    /// 2. Identitaets-Pool, Metriken und Relay-Zustand aufbauen
    /// 3. Observability-Server starten (falls aktiviert)
    /// 4. WebSocket-Listener starten
    /// 5. Auf Ctrl-C warten und alle Subsysteme per watch-Signal beenden
    pub async fn starten(self) -> Result<()> {
        self.config.validieren()?;

        let chat_addr: SocketAddr = self
            .config
            .chat_bind_adresse()
            .parse()
            .with_context(|| format!("Ungueltige Chat-Adresse '{}'", self.config.chat_bind_adresse()))?;

        let pool = IdentityPool::neu(self.config.chat.name.clone(), self.config.chat.avatar.clone())?;
        let metriken = PlauderMetrics::neu()?;
        let state = RelayState::neu(
            self.config.relay_config(),
            pool,
            QueueTransport::neu(),
            metriken.clone(),
        );

        tracing::info!(
            chat = %chat_addr,
            namen = self.config.chat.name.len(),
            max_clients = self.config.chat.max_clients,
            "Server startet"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Observability-Server (Metriken + Health)
        let observability_handle = if self.config.observability.aktiviert {
            let obs_addr: SocketAddr = self
                .config
                .observability_bind_adresse()
                .parse()
                .with_context(|| {
                    format!(
                        "Ungueltige Observability-Adresse '{}'",
                        self.config.observability_bind_adresse()
                    )
                })?;
            let obs_rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = observability_server_starten(obs_addr, metriken, obs_rx).await {
                    tracing::error!(fehler = %e, "Observability-Server fehlgeschlagen");
                }
            }))
        } else {
            tracing::info!("Observability-Server deaktiviert");
            None
        };

        // Ctrl-C -> Shutdown-Signal
        let signal_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Signal-Handler fehlgeschlagen"),
            }
            let _ = signal_tx.send(true);
        });

        let ergebnis = RelayServer::neu(Arc::clone(&state), chat_addr)
            .starten(shutdown_rx)
            .await
            .with_context(|| format!("Chat-Listener auf {chat_addr} fehlgeschlagen"));

        // Auch bei Listener-Fehler alle anderen Subsysteme beenden
        let _ = shutdown_tx.send(true);
        if let Some(handle) = observability_handle {
            let _ = handle.await;
        }

        tracing::info!(online = state.registry.anzahl(), "Server beendet");
        ergebnis
    }
}
