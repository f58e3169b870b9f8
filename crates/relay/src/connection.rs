//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede WebSocket-Verbindung bekommt eine `ClientConnection` in einem
//! eigenen tokio-Task. Ereignisse einer Verbindung laufen damit strikt
//! nacheinander; verschiedene Verbindungen laufen parallel.
//!
//! ## State Machine
//! ```text
//! Ausstehend --oeffnen--> Aktiv --schliessen--> Geschlossen
//!      |                                           ^
//!      +----------------schliessen-----------------+
//! ```
//! Nachrichten werden nur im Zustand `Aktiv` geroutet, sonst verworfen.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use plauderstube_core::{ConnectionId, Identity};
use std::sync::Arc;
use tokio::sync::watch;

use crate::router::MessageRouter;
use crate::server_state::{PlatzReservierung, RelayState};
use crate::transport::{Anmeldung, QueueTransport, Transport};

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Zustand einer Verbindung aus Sicht des Relays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Transport hat angenommen, noch keine Identitaet
    Ausstehend,
    /// Registriert, darf senden und empfangen
    Aktiv,
    /// Endzustand, Eintrag entfernt
    Geschlossen,
}

// ---------------------------------------------------------------------------
// Sitzung
// ---------------------------------------------------------------------------

/// Lebenszyklus einer Verbindung, unabhaengig vom Socket
///
/// Beim Drop wird die Sitzung geschlossen, damit kein Registry-Eintrag
/// zurueckbleibt, auch wenn der Verbindungs-Task abbricht.
pub struct Sitzung<T: Transport> {
    router: MessageRouter<T>,
    fd: ConnectionId,
    zustand: VerbindungsZustand,
}

impl<T: Transport> Sitzung<T> {
    /// Erstellt eine neue Sitzung im Zustand `Ausstehend`
    pub fn neu(router: MessageRouter<T>, fd: ConnectionId) -> Self {
        Self {
            router,
            fd,
            zustand: VerbindungsZustand::Ausstehend,
        }
    }

    pub fn fd(&self) -> ConnectionId {
        self.fd
    }

    pub fn zustand(&self) -> VerbindungsZustand {
        self.zustand
    }

    /// Vergibt die Identitaet und aktiviert die Sitzung
    ///
    /// Gibt `None` zurueck wenn die Sitzung nicht mehr `Ausstehend` ist.
    pub fn oeffnen(&mut self) -> Option<Identity> {
        if self.zustand != VerbindungsZustand::Ausstehend {
            tracing::warn!(fd = %self.fd, zustand = ?self.zustand, "Oeffnen im falschen Zustand ignoriert");
            return None;
        }
        let identitaet = self.router.bei_oeffnung(self.fd);
        self.zustand = VerbindungsZustand::Aktiv;
        Some(identitaet)
    }

    /// Leitet eine rohe Client-Nachricht an den Router weiter
    pub fn empfangen(&self, roh: &[u8]) {
        if self.zustand != VerbindungsZustand::Aktiv {
            tracing::debug!(fd = %self.fd, zustand = ?self.zustand, "Nachricht ausserhalb von Aktiv verworfen");
            return;
        }
        self.router.bei_nachricht(self.fd, roh);
    }

    /// Schliesst die Sitzung; mehrfacher Aufruf ist ein No-op
    pub fn schliessen(&mut self) {
        match self.zustand {
            VerbindungsZustand::Aktiv => self.router.bei_schliessung(self.fd),
            VerbindungsZustand::Ausstehend => {}
            VerbindungsZustand::Geschlossen => return,
        }
        self.zustand = VerbindungsZustand::Geschlossen;
    }
}

impl<T: Transport> Drop for Sitzung<T> {
    fn drop(&mut self) {
        self.schliessen();
    }
}

// ---------------------------------------------------------------------------
// ClientConnection
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung
///
/// Liest Frames, reicht sie an die `Sitzung` und schreibt alles, was der
/// Router in die Send-Queue der Verbindung legt, auf den Socket.
/// Haelt den reservierten Verbindungsplatz bis zum Ende der Verbindung.
pub struct ClientConnection {
    state: Arc<RelayState<QueueTransport>>,
    platz: PlatzReservierung,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState<QueueTransport>>, platz: PlatzReservierung) -> Self {
        Self { state, platz }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, ein Socket-Fehler auftritt oder ein
    /// Shutdown-Signal eingeht.
    pub async fn verarbeiten(self, socket: WebSocket, mut shutdown_rx: watch::Receiver<bool>) {
        let (fd, mut sende_rx) = self.state.transport.verbindung_anmelden();
        let (mut ws_sender, mut ws_receiver) = socket.split();

        tracing::info!(fd = %fd, "Neue Verbindung");

        // Drop-Reihenfolge: erst Transport abmelden, dann Sitzung schliessen
        let mut sitzung = Sitzung::neu(MessageRouter::neu(Arc::clone(&self.state)), fd);
        let anmeldung = Anmeldung::neu(self.state.transport.clone(), fd);
        sitzung.oeffnen();

        loop {
            tokio::select! {
                // Eingehende Nachricht vom Client
                frame = ws_receiver.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            tracing::trace!(fd = %fd, bytes = text.len(), "Text-Frame empfangen");
                            sitzung.empfangen(text.as_bytes());
                        }
                        Some(Ok(Message::Binary(daten))) => {
                            tracing::trace!(fd = %fd, bytes = daten.len(), "Binaer-Frame empfangen");
                            sitzung.empfangen(&daten);
                        }
                        // Ping-Antworten uebernimmt axum
                        Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(fd = %fd, "Verbindung vom Client getrennt");
                            break;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(fd = %fd, fehler = %e, "Frame-Lesefehler");
                            break;
                        }
                    }
                }

                // Ausgehende Nachricht aus dem Router
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = ws_sender.send(Message::Text(ausgehend)).await {
                        tracing::warn!(fd = %fd, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(fd = %fd, "Shutdown-Signal – Verbindung wird getrennt");
                        break;
                    }
                }
            }
        }

        // Erst abmelden, damit keine weiteren Pushes die Verbindung erreichen
        drop(anmeldung);
        sitzung.schliessen();
        let _ = ws_sender.close().await;
        drop(self.platz);

        tracing::info!(fd = %fd, "Verbindungs-Task beendet");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityPool;
    use crate::server_state::RelayConfig;
    use plauderstube_observability::PlauderMetrics;

    fn test_state() -> Arc<RelayState<QueueTransport>> {
        RelayState::neu(
            RelayConfig::default(),
            IdentityPool::neu(vec!["Anna".into()], vec!["a.png".into()]).unwrap(),
            QueueTransport::neu(),
            PlauderMetrics::neu().unwrap(),
        )
    }

    fn sitzung(state: &Arc<RelayState<QueueTransport>>) -> Sitzung<QueueTransport> {
        let (fd, _rx) = state.transport.verbindung_anmelden();
        Sitzung::neu(MessageRouter::neu(Arc::clone(state)), fd)
    }

    #[test]
    fn zustandsfolge() {
        let state = test_state();
        let mut s = sitzung(&state);
        assert_eq!(s.zustand(), VerbindungsZustand::Ausstehend);
        assert!(!state.registry.enthaelt(&s.fd()));

        let ident = s.oeffnen().expect("Identitaet erwartet");
        assert_eq!(ident.name, "Anna");
        assert_eq!(s.zustand(), VerbindungsZustand::Aktiv);
        assert!(state.registry.enthaelt(&s.fd()));

        s.schliessen();
        assert_eq!(s.zustand(), VerbindungsZustand::Geschlossen);
        assert!(!state.registry.enthaelt(&s.fd()));
    }

    #[test]
    fn doppeltes_oeffnen_ignoriert() {
        let state = test_state();
        let mut s = sitzung(&state);
        assert!(s.oeffnen().is_some());
        assert!(s.oeffnen().is_none());
        assert_eq!(state.registry.anzahl(), 1);
    }

    #[test]
    fn geschlossene_sitzung_oeffnet_nicht_wieder() {
        let state = test_state();
        let mut s = sitzung(&state);
        s.schliessen();
        assert!(s.oeffnen().is_none());
        assert!(state.registry.ist_leer());
    }

    #[test]
    fn nachricht_im_ausstehend_zustand_verworfen() {
        let state = test_state();
        let s = sitzung(&state);
        s.empfangen(br#"{"type":"public","data":{"message":"zu frueh"}}"#);
        assert_eq!(state.metriken.nachrichten_total.with_label_values(&["public"]).get(), 0);
    }

    #[test]
    fn abbruch_raeumt_transport_und_registry_auf() {
        let state = test_state();
        let (fd, _rx) = state.transport.verbindung_anmelden();
        {
            // Gleiche Reihenfolge wie im Verbindungs-Task
            let mut s = Sitzung::neu(MessageRouter::neu(Arc::clone(&state)), fd);
            let _anmeldung = Anmeldung::neu(state.transport.clone(), fd);
            s.oeffnen();
            assert!(state.transport.ist_angemeldet(&fd));
        }
        assert!(!state.transport.ist_angemeldet(&fd));
        assert!(state.registry.ist_leer());
    }

    #[test]
    fn drop_raeumt_registry_auf() {
        let state = test_state();
        {
            let mut s = sitzung(&state);
            s.oeffnen();
            assert_eq!(state.registry.anzahl(), 1);
        }
        assert!(state.registry.ist_leer());
    }
}
