//! Transport – Push von fertig serialisierten Nachrichten an eine Verbindung
//!
//! Der Relay-Kern kennt nur `Transport::push`. Die `QueueTransport`-
//! Implementierung haelt pro Verbindung eine begrenzte Send-Queue, aus der
//! der Verbindungs-Task liest und auf den Socket schreibt.
//!
//! Pushes blockieren nie: ist die Queue voll oder die Verbindung weg, wird
//! die Nachricht verworfen und `false` zurueckgegeben.

use dashmap::DashMap;
use plauderstube_core::ConnectionId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Groesse der Send-Queue pro Verbindung
const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// Transport-Trait
// ---------------------------------------------------------------------------

/// Schnittstelle des Kerns zum Transport
pub trait Transport: Send + Sync + 'static {
    /// Stellt eine Nachricht fuer die Verbindung `fd` zu
    ///
    /// Gibt `false` zurueck wenn die Verbindung unbekannt, geschlossen oder
    /// ueberlastet ist. Der Aufrufer ignoriert das Ergebnis.
    fn push(&self, fd: ConnectionId, nachricht: &str) -> bool;
}

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue einer Verbindung
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub fd: ConnectionId,
    pub tx: mpsc::Sender<String>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: String) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(fd = %self.fd, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(fd = %self.fd, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// QueueTransport
// ---------------------------------------------------------------------------

/// Queue-basierter Transport
///
/// Vergibt die Verbindungs-IDs (fortlaufend ab 1) und haelt die Send-Queues
/// aller angemeldeten Verbindungen. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct QueueTransport {
    inner: Arc<QueueTransportInner>,
}

struct QueueTransportInner {
    /// Client-Sender, indiziert nach Verbindungs-ID
    clients: DashMap<ConnectionId, ClientSender>,
    /// Naechste freie Verbindungs-ID
    naechste_id: AtomicU64,
    /// Groesse jeder Send-Queue
    queue_groesse: usize,
}

impl QueueTransport {
    /// Erstellt einen neuen Transport mit Standard-Queue-Groesse
    pub fn neu() -> Self {
        Self::mit_queue_groesse(SEND_QUEUE_GROESSE)
    }

    /// Erstellt einen neuen Transport mit eigener Queue-Groesse
    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(QueueTransportInner {
                clients: DashMap::new(),
                naechste_id: AtomicU64::new(1),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Meldet eine neue Verbindung an
    ///
    /// Vergibt eine unverbrauchte Verbindungs-ID und gibt die Empfangs-Queue
    /// zurueck, aus der der Verbindungs-Task liest.
    pub fn verbindung_anmelden(&self) -> (ConnectionId, mpsc::Receiver<String>) {
        let fd = ConnectionId(self.inner.naechste_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        self.inner.clients.insert(fd, ClientSender { fd, tx });
        tracing::debug!(fd = %fd, "Verbindung im Transport angemeldet");
        (fd, rx)
    }

    /// Meldet eine Verbindung ab; weitere Pushes schlagen fehl
    pub fn verbindung_abmelden(&self, fd: &ConnectionId) {
        if self.inner.clients.remove(fd).is_some() {
            tracing::debug!(fd = %fd, "Verbindung im Transport abgemeldet");
        }
    }

    /// Prueft ob eine Verbindung angemeldet ist
    #[cfg(test)]
    pub(crate) fn ist_angemeldet(&self, fd: &ConnectionId) -> bool {
        self.inner.clients.contains_key(fd)
    }

    /// Anzahl angemeldeter Verbindungen
    #[cfg(test)]
    pub(crate) fn anzahl(&self) -> usize {
        self.inner.clients.len()
    }
}

/// Meldet eine Verbindung beim Drop im Transport ab
///
/// Haelt der Verbindungs-Task diese Anmeldung, wird die Send-Queue auch dann
/// entfernt, wenn der Task abbricht.
pub struct Anmeldung {
    transport: QueueTransport,
    fd: ConnectionId,
}

impl Anmeldung {
    /// Uebernimmt die Abmeldung fuer `fd`
    pub fn neu(transport: QueueTransport, fd: ConnectionId) -> Self {
        Self { transport, fd }
    }

    pub fn fd(&self) -> ConnectionId {
        self.fd
    }
}

impl Drop for Anmeldung {
    fn drop(&mut self) {
        self.transport.verbindung_abmelden(&self.fd);
    }
}

impl Default for QueueTransport {
    fn default() -> Self {
        Self::neu()
    }
}

impl Transport for QueueTransport {
    fn push(&self, fd: ConnectionId, nachricht: &str) -> bool {
        // Sender klonen, damit der Shard-Lock nicht waehrend try_send gehalten wird
        let sender = match self.inner.clients.get(&fd) {
            Some(sender) => sender.clone(),
            None => {
                tracing::debug!(fd = %fd, "Push an unbekannte Verbindung");
                return false;
            }
        };
        sender.senden(nachricht.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
