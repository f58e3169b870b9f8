//! Connection-Registry – Wer ist gerade verbunden?
//!
//! Haelt die ephemere Zuordnung Verbindungs-ID -> Identitaet aller aktiven
//! Verbindungen. Ein Eintrag existiert genau dann, wenn die Verbindung offen
//! ist und ihre Identitaet bereits vergeben wurde.
//!
//! ## Nebenlaeufigkeit
//! Die DashMap sperrt pro Shard. Einfuegen und Entfernen sind damit atomar
//! pro Eintrag; eine Momentaufnahme sieht nie einen halb geschriebenen
//! Eintrag. Ein gleichzeitiges Entfernen waehrend der Momentaufnahme fuehrt
//! hoechstens dazu, dass genau dieser Eintrag fehlt oder noch enthalten ist.

use dashmap::DashMap;
use plauderstube_core::{ConnectionId, Identity};
use std::sync::Arc;

use crate::error::{RelayError, RelayResult};

/// Registry aller aktiven Verbindungen
///
/// Thread-safe via Arc + DashMap. Clone der Registry teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    eintraege: Arc<DashMap<ConnectionId, Identity>>,
}

impl ConnectionRegistry {
    /// Erstellt eine leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert eine Verbindung mit ihrer Identitaet
    ///
    /// War die ID bereits vergeben, wird der Eintrag trotzdem ueberschrieben
    /// und `DoppelteVerbindung` zurueckgegeben. Der Aufrufer loggt das und
    /// macht weiter.
    pub fn registrieren(&self, fd: ConnectionId, identitaet: Identity) -> RelayResult<()> {
        match self.eintraege.insert(fd, identitaet) {
            None => {
                tracing::debug!(fd = %fd, "Verbindung registriert");
                Ok(())
            }
            Some(_) => Err(RelayError::DoppelteVerbindung(fd)),
        }
    }

    /// Gibt die Identitaet einer Verbindung zurueck
    pub fn nachschlagen(&self, fd: &ConnectionId) -> RelayResult<Identity> {
        self.eintraege
            .get(fd)
            .map(|e| e.value().clone())
            .ok_or(RelayError::NichtGefunden(*fd))
    }

    /// Entfernt eine Verbindung
    ///
    /// Kein Fehler wenn sie bereits fehlt (doppelte Close-Meldung).
    /// Gibt die entfernte Identitaet zurueck falls vorhanden.
    pub fn entfernen(&self, fd: &ConnectionId) -> Option<Identity> {
        let entfernt = self.eintraege.remove(fd).map(|(_, ident)| ident);
        if entfernt.is_some() {
            tracing::debug!(fd = %fd, "Verbindung aus Registry entfernt");
        }
        entfernt
    }

    /// Konsistente Kopie aller Eintraege, aufsteigend nach Verbindungs-ID
    ///
    /// Die Kopie ist vom Live-Zustand entkoppelt und kann gefahrlos
    /// iteriert werden, waehrend andere Tasks registrieren oder entfernen.
    pub fn momentaufnahme(&self) -> Vec<Identity> {
        let mut alle: Vec<Identity> = self
            .eintraege
            .iter()
            .map(|e| e.value().clone())
            .collect();
        alle.sort_by_key(|ident| ident.fd);
        alle
    }

    /// Prueft ob eine Verbindung registriert ist
    pub fn enthaelt(&self, fd: &ConnectionId) -> bool {
        self.eintraege.contains_key(fd)
    }

    /// Anzahl registrierter Verbindungen
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }

    pub fn ist_leer(&self) -> bool {
        self.eintraege.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
