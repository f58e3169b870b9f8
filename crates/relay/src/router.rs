//! Message-Router – Verteilt Chat-Nachrichten an die richtigen Verbindungen
//!
//! Der Router wird vom Verbindungs-Task fuer jedes Lebenszyklus-Ereignis
//! aufgerufen (geoeffnet, Nachricht, geschlossen), schlaegt den Absender in
//! der Registry nach, baut die ausgehenden Umschlaege und reicht sie an den
//! Transport.
//!
//! ## Verteilregeln
//! - Beitritt/Austritt: an alle ausser der ausloesenden Verbindung
//! - `public`: an alle, inklusive Absender (Echo)
//! - `private`: an Absender und Ziel; unbekanntes Ziel faellt still weg
//!
//! Fehler werden nie an Clients gemeldet, sie fuehren nur zum Verwerfen.

use plauderstube_core::{ConnectionId, Identity};
use plauderstube_protocol::{
    AusgehendeNachricht, EingehendeNachricht, ausgehend_kodieren, eingehend_dekodieren,
};
use std::sync::Arc;

use crate::server_state::RelayState;
use crate::transport::Transport;

/// Zentraler Message-Router
pub struct MessageRouter<T: Transport> {
    state: Arc<RelayState<T>>,
}

impl<T: Transport> Clone for MessageRouter<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Transport> MessageRouter<T> {
    /// Erstellt einen neuen Router
    pub fn neu(state: Arc<RelayState<T>>) -> Self {
        Self { state }
    }

    /// Gemeinsamer Zustand
    pub fn state(&self) -> &Arc<RelayState<T>> {
        &self.state
    }

    // -----------------------------------------------------------------------
    // Lebenszyklus
    // -----------------------------------------------------------------------

    /// Verbindung wurde geoeffnet
    ///
    /// Vergibt die Identitaet, registriert sie, schickt `openSuccess` an die
    /// neue Verbindung und den Beitritts-Hinweis an alle anderen.
    pub fn bei_oeffnung(&self, fd: ConnectionId) -> Identity {
        let identitaet = self.state.identitaeten.zuweisen(fd);

        if let Err(e) = self.state.registry.registrieren(fd, identitaet.clone()) {
            tracing::warn!(fd = %fd, fehler = %e, "Registry-Invariante verletzt – Eintrag ueberschrieben");
        }
        self.state.online_gauge_aktualisieren();

        tracing::info!(fd = %fd, name = %identitaet.name, "Client beigetreten");

        let begruessung =
            AusgehendeNachricht::open_success(identitaet.clone(), self.state.registry.momentaufnahme());
        self.an_verbindung_senden(fd, &begruessung);

        let hinweis = AusgehendeNachricht::beitritt(
            self.state.config.beitritt_fuer(&identitaet.name),
            identitaet.clone(),
        );
        self.an_alle_senden(&hinweis, Some(fd));

        identitaet
    }

    /// Rohe Client-Nachricht empfangen
    ///
    /// Ungueltige Nachrichten werden still verworfen, die Verbindung bleibt offen.
    pub fn bei_nachricht(&self, fd: ConnectionId, roh: &[u8]) {
        match eingehend_dekodieren(roh) {
            Ok(nachricht) => self.routen(fd, nachricht),
            Err(e) => {
                self.state.metriken.verworfene_nachrichten_total.inc();
                tracing::debug!(fd = %fd, fehler = %e, "Ungueltige Nachricht verworfen");
            }
        }
    }

    /// Routet eine bereits dekodierte Client-Nachricht
    pub fn routen(&self, fd: ConnectionId, nachricht: EingehendeNachricht) {
        let absender = match self.state.registry.nachschlagen(&fd) {
            Ok(ident) => ident,
            Err(e) => {
                self.state.metriken.verworfene_nachrichten_total.inc();
                tracing::debug!(fd = %fd, fehler = %e, "Nachricht von nicht aktiver Verbindung verworfen");
                return;
            }
        };

        self.state.metriken.nachricht_gezaehlt(nachricht.typ());

        match nachricht {
            EingehendeNachricht::Public(daten) => {
                let umschlag = AusgehendeNachricht::oeffentlich(absender, daten.message);
                let gesendet = self.an_alle_senden(&umschlag, None);
                tracing::debug!(fd = %fd, empfaenger = gesendet, "Oeffentliche Nachricht verteilt");
            }
            EingehendeNachricht::Private(daten) => {
                let ziel = daten.to_user_fd;
                let umschlag = AusgehendeNachricht::privat(absender, daten.message);
                let Some(text) = self.kodieren(&umschlag) else {
                    return;
                };

                // Absender sieht seine eigene Nachricht
                self.pushen(fd, &text);
                if ziel == fd {
                    return;
                }
                // Nur registrierte Verbindungen sind erreichbar, auch wenn
                // der Transport eine ausstehende Verbindung schon kennt
                if !self.state.registry.enthaelt(&ziel) {
                    tracing::debug!(fd = %fd, ziel = %ziel, "Ziel nicht aktiv – nur Echo zugestellt");
                    return;
                }
                self.pushen(ziel, &text);
                tracing::debug!(fd = %fd, ziel = %ziel, "Direktnachricht zugestellt");
            }
        }
    }

    /// Verbindung wurde geschlossen
    ///
    /// Schickt den Austritts-Hinweis an alle anderen und entfernt danach den
    /// Registry-Eintrag. Fuer unbekannte Verbindungen ein No-op.
    pub fn bei_schliessung(&self, fd: ConnectionId) {
        let identitaet = match self.state.registry.nachschlagen(&fd) {
            Ok(ident) => ident,
            Err(_) => {
                tracing::debug!(fd = %fd, "Close fuer bereits entfernte Verbindung ignoriert");
                return;
            }
        };

        let hinweis = AusgehendeNachricht::austritt(
            self.state.config.austritt_fuer(&identitaet.name),
            identitaet.clone(),
        );
        self.an_alle_senden(&hinweis, Some(fd));

        self.state.registry.entfernen(&fd);
        self.state.online_gauge_aktualisieren();

        tracing::info!(fd = %fd, name = %identitaet.name, "Client gegangen");
    }

    // -----------------------------------------------------------------------
    // Zustellung
    // -----------------------------------------------------------------------

    /// Sendet an alle Verbindungen der aktuellen Momentaufnahme
    ///
    /// `ausgenommen` wird uebersprungen. Gibt die Anzahl erfolgreicher
    /// Pushes zurueck.
    fn an_alle_senden(
        &self,
        nachricht: &AusgehendeNachricht,
        ausgenommen: Option<ConnectionId>,
    ) -> usize {
        let Some(text) = self.kodieren(nachricht) else {
            return 0;
        };

        let mut gesendet = 0;
        for ident in self.state.registry.momentaufnahme() {
            if Some(ident.fd) == ausgenommen {
                continue;
            }
            if self.pushen(ident.fd, &text) {
                gesendet += 1;
            }
        }
        gesendet
    }

    /// Sendet an genau eine Verbindung
    fn an_verbindung_senden(&self, fd: ConnectionId, nachricht: &AusgehendeNachricht) -> bool {
        match self.kodieren(nachricht) {
            Some(text) => self.pushen(fd, &text),
            None => false,
        }
    }

    fn pushen(&self, fd: ConnectionId, text: &str) -> bool {
        let ok = self.state.transport.push(fd, text);
        if !ok {
            self.state.metriken.pushes_fehlgeschlagen_total.inc();
        }
        ok
    }

    fn kodieren(&self, nachricht: &AusgehendeNachricht) -> Option<String> {
        match ausgehend_kodieren(nachricht) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(typ = nachricht.typ(), fehler = %e, "Kodierung fehlgeschlagen");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
