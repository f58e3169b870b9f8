//! Gemeinsamer Server-Zustand fuer den Relay
//!
//! Haelt Registry, Identitaets-Pool, Transport und Metriken einer
//! Server-Instanz. Es gibt keinen prozessweiten Singleton: jede Instanz
//! besitzt ihren eigenen Zustand und reicht ihn per `Arc` weiter.

use plauderstube_observability::PlauderMetrics;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::identity::IdentityPool;
use crate::registry::ConnectionRegistry;
use crate::transport::Transport;

/// Platzhalter im Beitritts-/Austrittstext fuer den Anzeigenamen
pub const NAME_PLATZHALTER: &str = "{name}";

/// Konfiguration fuer den Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximale gleichzeitige Verbindungen (0 = unbegrenzt)
    pub max_clients: u32,
    /// Text des Beitritts-Hinweises, `{name}` wird ersetzt
    pub beitritt_text: String,
    /// Text des Austritts-Hinweises, `{name}` wird ersetzt
    pub austritt_text: String,
}

impl RelayConfig {
    /// Beitritts-Hinweis fuer einen Anzeigenamen
    pub fn beitritt_fuer(&self, name: &str) -> String {
        self.beitritt_text.replace(NAME_PLATZHALTER, name)
    }

    /// Austritts-Hinweis fuer einen Anzeigenamen
    pub fn austritt_fuer(&self, name: &str) -> String {
        self.austritt_text.replace(NAME_PLATZHALTER, name)
    }

    /// Prueft ob bei `online` Verbindungen noch Platz ist
    pub fn hat_platz(&self, online: usize) -> bool {
        self.max_clients == 0 || online < self.max_clients as usize
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_clients: 0,
            beitritt_text: "{name}进入聊天室".to_string(),
            austritt_text: "{name}离开聊天室".to_string(),
        }
    }
}

/// Gemeinsamer Relay-Zustand (thread-safe, Arc-geteilt)
pub struct RelayState<T: Transport> {
    /// Relay-Konfiguration
    pub config: Arc<RelayConfig>,
    /// Wer ist gerade verbunden
    pub registry: ConnectionRegistry,
    /// Namen und Avatare fuer neue Verbindungen
    pub identitaeten: IdentityPool,
    /// Zustellung an einzelne Verbindungen
    pub transport: T,
    /// Prometheus-Metriken
    pub metriken: PlauderMetrics,
    /// Reservierte Verbindungsplaetze (Upgrade bis Verbindungsende)
    belegte_plaetze: Arc<AtomicUsize>,
}

impl<T: Transport> RelayState<T> {
    /// Erstellt einen neuen RelayState
    pub fn neu(
        config: RelayConfig,
        identitaeten: IdentityPool,
        transport: T,
        metriken: PlauderMetrics,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            registry: ConnectionRegistry::neu(),
            identitaeten,
            transport,
            metriken,
            belegte_plaetze: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Reserviert atomar einen Verbindungsplatz gegen `max_clients`
    ///
    /// Gibt `None` zurueck wenn der Server voll ist. Der Platz bleibt belegt
    /// bis die zurueckgegebene Reservierung gedroppt wird.
    pub fn platz_reservieren(&self) -> Option<PlatzReservierung> {
        self.belegte_plaetze
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |belegt| {
                self.config.hat_platz(belegt).then_some(belegt + 1)
            })
            .ok()?;
        Some(PlatzReservierung {
            plaetze: Arc::clone(&self.belegte_plaetze),
        })
    }

    /// Anzahl aktuell reservierter Verbindungsplaetze
    pub fn belegte_plaetze(&self) -> usize {
        self.belegte_plaetze.load(Ordering::Acquire)
    }

    /// Aktualisiert die Gauge der verbundenen Clients aus der Registry
    pub(crate) fn online_gauge_aktualisieren(&self) {
        self.metriken
            .verbundene_clients
            .set(self.registry.anzahl() as i64);
    }
}

/// Belegter Verbindungsplatz; wird beim Drop freigegeben
#[derive(Debug)]
pub struct PlatzReservierung {
    plaetze: Arc<AtomicUsize>,
}

impl Drop for PlatzReservierung {
    fn drop(&mut self) {
        self.plaetze.fetch_sub(1, Ordering::AcqRel);
    }
}
