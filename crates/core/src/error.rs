//! Fehlertypen fuer Plauderstube
//!
//! Zentraler Fehler-Enum fuer Startfehler, die mehrere Crates betreffen.
//! Laufzeitfehler im Relay und im Protokoll haben eigene Enums.

use thiserror::Error;

/// Globaler Result-Alias fuer Plauderstube
pub type Result<T> = std::result::Result<T, PlauderError>;

/// Crate-uebergreifende Fehler
///
/// Alle Varianten sind beim Start fatal: der Server bindet keinen Socket.
#[derive(Debug, Error)]
pub enum PlauderError {
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    /// Ein Identitaets-Pool (Namen oder Avatare) ist leer
    #[error("Leerer Pool: keine Eintraege fuer '{pool}' konfiguriert")]
    LeererPool { pool: String },
}

impl PlauderError {
    /// Erstellt einen Leerer-Pool-Fehler
    pub fn leerer_pool(pool: impl Into<String>) -> Self {
        Self::LeererPool { pool: pool.into() }
    }
}
