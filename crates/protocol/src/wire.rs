//! Wire-Format fuer WebSocket-Verbindungen
//!
//! Jede WebSocket-Nachricht traegt genau einen JSON-Umschlag. Das Framing
//! selbst erledigt der WebSocket-Transport, dieses Modul kuemmert sich nur
//! um Groessenlimit und (De-)Serialisierung.

use thiserror::Error;

use crate::chat::{AusgehendeNachricht, EingehendeNachricht};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Nachrichtengroesse (1 MB)
pub const DEFAULT_MAX_NACHRICHT_GROESSE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Fehler beim Dekodieren/Kodieren eines Umschlags
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    /// Leere Nachricht empfangen
    #[error("Leere Nachricht")]
    Leer,

    /// Nachricht ueberschreitet das Groessenlimit
    #[error("Nachricht zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    ZuGross { groesse: usize, maximum: usize },

    /// Ungueltiges JSON, fehlendes Feld oder unbekannter `type`
    #[error("JSON-Deserialisierung fehlgeschlagen: {0}")]
    Dekodierung(#[source] serde_json::Error),

    /// Serialisierung fehlgeschlagen
    #[error("JSON-Serialisierung fehlgeschlagen: {0}")]
    Kodierung(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Dekodieren / Kodieren
// ---------------------------------------------------------------------------

/// Dekodiert eine Client-Nachricht mit dem Standard-Groessenlimit
pub fn eingehend_dekodieren(roh: &[u8]) -> Result<EingehendeNachricht, ProtokollFehler> {
    eingehend_dekodieren_mit_limit(roh, DEFAULT_MAX_NACHRICHT_GROESSE)
}

/// Dekodiert eine Client-Nachricht mit benutzerdefiniertem Groessenlimit
pub fn eingehend_dekodieren_mit_limit(
    roh: &[u8],
    max_groesse: usize,
) -> Result<EingehendeNachricht, ProtokollFehler> {
    if roh.is_empty() {
        return Err(ProtokollFehler::Leer);
    }

    if roh.len() > max_groesse {
        return Err(ProtokollFehler::ZuGross {
            groesse: roh.len(),
            maximum: max_groesse,
        });
    }

    serde_json::from_slice(roh).map_err(ProtokollFehler::Dekodierung)
}

/// Kodiert eine Server-Nachricht als JSON-Text
pub fn ausgehend_kodieren(nachricht: &AusgehendeNachricht) -> Result<String, ProtokollFehler> {
    serde_json::to_string(nachricht).map_err(ProtokollFehler::Kodierung)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
