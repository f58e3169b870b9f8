//! Fehlertypen fuer den Relay-Kern

use plauderstube_core::ConnectionId;
use thiserror::Error;

/// Fehlertyp fuer den Relay-Kern
///
/// Keiner dieser Fehler wird an einen Client gemeldet; sie werden
/// geloggt und die jeweilige Operation entfaellt.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Verbindungs-ID ist nicht (mehr) registriert
    #[error("Nicht gefunden: {0}")]
    NichtGefunden(ConnectionId),

    /// Verbindungs-ID war bereits registriert (Invariante verletzt)
    #[error("Doppelte Verbindung: {0}")]
    DoppelteVerbindung(ConnectionId),
}

/// Result-Typ fuer den Relay-Kern
pub type RelayResult<T> = Result<T, RelayError>;
