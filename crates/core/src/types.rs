//! Gemeinsame Identifikationstypen fuer Plauderstube
//!
//! Verbindungs-IDs verwenden das Newtype-Pattern, damit sie zur Compilezeit
//! nicht mit anderen Zahlen verwechselt werden koennen. Auf dem Draht
//! erscheinen sie als nackte Ganzzahl (`fd`).

use serde::{Deserialize, Serialize};

/// Verbindungs-ID, vom Transport vergeben
///
/// Eindeutig unter allen aktuell offenen Verbindungen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    /// Gibt den inneren Zahlenwert zurueck
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(wert: u64) -> Self {
        Self(wert)
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fd:{}", self.0)
    }
}

/// Identitaet einer Verbindung: Anzeigename und Avatar
///
/// Wird beim Oeffnen der Verbindung einmalig vergeben und danach nicht mehr
/// veraendert. Lebt genau so lange wie die Verbindung.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Verbindungs-ID (auf dem Draht: `fd`)
    pub fd: ConnectionId,
    /// Anzeigename aus dem Namens-Pool
    pub name: String,
    /// Avatar-Referenz (URL)
    pub avatar: String,
}

impl Identity {
    /// Erstellt eine neue Identitaet
    pub fn neu(fd: ConnectionId, name: impl Into<String>, avatar: impl Into<String>) -> Self {
        Self {
            fd,
            name: name.into(),
            avatar: avatar.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "fd:7");
    }

    #[test]
    fn connection_id_ist_auf_dem_draht_eine_zahl() {
        let json = serde_json::to_string(&ConnectionId(42)).unwrap();
        assert_eq!(json, "42");
        let id: ConnectionId = serde_json::from_str("42").unwrap();
        assert_eq!(id, ConnectionId(42));
    }

    #[test]
    fn identitaet_feldnamen() {
        let ident = Identity::neu(ConnectionId(3), "Gast", "https://example.org/a.png");
        let wert = serde_json::to_value(&ident).unwrap();
        assert_eq!(wert["fd"], 3);
        assert_eq!(wert["name"], "Gast");
        assert_eq!(wert["avatar"], "https://example.org/a.png");
    }
}
