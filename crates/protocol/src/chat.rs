//! Chat-Nachrichten (WebSocket, JSON)
//!
//! Definiert die Umschlaege (Envelopes) die zwischen Client und Server
//! ausgetauscht werden.
//!
//! ## Design
//! - Eingehend: getaggter Enum, Diskriminator `type`, Nutzdaten unter `data`
//! - Ausgehend: getaggter Enum, Diskriminator `type`, Felder flach daneben
//! - Zeitstempel werden einmal pro Umschlag erzeugt, nicht pro Empfaenger

use chrono::{DateTime, Local, TimeZone};
use plauderstube_core::types::{ConnectionId, Identity};
use serde::{Deserialize, Serialize};

/// Format der `datetime`-Felder (`2024-05-01 13:37:00`)
pub const DATUM_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Eingehende Nachrichten (Client -> Server)
// ---------------------------------------------------------------------------

/// Nachricht vom Client
///
/// ```json
/// {"type": "public",  "data": {"message": "hallo"}}
/// {"type": "private", "data": {"message": "psst", "to_user_fd": 2}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum EingehendeNachricht {
    /// Nachricht an alle verbundenen Clients
    Public(OeffentlicheDaten),
    /// Direktnachricht an genau einen Client
    Private(PrivateDaten),
}

/// Nutzdaten einer oeffentlichen Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OeffentlicheDaten {
    pub message: String,
}

/// Nutzdaten einer Direktnachricht
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateDaten {
    pub message: String,
    /// Ziel-Verbindung
    pub to_user_fd: ConnectionId,
}

impl EingehendeNachricht {
    /// Erstellt eine oeffentliche Nachricht
    pub fn public(message: impl Into<String>) -> Self {
        Self::Public(OeffentlicheDaten {
            message: message.into(),
        })
    }

    /// Erstellt eine Direktnachricht
    pub fn private(message: impl Into<String>, to_user_fd: ConnectionId) -> Self {
        Self::Private(PrivateDaten {
            message: message.into(),
            to_user_fd,
        })
    }

    /// Gibt den Nachrichtentyp als String zurueck (fuer Logging/Metriken)
    pub fn typ(&self) -> &'static str {
        match self {
            Self::Public(_) => "public",
            Self::Private(_) => "private",
        }
    }
}

// ---------------------------------------------------------------------------
// Ausgehende Nachrichten (Server -> Client)
// ---------------------------------------------------------------------------

/// Chat-Inhalt mit Absender, eingebettet in `public_message`/`private_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatInhalt {
    /// Absender
    pub user: Identity,
    /// Nachrichtentext
    pub data: String,
}

/// Nachricht an den Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AusgehendeNachricht {
    /// Nur an die neue Verbindung: eigene Identitaet plus alle Online-User
    #[serde(rename = "openSuccess")]
    OpenSuccess { user: Identity, all: Vec<Identity> },

    /// Beitritts-Hinweis an alle anderen Verbindungen
    #[serde(rename = "open")]
    Open {
        message: String,
        datetime: String,
        user: Identity,
    },

    /// Austritts-Hinweis an alle verbleibenden Verbindungen
    #[serde(rename = "close")]
    Close {
        message: String,
        datetime: String,
        user: Identity,
    },

    /// Oeffentliche Chat-Nachricht (geht auch an den Absender zurueck)
    #[serde(rename = "public_message")]
    PublicMessage {
        message: ChatInhalt,
        datetime: String,
        user: Identity,
    },

    /// Direktnachricht (geht an Absender und Ziel)
    #[serde(rename = "private_message")]
    PrivateMessage {
        message: ChatInhalt,
        datetime: String,
        user: Identity,
    },
}

impl AusgehendeNachricht {
    /// Erstellt die Begruessung fuer eine neue Verbindung
    pub fn open_success(user: Identity, all: Vec<Identity>) -> Self {
        Self::OpenSuccess { user, all }
    }

    /// Erstellt einen Beitritts-Hinweis
    pub fn beitritt(message: impl Into<String>, user: Identity) -> Self {
        Self::Open {
            message: message.into(),
            datetime: zeitstempel_jetzt(),
            user,
        }
    }

    /// Erstellt einen Austritts-Hinweis
    pub fn austritt(message: impl Into<String>, user: Identity) -> Self {
        Self::Close {
            message: message.into(),
            datetime: zeitstempel_jetzt(),
            user,
        }
    }

    /// Erstellt eine oeffentliche Chat-Nachricht
    pub fn oeffentlich(user: Identity, text: impl Into<String>) -> Self {
        Self::PublicMessage {
            message: ChatInhalt {
                user: user.clone(),
                data: text.into(),
            },
            datetime: zeitstempel_jetzt(),
            user,
        }
    }

    /// Erstellt eine Direktnachricht
    pub fn privat(user: Identity, text: impl Into<String>) -> Self {
        Self::PrivateMessage {
            message: ChatInhalt {
                user: user.clone(),
                data: text.into(),
            },
            datetime: zeitstempel_jetzt(),
            user,
        }
    }

    /// Gibt den Wire-Typ zurueck
    pub fn typ(&self) -> &'static str {
        match self {
            Self::OpenSuccess { .. } => "openSuccess",
            Self::Open { .. } => "open",
            Self::Close { .. } => "close",
            Self::PublicMessage { .. } => "public_message",
            Self::PrivateMessage { .. } => "private_message",
        }
    }
}

// ---------------------------------------------------------------------------
// Zeitstempel
// ---------------------------------------------------------------------------

/// Aktuelle lokale Uhrzeit im `datetime`-Format
pub fn zeitstempel_jetzt() -> String {
    zeitstempel_formatieren(&Local::now())
}

/// Formatiert einen beliebigen Zeitpunkt im `datetime`-Format
pub fn zeitstempel_formatieren<Tz>(zeitpunkt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    zeitpunkt.format(DATUM_FORMAT).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
