//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use plauderstube_core::PlauderError;
use plauderstube_observability::logging::{log_format_gueltig, log_level_gueltig};
use plauderstube_relay::RelayConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Chat-Einstellungen (Listener, Identitaeten, Hinweistexte)
    pub chat: ChatEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Chat-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatEinstellungen {
    /// Bind-Adresse des WebSocket-Listeners
    pub ip: String,
    /// Port des WebSocket-Listeners
    pub port: u16,
    /// Pool der Anzeigenamen (zufaellige Auswahl)
    pub name: Vec<String>,
    /// Pool der Avatare (es wird immer der erste vergeben)
    pub avatar: Vec<String>,
    /// Beitritts-Hinweis, `{name}` wird ersetzt
    pub beitritt_text: String,
    /// Austritts-Hinweis, `{name}` wird ersetzt
    pub austritt_text: String,
    /// Maximale gleichzeitige Verbindungen (0 = unbegrenzt)
    pub max_clients: u32,
}

impl Default for ChatEinstellungen {
    fn default() -> Self {
        let relay = RelayConfig::default();
        Self {
            ip: "0.0.0.0".into(),
            port: 9501,
            name: ["Anna", "Bert", "Cleo", "Dana", "Emil", "Frieda"]
                .into_iter()
                .map(String::from)
                .collect(),
            avatar: vec!["/avatare/standard.png".into()],
            beitritt_text: relay.beitritt_text,
            austritt_text: relay.austritt_text,
            max_clients: relay.max_clients,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9502)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9502,
        }
    }
}

/// Herkunft der geladenen Konfiguration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KonfigQuelle {
    /// Aus der angegebenen Datei gelesen
    Datei,
    /// Datei fehlt, Standardwerte verwendet
    Standard,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    ///
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    /// Loggt selbst nichts, da das Logging erst mit dieser Konfiguration
    /// initialisiert wird; der Aufrufer meldet `KonfigQuelle::Standard`.
    pub fn laden(pfad: &str) -> anyhow::Result<(Self, KonfigQuelle)> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok((config, KonfigQuelle::Datei))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok((Self::default(), KonfigQuelle::Standard))
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft die Konfiguration vor dem Binden eines Sockets
    pub fn validieren(&self) -> plauderstube_core::Result<()> {
        if self.chat.name.is_empty() {
            return Err(PlauderError::leerer_pool("name"));
        }
        if self.chat.avatar.is_empty() {
            return Err(PlauderError::leerer_pool("avatar"));
        }
        if !log_level_gueltig(&self.logging.level) {
            return Err(PlauderError::Konfiguration(format!(
                "Ungueltiges Log-Level '{}'",
                self.logging.level
            )));
        }
        if !log_format_gueltig(&self.logging.format) {
            return Err(PlauderError::Konfiguration(format!(
                "Ungueltiges Log-Format '{}'",
                self.logging.format
            )));
        }
        Ok(())
    }

    /// Relay-Einstellungen aus dem `[chat]`-Abschnitt
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            max_clients: self.chat.max_clients,
            beitritt_text: self.chat.beitritt_text.clone(),
            austritt_text: self.chat.austritt_text.clone(),
        }
    }

    /// Gibt die vollstaendige Bind-Adresse fuer den Chat-Listener zurueck
    pub fn chat_bind_adresse(&self) -> String {
        format!("{}:{}", self.chat.ip, self.chat.port)
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!("{}:{}", self.chat.ip, self.observability.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.chat.port, 9501);
        assert_eq!(cfg.chat.max_clients, 0);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.chat.beitritt_text, "{name}进入聊天室");
        assert!(cfg.validieren().is_ok());
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.chat_bind_adresse(), "0.0.0.0:9501");
        assert_eq!(cfg.observability_bind_adresse(), "0.0.0.0:9502");
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [chat]
            port = 9000
            name = ["Xia", "Yun"]
            avatar = ["https://bilder.example/x.png", "https://bilder.example/y.png"]

            [logging]
            format = "json"
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.chat.port, 9000);
        assert_eq!(cfg.chat.name, vec!["Xia", "Yun"]);
        assert_eq!(cfg.chat.avatar.len(), 2);
        assert_eq!(cfg.logging.format, "json");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.chat.ip, "0.0.0.0");
        assert_eq!(cfg.logging.level, "info");
        assert!(cfg.observability.aktiviert);
    }

    #[test]
    fn leere_pools_sind_fatal() {
        let mut cfg = ServerConfig::default();
        cfg.chat.name.clear();
        let fehler = cfg.validieren().unwrap_err();
        assert!(matches!(fehler, PlauderError::LeererPool { ref pool } if pool == "name"));

        let mut cfg = ServerConfig::default();
        cfg.chat.avatar.clear();
        assert!(matches!(
            cfg.validieren(),
            Err(PlauderError::LeererPool { ref pool }) if pool == "avatar"
        ));
    }

    #[test]
    fn ungueltiges_logging_ist_fatal() {
        let mut cfg = ServerConfig::default();
        cfg.logging.level = "laut".into();
        assert!(matches!(cfg.validieren(), Err(PlauderError::Konfiguration(_))));

        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        assert!(matches!(cfg.validieren(), Err(PlauderError::Konfiguration(_))));
    }

    #[test]
    fn relay_config_uebernimmt_chat_werte() {
        let mut cfg = ServerConfig::default();
        cfg.chat.max_clients = 3;
        cfg.chat.beitritt_text = "hallo {name}".into();
        let relay = cfg.relay_config();
        assert_eq!(relay.max_clients, 3);
        assert_eq!(relay.beitritt_fuer("Anna"), "hallo Anna");
    }

    #[test]
    fn fehlende_datei_liefert_standardwerte() {
        let (cfg, quelle) = ServerConfig::laden("/gibt/es/nicht/plauderstube.toml").unwrap();
        assert_eq!(quelle, KonfigQuelle::Standard);
        assert_eq!(cfg.chat.port, 9501);
    }

    #[test]
    fn datei_wird_gelesen() {
        let pfad = std::env::temp_dir().join(format!("plauderstube-{}.toml", std::process::id()));
        std::fs::write(&pfad, "[chat]\nport = 9100\n").unwrap();

        let ergebnis = ServerConfig::laden(pfad.to_str().unwrap());
        let _ = std::fs::remove_file(&pfad);

        let (cfg, quelle) = ergebnis.unwrap();
        assert_eq!(quelle, KonfigQuelle::Datei);
        assert_eq!(cfg.chat.port, 9100);
    }
}
