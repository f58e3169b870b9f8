//! Structured Logging Setup via tracing-subscriber
//!
//! Die Konfigurationsdatei liefert Level und Format. Umgebungsvariablen
//! haben Vorrang:
//! - `PLAUDERSTUBE_LOG`: Filter-Direktive (z.B. `debug` oder
//!   `plauderstube_relay=trace`)
//! - `PLAUDERSTUBE_LOG_FORMAT`: `text` oder `json`

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Umgebungsvariable fuer den Log-Filter
pub const LOG_ENV: &str = "PLAUDERSTUBE_LOG";

/// Umgebungsvariable fuer das Log-Format
pub const LOG_FORMAT_ENV: &str = "PLAUDERSTUBE_LOG_FORMAT";

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Menschenlesbar, eine Zeile pro Ereignis
    Text,
    /// Eine JSON-Zeile pro Ereignis (fuer Log-Sammler)
    Json,
}

impl LogFormat {
    /// Parst `text` / `json` (nur Kleinschreibung)
    pub fn parsen(format: &str) -> Option<Self> {
        match format {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Baut den Filter: `PLAUDERSTUBE_LOG` > `level` > `info`
pub fn filter_bauen(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialisiert das Logging-System
///
/// Ein unbekanntes Format faellt auf `text` zurueck. Schlaegt fehl wenn
/// bereits ein globaler Subscriber gesetzt ist.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<()> {
    let filter = filter_bauen(level);
    let format = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|f| LogFormat::parsen(&f))
        .or_else(|| LogFormat::parsen(format))
        .unwrap_or(LogFormat::Text);

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    ergebnis.map_err(|e| anyhow!("Logging konnte nicht initialisiert werden: {e}"))
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    LogFormat::parsen(format).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level} muss gueltig sein");
        }
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO"));
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn format_parsen() {
        assert_eq!(LogFormat::parsen("text"), Some(LogFormat::Text));
        assert_eq!(LogFormat::parsen("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parsen("JSON"), None);
        assert!(!log_format_gueltig("xml"));
    }

    #[test]
    fn filter_faellt_bei_unsinn_zurueck() {
        // Darf nicht paniken, auch wenn die Direktive ungueltig ist
        let _ = filter_bauen("==kaputt==");
    }
}
