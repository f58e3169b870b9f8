//! Health-Check-Endpunkt
//!
//! `GET /health` liefert immer 200, solange der Prozess Anfragen beantwortet.
//! Der Body fasst die wichtigsten Zaehler aus den Metriken zusammen.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::metrics::PlauderMetrics;

/// Status im Health-Body (derzeit immer `ok`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
}

/// Body von `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    /// Aktuell registrierte Verbindungen
    pub online_clients: i64,
    /// Summe aller gerouteten Chat-Nachrichten
    pub nachrichten: u64,
    pub verworfene_nachrichten: u64,
}

impl HealthResponse {
    /// Liest die aktuellen Werte aus den Metriken
    pub fn erfassen(metriken: &PlauderMetrics, seit: Instant) -> Self {
        let nachrichten = ["public", "private"]
            .into_iter()
            .map(|typ| metriken.nachrichten_total.with_label_values(&[typ]).get())
            .sum();

        Self {
            status: HealthStatus::Ok,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: seit.elapsed().as_secs(),
            online_clients: metriken.verbundene_clients.get(),
            nachrichten,
            verworfene_nachrichten: metriken.verworfene_nachrichten_total.get(),
        }
    }
}

#[derive(Clone)]
struct HealthKontext {
    metriken: PlauderMetrics,
    start: Instant,
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(metriken: PlauderMetrics) -> Router {
    let kontext = HealthKontext {
        metriken,
        start: Instant::now(),
    };
    Router::new()
        .route("/health", get(health_handler))
        .with_state(kontext)
}

async fn health_handler(State(kontext): State<HealthKontext>) -> Json<HealthResponse> {
    Json(HealthResponse::erfassen(&kontext.metriken, kontext.start))
}
