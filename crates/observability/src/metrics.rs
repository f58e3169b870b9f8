//! Prometheus-kompatible Metriken fuer Plauderstube
//!
//! Registrierte Metriken:
//! - `plauderstube_verbundene_clients` – Gauge: Aktuell registrierte Verbindungen
//! - `plauderstube_nachrichten_total` – Counter (typ): Geroutete Chat-Nachrichten
//! - `plauderstube_verworfene_nachrichten_total` – Counter: Ungueltige Client-Nachrichten
//! - `plauderstube_pushes_fehlgeschlagen_total` – Counter: Nicht zustellbare Pushes

use anyhow::Result;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Alle Plauderstube-Prometheus-Metriken
///
/// Clone teilt die Registry und alle Metrik-Handles.
#[derive(Clone)]
pub struct PlauderMetrics {
    pub registry: Arc<Registry>,

    pub verbundene_clients: IntGauge,
    pub nachrichten_total: IntCounterVec,
    pub verworfene_nachrichten_total: IntCounter,
    pub pushes_fehlgeschlagen_total: IntCounter,
}

impl PlauderMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let verbundene_clients = IntGauge::with_opts(Opts::new(
            "plauderstube_verbundene_clients",
            "Anzahl aktuell registrierter Verbindungen",
        ))?;
        registry.register(Box::new(verbundene_clients.clone()))?;

        let nachrichten_total = IntCounterVec::new(
            Opts::new(
                "plauderstube_nachrichten_total",
                "Gesamtanzahl gerouteter Chat-Nachrichten",
            ),
            &["typ"],
        )?;
        registry.register(Box::new(nachrichten_total.clone()))?;

        let verworfene_nachrichten_total = IntCounter::with_opts(Opts::new(
            "plauderstube_verworfene_nachrichten_total",
            "Ungueltige oder nicht zuordenbare Client-Nachrichten",
        ))?;
        registry.register(Box::new(verworfene_nachrichten_total.clone()))?;

        let pushes_fehlgeschlagen_total = IntCounter::with_opts(Opts::new(
            "plauderstube_pushes_fehlgeschlagen_total",
            "Pushes an geschlossene oder unbekannte Verbindungen",
        ))?;
        registry.register(Box::new(pushes_fehlgeschlagen_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            verbundene_clients,
            nachrichten_total,
            verworfene_nachrichten_total,
            pushes_fehlgeschlagen_total,
        })
    }

    /// Zaehlt eine geroutete Nachricht des gegebenen Typs
    pub fn nachricht_gezaehlt(&self, typ: &str) {
        self.nachrichten_total.with_label_values(&[typ]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: PlauderMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<PlauderMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
