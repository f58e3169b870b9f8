//! Request-Timing fuer Axum
//!
//! Der WebSocket-Upgrade ist eine normale HTTP-Anfrage. Jede Anfrage bekommt
//! einen Span mit Methode und Pfad; beim Antworten werden Statuscode und
//! Latenz in Millisekunden auf INFO geloggt.

use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Erstellt den Tracing-Layer mit Latenz-Logging fuer HTTP-Anfragen
pub fn request_timing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
