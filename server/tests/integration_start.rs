//! Integration-Tests fuer den Server-Start

use plauderstube_core::PlauderError;
use plauderstube_server::{Server, config::ServerConfig};

#[tokio::test]
async fn leerer_namens_pool_verhindert_start() {
    let mut config = ServerConfig::default();
    config.chat.name.clear();
    // Port 1 wuerde ohne Rechte nicht binden; der Fehler muss vorher kommen
    config.chat.port = 1;

    let fehler = Server::neu(config)
        .starten()
        .await
        .expect_err("Start mit leerem Pool darf nicht gelingen");
    let kern = fehler
        .downcast_ref::<PlauderError>()
        .expect("Fehler sollte ein PlauderError sein");
    assert!(matches!(kern, PlauderError::LeererPool { pool } if pool == "name"));
}

#[tokio::test]
async fn ungueltige_adresse_wird_gemeldet() {
    let mut config = ServerConfig::default();
    config.chat.ip = "kein-host".into();
    config.observability.aktiviert = false;

    let fehler = Server::neu(config).starten().await.unwrap_err();
    assert!(fehler.to_string().contains("kein-host"));
}
