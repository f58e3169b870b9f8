//! End-to-End-Tests ueber echte WebSocket-Verbindungen

use futures_util::{SinkExt, StreamExt};
use plauderstube_observability::PlauderMetrics;
use plauderstube_relay::{IdentityPool, QueueTransport, RelayConfig, RelayServer, RelayState};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    addr: SocketAddr,
    state: Arc<RelayState<QueueTransport>>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<std::io::Result<()>>,
}

async fn server_starten(max_clients: u32) -> TestServer {
    let pool = IdentityPool::neu(vec!["Anna".into(), "Bert".into()], vec!["a.png".into()])
        .expect("Pool");
    let state = RelayState::neu(
        RelayConfig {
            max_clients,
            ..RelayConfig::default()
        },
        pool,
        QueueTransport::neu(),
        PlauderMetrics::neu().expect("Metriken"),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = RelayServer::neu(Arc::clone(&state), addr);
    let handle = tokio::spawn(server.starten_mit_listener(listener, shutdown_rx));

    TestServer {
        addr,
        state,
        shutdown_tx,
        handle,
    }
}

async fn verbinden(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket-Verbindung fehlgeschlagen");
    ws
}

async fn naechste(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timeout beim Warten auf Nachricht")
            .expect("Stream beendet")
            .expect("Lesefehler");
        if let Message::Text(_) = frame {
            return serde_json::from_str(frame.to_text().unwrap()).expect("JSON");
        }
    }
}

async fn warten_bis(mut bedingung: impl FnMut() -> bool) {
    for _ in 0..100 {
        if bedingung() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Bedingung nicht rechtzeitig erfuellt");
}

#[tokio::test]
async fn zwei_clients_chatten() {
    let server = server_starten(0).await;

    let mut a = verbinden(server.addr).await;
    let gruss_a = naechste(&mut a).await;
    assert_eq!(gruss_a["type"], "openSuccess");
    let a_fd = gruss_a["user"]["fd"].as_u64().unwrap();

    let mut b = verbinden(server.addr).await;
    let gruss_b = naechste(&mut b).await;
    assert_eq!(gruss_b["type"], "openSuccess");
    assert_eq!(gruss_b["all"].as_array().unwrap().len(), 2);
    let b_fd = gruss_b["user"]["fd"].as_u64().unwrap();

    let beitritt = naechste(&mut a).await;
    assert_eq!(beitritt["type"], "open");
    assert_eq!(beitritt["user"]["fd"], b_fd);

    // Oeffentlich
    a.send(Message::text(r#"{"type":"public","data":{"message":"hi"}}"#))
        .await
        .unwrap();
    for ws in [&mut a, &mut b] {
        let n = naechste(ws).await;
        assert_eq!(n["type"], "public_message");
        assert_eq!(n["message"]["data"], "hi");
        assert_eq!(n["message"]["user"]["fd"], a_fd);
    }

    // Privat als Binaer-Frame
    let privat = format!(r#"{{"type":"private","data":{{"message":"psst","to_user_fd":{a_fd}}}}}"#);
    b.send(Message::binary(privat.into_bytes())).await.unwrap();
    for ws in [&mut a, &mut b] {
        let n = naechste(ws).await;
        assert_eq!(n["type"], "private_message");
        assert_eq!(n["message"]["data"], "psst");
        assert_eq!(n["message"]["user"]["fd"], b_fd);
    }

    // Kaputtes JSON wird still verworfen, danach funktioniert alles weiter
    a.send(Message::text("kein json")).await.unwrap();
    a.send(Message::text(r#"{"type":"public","data":{"message":"noch da"}}"#))
        .await
        .unwrap();
    let n = naechste(&mut b).await;
    assert_eq!(n["message"]["data"], "noch da");

    // B trennt, A sieht den Austritt
    b.close(None).await.unwrap();
    let austritt = naechste(&mut a).await;
    assert_eq!(austritt["type"], "close");
    assert_eq!(austritt["user"]["fd"], b_fd);

    let state = Arc::clone(&server.state);
    warten_bis(|| state.registry.anzahl() == 1).await;
    assert_eq!(state.metriken.verworfene_nachrichten_total.get(), 1);

    server.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn voller_server_lehnt_ab() {
    let server = server_starten(1).await;

    let mut a = verbinden(server.addr).await;
    assert_eq!(naechste(&mut a).await["type"], "openSuccess");

    let ergebnis = connect_async(format!("ws://{}/", server.addr)).await;
    match ergebnis {
        Err(tokio_tungstenite::tungstenite::Error::Http(antwort)) => {
            assert_eq!(antwort.status(), 503);
        }
        Err(e) => panic!("503 erwartet, bekommen: {e}"),
        Ok(_) => panic!("Verbindung haette abgelehnt werden muessen"),
    }
    assert_eq!(server.state.registry.anzahl(), 1);

    server.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn gleichzeitige_upgrades_halten_limit_ein() {
    let server = server_starten(2).await;

    let versuche = (0..5).map(|_| connect_async(format!("ws://{}/ws", server.addr)));
    let ergebnisse = futures_util::future::join_all(versuche).await;

    let mut verbunden = Vec::new();
    let mut abgelehnt = 0;
    for ergebnis in ergebnisse {
        match ergebnis {
            Ok((ws, _)) => verbunden.push(ws),
            Err(tokio_tungstenite::tungstenite::Error::Http(antwort)) => {
                assert_eq!(antwort.status(), 503);
                abgelehnt += 1;
            }
            Err(e) => panic!("unerwarteter Fehler: {e}"),
        }
    }
    assert_eq!(verbunden.len(), 2);
    assert_eq!(abgelehnt, 3);

    let state = Arc::clone(&server.state);
    warten_bis(|| state.registry.anzahl() == 2).await;
    assert_eq!(state.belegte_plaetze(), 2);

    // Ein freiwerdender Platz kann wieder belegt werden
    let mut erster = verbunden.remove(0);
    erster.close(None).await.unwrap();
    warten_bis(|| state.belegte_plaetze() == 1).await;

    let mut nachruecker = verbinden(server.addr).await;
    assert_eq!(naechste(&mut nachruecker).await["type"], "openSuccess");

    server.shutdown_tx.send(true).unwrap();
}

#[tokio::test]
async fn shutdown_trennt_clients() {
    let server = server_starten(0).await;

    let mut a = verbinden(server.addr).await;
    assert_eq!(naechste(&mut a).await["type"], "openSuccess");

    server.shutdown_tx.send(true).unwrap();

    // Client sieht Close-Frame oder Stream-Ende
    let ende = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(Ok(frame)) = a.next().await {
            if frame.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(ende.is_ok(), "Client wurde nicht getrennt");

    let ergebnis = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("Server hat nicht beendet")
        .expect("Server-Task panic");
    assert!(ergebnis.is_ok());

    let state = Arc::clone(&server.state);
    warten_bis(|| state.registry.ist_leer()).await;
}
