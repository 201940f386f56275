//! End-to-end WebSocket tests against a live server on an ephemeral port.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use common::{acme, build_test_app, test_config, StubInventory};
use futures::{SinkExt, StreamExt};
use invoicer_api::router::build_app_router;
use invoicer_api::state::AppState;
use invoicer_core::profile::Profile;
use invoicer_inventory::Gateway;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve the app on `127.0.0.1:0` and return its address.
async fn spawn_server(gateway: Arc<dyn Gateway>, profiles: &[Profile]) -> SocketAddr {
    let (app, _) = build_test_app(gateway, profiles);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/api/v1/ws"))
        .await
        .unwrap();
    client
}

async fn send(client: &mut Client, message: serde_json::Value) {
    client.send(Message::Text(message.to_string())).await.unwrap();
}

/// Next text frame as JSON, skipping control frames.
async fn next_event(client: &mut Client) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Collect events until a terminal one arrives (inclusive).
async fn until_terminal(client: &mut Client) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    loop {
        let event = next_event(client).await;
        let done = event["event"] != "invoiceResult";
        events.push(event);
        if done {
            return events;
        }
    }
}

fn start(emails: &[&str], delay: f64) -> serde_json::Value {
    serde_json::json!({
        "event": "startBulkInvoice",
        "payload": {
            "emails": emails,
            "subject": "Invoice",
            "body": "Hello",
            "delay": delay,
            "selectedProfileName": "Acme"
        }
    })
}

#[tokio::test]
async fn bulk_run_streams_progress_then_completes() {
    let addr = spawn_server(Arc::new(StubInventory::new()), &[acme()]).await;
    let mut client = connect(addr).await;

    send(&mut client, start(&["a@x.com", "b@x.com"], 0.0)).await;
    let events = until_terminal(&mut client).await;

    assert_eq!(events.len(), 7);
    let stages: Vec<_> = events[..6]
        .iter()
        .map(|e| {
            assert_eq!(e["event"], "invoiceResult");
            e["payload"]["stage"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        stages,
        ["contact", "invoice", "complete", "contact", "invoice", "complete"]
    );
    assert_eq!(events[2]["payload"]["success"], true);
    assert_eq!(events[2]["payload"]["invoiceNumber"], "INV-1");
    assert_eq!(events[5]["payload"]["rowNumber"], 2);

    let terminal = &events[6];
    assert_eq!(terminal["event"], "bulkComplete");
    assert_eq!(terminal["payload"]["profileName"], "Acme");
    assert_eq!(terminal["payload"]["jobType"], "invoice");
}

#[tokio::test]
async fn job_control_end_stops_the_run() {
    let gateway = StubInventory::with_latency(Duration::from_millis(200));
    let addr = spawn_server(Arc::new(gateway), &[acme()]).await;
    let mut client = connect(addr).await;

    send(&mut client, start(&["a@x.com", "b@x.com", "c@x.com", "d@x.com"], 0.0)).await;
    let first = next_event(&mut client).await;
    assert_eq!(first["payload"]["stage"], "contact");

    send(
        &mut client,
        serde_json::json!({
            "event": "jobControl",
            "payload": { "profileName": "Acme", "jobType": "invoice", "action": "end" }
        }),
    )
    .await;

    let events = until_terminal(&mut client).await;
    let terminal = events.last().unwrap();
    assert_eq!(terminal["event"], "bulkEnded");
    let completed = events
        .iter()
        .filter(|e| e["payload"]["stage"] == "complete")
        .count();
    assert!(completed < 4, "the run should stop before every row completes");
}

#[tokio::test]
async fn invalid_message_gets_request_error() {
    let addr = spawn_server(Arc::new(StubInventory::new()), &[acme()]).await;
    let mut client = connect(addr).await;

    send(&mut client, serde_json::json!({ "event": "launchRockets", "payload": {} })).await;
    let reply = next_event(&mut client).await;

    assert_eq!(reply["event"], "requestError");
    assert!(reply["payload"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid message:"));
}

#[tokio::test]
async fn missing_profile_ends_with_bulk_error() {
    let addr = spawn_server(Arc::new(StubInventory::new()), &[]).await;
    let mut client = connect(addr).await;

    send(&mut client, start(&["a@x.com"], 0.0)).await;
    let events = until_terminal(&mut client).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "bulkError");
    assert_eq!(
        events[0]["payload"]["message"],
        "Inventory profile configuration is missing."
    );
}

#[tokio::test]
async fn unreadable_profiles_file_reports_its_cause() {
    let path = std::env::temp_dir().join(format!(
        "invoicer-api-broken-profiles-{}.json",
        uuid::Uuid::new_v4()
    ));
    std::fs::write(&path, "{ not json").unwrap();
    let config = test_config(path);
    let state = AppState::new(config.clone(), Arc::new(StubInventory::new()));
    let app = build_app_router(state, &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let mut client = connect(addr).await;

    send(&mut client, start(&["a@x.com"], 0.0)).await;
    let events = until_terminal(&mut client).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "bulkError");
    let message = events[0]["payload"]["message"].as_str().unwrap();
    assert!(message.contains("Invalid profiles file"), "unexpected message: {message}");
}

#[tokio::test]
async fn second_start_while_running_is_rejected() {
    let gateway = StubInventory::with_latency(Duration::from_millis(200));
    let addr = spawn_server(Arc::new(gateway), &[acme()]).await;
    let mut client = connect(addr).await;

    send(&mut client, start(&["a@x.com", "b@x.com"], 0.0)).await;
    send(&mut client, start(&["c@x.com"], 0.0)).await;

    let mut rejection = None;
    loop {
        let event = next_event(&mut client).await;
        if event["event"] == "requestError" {
            rejection = Some(event.clone());
        }
        if event["event"] == "bulkComplete" {
            break;
        }
    }
    let rejection = rejection.expect("second start should be rejected");
    assert!(rejection["payload"]["message"]
        .as_str()
        .unwrap()
        .contains("already running"));
}
