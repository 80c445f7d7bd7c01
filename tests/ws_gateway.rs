//! End-to-end tests for the WebSocket query protocol.
//!
//! Each test starts the real router on an ephemeral port, backed by an
//! in-memory store with a frozen clock, and talks to it with a
//! `tokio-tungstenite` client.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use telemetry_gateway::app_state::AppState;
use telemetry_gateway::domain::{FieldAllowList, Record};
use telemetry_gateway::error::StoreError;
use telemetry_gateway::server::build_app;
use telemetry_gateway::service::QueryTranslator;
use telemetry_gateway::store::{FluxTable, MemoryStore, TelemetryStore, WindowQuery};
use telemetry_gateway::ws::messages::{ResponseEnvelope, ResponseType};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const MEASUREMENT: &str = "mqtt_consumer";

/// Fails the first `failures` queries, then delegates.
#[derive(Debug)]
struct FlakyStore {
    failures: usize,
    calls: AtomicUsize,
    inner: MemoryStore,
}

#[async_trait]
impl TelemetryStore for FlakyStore {
    async fn query(&self, query: &WindowQuery) -> Result<Vec<FluxTable>, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(StoreError::Status {
                status: 503,
                body: "store unavailable".to_string(),
            });
        }
        self.inner.query(query).await
    }
}

fn now() -> DateTime<Utc> {
    let Some(t) = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single() else {
        panic!("valid time");
    };
    t
}

/// Samples every 10 s over the 10 minutes before `now()` for temperature
/// (`k`) and humidity (`100 + 2k`), plus an out-of-list `voltage` field.
fn ten_minute_fixture() -> MemoryStore {
    let start = now() - TimeDelta::minutes(10);
    let mut store = MemoryStore::at(now());
    for k in 0..60_i64 {
        let t = start + TimeDelta::seconds(10 * k);
        let k = k as f64;
        store = store
            .with_sample(MEASUREMENT, "temperature", t, k)
            .with_sample(MEASUREMENT, "humidity", t, 100.0 + 2.0 * k)
            .with_sample(MEASUREMENT, "voltage", t, 3.3);
    }
    store
}

async fn start_server(store: impl TelemetryStore + 'static) -> SocketAddr {
    let translator = QueryTranslator::new(
        Arc::new(store),
        "sensors",
        MEASUREMENT,
        FieldAllowList::default(),
    );
    let app = build_app(AppState {
        translator: Arc::new(translator),
    });

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsStream {
    match connect_async(format!("ws://{addr}/")).await {
        Ok((ws, _)) => ws,
        Err(e) => panic!("connect failed: {e}"),
    }
}

async fn send(ws: &mut WsStream, text: &str) {
    if let Err(e) = ws.send(Message::text(text.to_string())).await {
        panic!("send failed: {e}");
    }
}

async fn recv_text(ws: &mut WsStream) -> String {
    let Ok(next) = timeout(Duration::from_secs(2), ws.next()).await else {
        panic!("timeout waiting for response");
    };
    match next {
        Some(Ok(Message::Text(text))) => text.as_str().to_string(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

async fn recv_envelope(ws: &mut WsStream) -> ResponseEnvelope {
    let text = recv_text(ws).await;
    match serde_json::from_str(&text) {
        Ok(envelope) => envelope,
        Err(e) => panic!("invalid envelope {text}: {e}"),
    }
}

async fn assert_silent(ws: &mut WsStream) {
    if let Ok(frame) = timeout(Duration::from_millis(200), ws.next()).await {
        panic!("expected no frame, got {frame:?}");
    }
}

fn by_field<'a>(records: &'a [Record], field: &str) -> Vec<&'a Record> {
    records.iter().filter(|r| r.field == field).collect()
}

#[tokio::test]
async fn ten_minutes_in_one_minute_steps() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, r#"{"range": "-10m", "step": "1m"}"#).await;
    let envelope = recv_envelope(&mut ws).await;
    assert_eq!(envelope.msg_type, ResponseType::Bulk);

    let allow = FieldAllowList::default();
    assert!(envelope.data.iter().all(|r| allow.contains(&r.field)));
    assert_eq!(envelope.data.len(), 20);

    let temperature = by_field(&envelope.data, "temperature");
    let humidity = by_field(&envelope.data, "humidity");
    assert_eq!(temperature.len(), 10);
    assert_eq!(humidity.len(), 10);

    for (j, (t, h)) in temperature.iter().zip(&humidity).enumerate() {
        let j = j as i64;
        let expected_time = now() - TimeDelta::minutes(9 - j);
        assert_eq!(t.time, expected_time);
        assert_eq!(h.time, expected_time);
        // Mean of k = 6j..6j+5.
        let mean_k = 6.0 * j as f64 + 2.5;
        assert!((t.value - mean_k).abs() < 1e-9, "window {j}: {}", t.value);
        assert!((h.value - (100.0 + 2.0 * mean_k)).abs() < 1e-9);
    }
}

#[tokio::test]
async fn timestamps_never_decrease_within_a_field() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, r#"{"range": "-10m", "step": "30s"}"#).await;
    let envelope = recv_envelope(&mut ws).await;
    for field in ["temperature", "humidity"] {
        let rows = by_field(&envelope.data, field);
        assert_eq!(rows.len(), 20);
        assert!(rows.windows(2).all(|w| w[0].time <= w[1].time));
    }
}

#[tokio::test]
async fn empty_custom_window_returns_empty_bulk() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    send(
        &mut ws,
        r#"{"custom": {"start": "2024-01-01T00:00:00Z", "end": "2024-01-01T00:05:00Z"}, "step": "5m"}"#,
    )
    .await;
    assert_eq!(recv_text(&mut ws).await, r#"{"type":"bulk","data":[]}"#);
}

#[tokio::test]
async fn gap_windows_are_absent() {
    let gap_start = now() - TimeDelta::minutes(5);
    let store = MemoryStore::at(now())
        .with_sample(MEASUREMENT, "light", now() - TimeDelta::seconds(290), 100.0)
        .with_sample(MEASUREMENT, "light", now() - TimeDelta::seconds(50), 300.0);
    let addr = start_server(store).await;
    let mut ws = connect(addr).await;

    send(&mut ws, r#"{"range": "-5m", "step": "1m"}"#).await;
    let envelope = recv_envelope(&mut ws).await;
    let times: Vec<_> = envelope.data.iter().map(|r| r.time).collect();
    assert_eq!(
        times,
        [gap_start + TimeDelta::minutes(1), gap_start + TimeDelta::minutes(5)]
    );
}

#[tokio::test]
async fn custom_wins_over_range() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    let start = (now() - TimeDelta::minutes(2)).to_rfc3339();
    let end = (now() - TimeDelta::minutes(1)).to_rfc3339();
    send(
        &mut ws,
        &format!(r#"{{"range": "-10m", "step": "1m", "custom": {{"start": "{start}", "end": "{end}"}}}}"#),
    )
    .await;
    let envelope = recv_envelope(&mut ws).await;
    assert_eq!(by_field(&envelope.data, "temperature").len(), 1);
}

#[tokio::test]
async fn step_defaults_to_thirty_seconds() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, r#"{"range": "-2m"}"#).await;
    let envelope = recv_envelope(&mut ws).await;
    assert_eq!(by_field(&envelope.data, "temperature").len(), 4);
}

#[tokio::test]
async fn malformed_message_keeps_connection_open() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, "{not json").await;
    assert_silent(&mut ws).await;
    send(&mut ws, r#"{"step": "never"}"#).await;
    assert_silent(&mut ws).await;
    send(&mut ws, "[]").await;
    assert_silent(&mut ws).await;
    send(&mut ws, r#"["-5m", "1m"]"#).await;
    assert_silent(&mut ws).await;

    send(&mut ws, r#"{"range": "-10m", "step": "10m"}"#).await;
    let envelope = recv_envelope(&mut ws).await;
    assert_eq!(envelope.data.len(), 2);
}

#[tokio::test]
async fn store_failure_does_not_poison_connection() {
    let store = FlakyStore {
        failures: 1,
        calls: AtomicUsize::new(0),
        inner: ten_minute_fixture(),
    };
    let addr = start_server(store).await;
    let mut ws = connect(addr).await;

    send(&mut ws, r#"{"range": "-10m", "step": "10m"}"#).await;
    assert_silent(&mut ws).await;

    send(&mut ws, r#"{"range": "-10m", "step": "10m"}"#).await;
    let envelope = recv_envelope(&mut ws).await;
    assert_eq!(envelope.data.len(), 2);
}

#[tokio::test]
async fn responses_follow_request_order() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    for step in ["10m", "5m", "1m"] {
        send(&mut ws, &format!(r#"{{"range": "-10m", "step": "{step}"}}"#)).await;
    }
    let mut counts = Vec::new();
    for _ in 0..3 {
        counts.push(recv_envelope(&mut ws).await.data.len());
    }
    assert_eq!(counts, [2, 4, 20]);
}

#[tokio::test]
async fn binary_frames_are_decoded_as_json() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    let payload = br#"{"range": "-10m", "step": "10m"}"#.to_vec();
    if let Err(e) = ws.send(Message::binary(payload)).await {
        panic!("send failed: {e}");
    }
    assert_eq!(recv_envelope(&mut ws).await.data.len(), 2);
}

#[tokio::test]
async fn clients_are_independent() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    send(&mut a, "garbage").await;
    send(&mut b, r#"{"range": "-10m", "step": "10m"}"#).await;
    assert_eq!(recv_envelope(&mut b).await.data.len(), 2);

    if let Err(e) = a.close(None).await {
        panic!("close failed: {e}");
    }
    send(&mut b, r#"{"range": "-10m", "step": "5m"}"#).await;
    assert_eq!(recv_envelope(&mut b).await.data.len(), 4);
}

#[tokio::test]
async fn close_handshake_is_answered() {
    let addr = start_server(ten_minute_fixture()).await;
    let mut ws = connect(addr).await;

    if let Err(e) = ws.send(Message::Close(None)).await {
        panic!("close failed: {e}");
    }
    let Ok(reply) = timeout(Duration::from_secs(2), ws.next()).await else {
        panic!("timeout waiting for close reply");
    };
    assert!(matches!(reply, Some(Ok(Message::Close(_)))), "got {reply:?}");
}
