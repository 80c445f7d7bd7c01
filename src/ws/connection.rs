//! Per-connection message loop.
//!
//! Each connection is served by one task. Frames are handled strictly in
//! arrival order: the next frame is not read until the previous request has
//! been answered or dropped, so responses go out in request order.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::ResponseEnvelope;
use crate::domain::{ConnectionId, QueryRequest};
use crate::error::GatewayError;
use crate::service::QueryTranslator;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Text and binary frames are decoded as query requests.
/// - Failed requests are logged and dropped; the connection stays open.
/// - The loop ends when the stream ends (after the close handshake) or on
///   a transport error.
pub async fn run_connection(
    socket: WebSocket,
    translator: Arc<QueryTranslator>,
    conn_id: ConnectionId,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::info!(%conn_id, "client connected");

    while let Some(frame) = ws_rx.next().await {
        let outcome = match frame {
            Ok(Message::Text(text)) => {
                tracing::debug!(%conn_id, request = %text.as_str(), "request received");
                handle_message(text.as_str().as_bytes(), &translator).await
            }
            Ok(Message::Binary(bytes)) => {
                tracing::debug!(%conn_id, len = bytes.len(), "binary request received");
                handle_message(&bytes, &translator).await
            }
            // Keep polling so the transport flushes its close reply; the
            // stream ends once the handshake completes.
            Ok(Message::Close(frame)) => {
                tracing::debug!(%conn_id, ?frame, "close frame received");
                continue;
            }
            // Ping/pong are answered by the transport.
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "ws transport error");
                break;
            }
        };

        match outcome {
            Ok(envelope) => {
                let records = envelope.data.len();
                let json = match serde_json::to_string(&envelope) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "failed to serialize response");
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(Message::text(json)).await {
                    tracing::debug!(%conn_id, error = %e, "ws send failed");
                    break;
                }
                tracing::debug!(%conn_id, records, "bulk response sent");
            }
            Err(err) if err.is_client_error() => {
                tracing::warn!(%conn_id, code = err.error_code(), error = %err, "rejected request");
            }
            Err(err) => {
                tracing::warn!(%conn_id, code = err.error_code(), error = %err, "query failed");
            }
        }
    }

    tracing::info!(%conn_id, "client disconnected");
}

/// Decodes one raw client message and answers it.
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] or [`GatewayError::InvalidRequest`] for
/// bad input, and the translator's error if the store query fails.
pub async fn handle_message(
    raw: &[u8],
    translator: &QueryTranslator,
) -> Result<ResponseEnvelope, GatewayError> {
    let request = QueryRequest::decode(raw)?;
    let data = translator.translate(&request).await?;
    Ok(ResponseEnvelope::bulk(data))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;
    use crate::domain::FieldAllowList;
    use crate::store::MemoryStore;

    fn translator() -> QueryTranslator {
        let Some(now) = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single() else {
            panic!("valid time");
        };
        let store = MemoryStore::at(now).with_sample(
            "mqtt_consumer",
            "pressure",
            now - TimeDelta::seconds(10),
            1013.0,
        );
        QueryTranslator::new(
            Arc::new(store),
            "sensors",
            "mqtt_consumer",
            FieldAllowList::default(),
        )
    }

    #[tokio::test]
    async fn valid_message_yields_bulk_envelope() {
        let envelope = match handle_message(br#"{"range":"-5m","step":"5m"}"#, &translator()).await
        {
            Ok(e) => e,
            Err(e) => panic!("handle failed: {e}"),
        };
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data.first().map(|r| r.value), Some(1013.0));
    }

    #[tokio::test]
    async fn malformed_message_is_decode_error() {
        let Err(err) = handle_message(b"{\"range\":", &translator()).await else {
            panic!("expected decode error");
        };
        assert!(matches!(err, GatewayError::Decode(_)));
    }

    #[tokio::test]
    async fn invalid_literal_is_client_error() {
        let Err(err) = handle_message(br#"{"step":"soon"}"#, &translator()).await else {
            panic!("expected invalid request");
        };
        assert!(err.is_client_error());
    }
}
