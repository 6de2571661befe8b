//! HTTP callback listener.
//!
//! A single catch-all route answers every method and every path with a
//! fixed `200 OK` / `OK` body — the response never reveals whether the
//! token matched an injection. Built on `tokio::net::TcpListener::bind`
//! plus `axum::serve`, with `tower_http::trace::TraceLayer` for
//! per-request tracing. No CORS layer: a callback listener has no browser
//! client to permit.

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use http_body_util::BodyExt;
use ricochet_store::Store;
use ricochet_types::Token;
use std::future::Future;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use tower_http::trace::TraceLayer;

use crate::error::{ListenerError, Result};

/// Inbound bodies are kept up to this many bytes; anything beyond it is
/// discarded rather than buffered, bounding memory use against a hostile or
/// misbehaving caller while still recording a callback and answering 200.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The fixed response body every request receives, valid token or not.
const RESPONSE_BODY: &str = "OK";

/// Serves the HTTP callback listener on `addr` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ListenerError::Bind`] if `addr` cannot be bound.
pub async fn serve(
    addr: SocketAddr,
    store: Store,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = Router::new()
        .fallback(handle_callback)
        .layer(TraceLayer::new_for_http())
        .with_state(store);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

    tracing::info!(%addr, "HTTP callback listener started");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|source| ListenerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    Ok(())
}

/// Handles every method on every path: extracts a candidate token from the
/// URL, records the callback if the token is valid and known, and always
/// answers `200 OK`.
async fn handle_callback(
    State(store): State<Store>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> (StatusCode, &'static str) {
    let path = uri.path().to_string();
    let body = read_capped(body).await;

    match extract_token(&path) {
        Some(token) => {
            let body_opt = if body.is_empty() { None } else { Some(body) };
            let metadata = body_opt
                .as_deref()
                .and_then(|b| serde_json::from_slice::<serde_json::Value>(b).ok())
                .map(|v| v.to_string());
            let header_map = serialize_headers(&headers);

            match store
                .record_callback(
                    &token,
                    &peer.ip().to_string(),
                    &path,
                    &header_map,
                    body_opt,
                    now_seconds(),
                    metadata,
                )
                .await
            {
                Ok(true) => tracing::info!(token = token.as_str(), method = %method, "callback recorded"),
                Ok(false) => tracing::warn!(token = token.as_str(), method = %method, "callback for unknown token, dropping"),
                Err(e) => tracing::error!(error = %e, "failed to record callback"),
            }
        }
        None => {
            tracing::debug!(path, method = %method, "no valid token in path, not storing");
        }
    }

    (StatusCode::OK, RESPONSE_BODY)
}

/// Drains `body` to completion, keeping at most `MAX_BODY_BYTES` of it.
///
/// Frames past the cap are still pulled off the connection (so the client
/// isn't left hanging on a half-read request) but their data is dropped
/// instead of appended.
async fn read_capped(mut body: Body) -> Vec<u8> {
    let mut buf = Vec::new();
    while let Some(frame) = body.frame().await {
        let Ok(frame) = frame else { break };
        let Some(data) = frame.data_ref() else {
            continue;
        };
        let remaining = MAX_BODY_BYTES.saturating_sub(buf.len());
        if remaining > 0 {
            let take = remaining.min(data.len());
            buf.extend_from_slice(&data[..take]);
        }
    }
    buf
}

/// Splits `path` by `/` and validates the last non-empty segment as a token.
fn extract_token(path: &str) -> Option<Token> {
    let candidate = path.split('/').filter(|s| !s.is_empty()).next_back()?;
    Token::parse(candidate).ok()
}

fn serialize_headers(headers: &HeaderMap) -> String {
    let map: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                serde_json::Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();
    serde_json::Value::Object(map).to_string()
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_test_support::TestStore;
    use std::time::Duration;

    async fn spawn_listener(store: Store) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
        let port = ricochet_test_support::free_tcp_port().unwrap();
        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let shutdown = async {
            let _ = rx.await;
        };
        tokio::spawn(serve(addr, store, shutdown));
        tokio::time::sleep(Duration::from_millis(100)).await;
        (addr, tx)
    }

    #[test]
    fn extract_token_takes_last_non_empty_segment() {
        assert_eq!(
            extract_token("/cb/aaaaaaaaaaaaaaaa").map(|t| t.as_str().to_string()),
            Some("aaaaaaaaaaaaaaaa".to_string())
        );
        assert_eq!(extract_token("/"), None);
        assert_eq!(extract_token("/cb/aaaaaaaaaaaaaaaa/"), Some(Token::from_trusted("aaaaaaaaaaaaaaaa".to_string())));
    }

    #[test]
    fn extract_token_rejects_wrong_length_and_uppercase() {
        assert_eq!(extract_token("/short-token-aaaaaaaaaaaaaa"), None);
        assert_eq!(extract_token("/AAAAAAAAAAAAAAAA"), None);
    }

    #[tokio::test]
    async fn every_method_and_path_returns_200() {
        let test_store = TestStore::new().await.unwrap();
        let (addr, shutdown) = spawn_listener(test_store.store().clone()).await;
        let client = reqwest::Client::new();

        for method in ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD"] {
            let resp = client
                .request(method.parse().unwrap(), format!("http://{addr}/ffffffffffffffff"))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 200, "method {method}");
        }

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn oversized_body_is_truncated_not_rejected() {
        let test_store = TestStore::new().await.unwrap();
        let store = test_store.store().clone();
        store
            .record_injection(ricochet_types::Injection {
                token: Token::from_trusted("bbbbbbbbbbbbbbbb".to_string()),
                target_url: "http://t.example/?q=X".into(),
                parameter: "q".into(),
                payload: "<img src=\"http://cb.example/bbbbbbbbbbbbbbbb\">".into(),
                context: "xss:html".into(),
                injected_at: 1000.0,
            })
            .await
            .unwrap();

        let (addr, shutdown) = spawn_listener(store.clone()).await;
        let client = reqwest::Client::new();

        let oversized = vec![b'x'; MAX_BODY_BYTES + 1024];
        let resp = client
            .post(format!("http://{addr}/bbbbbbbbbbbbbbbb"))
            .body(oversized)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "OK");

        let _ = shutdown.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let recorded = store
            .get_callbacks_for_injection(&Token::from_trusted("bbbbbbbbbbbbbbbb".to_string()))
            .await
            .unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].body.as_ref().map(Vec::len), Some(MAX_BODY_BYTES));
    }

    #[tokio::test]
    async fn known_token_is_recorded_and_unknown_token_is_not() {
        let test_store = TestStore::new().await.unwrap();
        let store = test_store.store().clone();
        store
            .record_injection(ricochet_types::Injection {
                token: Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()),
                target_url: "http://t.example/?q=X".into(),
                parameter: "q".into(),
                payload: "<img src=\"http://cb.example/aaaaaaaaaaaaaaaa\">".into(),
                context: "xss:html".into(),
                injected_at: 1000.0,
            })
            .await
            .unwrap();

        let (addr, shutdown) = spawn_listener(store.clone()).await;
        let client = reqwest::Client::new();

        let resp = client
            .get(format!("http://{addr}/aaaaaaaaaaaaaaaa"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.unwrap(), "OK");

        let resp = client
            .get(format!("http://{addr}/ffffffffffffffff"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let _ = shutdown.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let known = store
            .get_callbacks_for_injection(&Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()))
            .await
            .unwrap();
        assert_eq!(known.len(), 1);

        let unknown = store
            .get_callbacks_for_injection(&Token::from_trusted("ffffffffffffffff".to_string()))
            .await
            .unwrap();
        assert!(unknown.is_empty());
    }
}
