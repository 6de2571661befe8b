//! Outbound HTTP client used by the injector and the `suggest`/`active` CLI
//! probes.
//!
//! A non-2xx response is not a client error — the injector needs the exact
//! status line a WAF or application returned. Only a failure to establish
//! or complete the connection (DNS, TCP, TLS, timeout) becomes an `Err`.

use ricochet_types::{Result, RicochetError};
use std::time::Duration;

/// Configuration for a single [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout. `None` disables the timeout (not recommended
    /// outside tests — a hung socket would otherwise stall a whole scan).
    pub timeout: Option<Duration>,
    /// Outbound proxy URL, if requests should be routed through one.
    pub proxy: Option<String>,
    /// When `false`, TLS certificate verification is skipped — useful
    /// against internal targets with self-signed certificates, never the
    /// default.
    pub verify_tls: bool,
    /// Maximum redirects to follow before giving up and returning the
    /// redirect response itself.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            proxy: None,
            verify_tls: true,
            // Redirects are disabled by default — a redirect to a different
            // origin would leak the payload to an unintended host.
            max_redirects: 0,
        }
    }
}

/// The response of a completed HTTP exchange, win or lose on status code.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Numeric status code (e.g. `200`, `404`, `500`).
    pub status: u16,
    /// Canonical reason phrase for `status`, if the server sent a
    /// recognizable one.
    pub reason: Option<String>,
    /// Response headers, lower-cased names, in arrival order.
    pub headers: Vec<(String, String)>,
    /// Raw response body.
    pub body: Vec<u8>,
    /// The URL the response was ultimately served from, after redirects.
    pub final_url: String,
}

/// Thin wrapper around a configured [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RicochetError::Network`] if the TLS backend or proxy URL
    /// cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .redirect(if config.max_redirects == 0 {
                reqwest::redirect::Policy::none()
            } else {
                reqwest::redirect::Policy::limited(config.max_redirects)
            });

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| RicochetError::Network(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let inner = builder
            .build()
            .map_err(|e| RicochetError::Network(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Sends a request and returns the full response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`RicochetError::Timeout`] if the request exceeds its
    /// configured timeout, or [`RicochetError::Network`] for any other
    /// connection-level failure (DNS resolution, TCP refusal, TLS
    /// handshake). A server response — even `500` or a redirect loop
    /// `reqwest` gave up following — is never an error here.
    pub async fn send(
        &self,
        method: &str,
        url: &str,
        headers: &[(String, String)],
        body: Option<Vec<u8>>,
    ) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| RicochetError::Network(e.to_string()))?;

        let mut request = self.inner.request(method, url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RicochetError::Timeout(Duration::from_secs(0))
            } else {
                RicochetError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let reason = status.canonical_reason().map(ToString::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| RicochetError::Network(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            headers,
            body,
            final_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn returns_non_2xx_as_ok_not_err() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ClientConfig::default()).unwrap();
        let resp = client
            .send("GET", &format!("{}/missing", server.uri()), &[], None)
            .await
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, b"nope");
    }

    #[tokio::test]
    async fn propagates_custom_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = HttpClient::new(&ClientConfig::default()).unwrap();
        let resp = client
            .send(
                "POST",
                &format!("{}/echo", server.uri()),
                &[("x-ricochet".to_string(), "1".to_string())],
                Some(b"payload".to_vec()),
            )
            .await
            .unwrap();
        assert_eq!(resp.status, 200);
    }

    #[tokio::test]
    async fn connection_failure_is_network_error() {
        let client = HttpClient::new(&ClientConfig::default()).unwrap();
        let result = client
            .send("GET", "http://127.0.0.1:1", &[], None)
            .await;
        assert!(matches!(result, Err(RicochetError::Network(_))));
    }
}
