//! `ricochet interactsh url` / `ricochet interactsh poll`: thin pass-through
//! calls against an external collaborator server. Deliberately not a
//! reimplementation of the Interactsh protocol's cryptographic polling —
//! just "mint a URL" and "ask what arrived", both as plain HTTP round-trips.

use crate::cli::{InteractshAction, InteractshArgs};
use ricochet_net::{ClientConfig, HttpClient};
use ricochet_types::{RicochetError, Result};

/// Result of an `interactsh` call: the raw response body, for the caller to
/// print or parse further.
#[derive(Debug, Clone)]
pub struct InteractshOutput {
    pub status: u16,
    pub body: String,
}

/// Dispatches to `url` or `poll` against `args.action`'s `--server`.
///
/// # Errors
///
/// Returns a network error if the collaborator server cannot be reached.
pub async fn run(args: InteractshArgs) -> Result<InteractshOutput> {
    let client = HttpClient::new(&ClientConfig::default())?;

    match args.action {
        InteractshAction::Url { server } => {
            let endpoint = format!("{}/register", server.trim_end_matches('/'));
            let response = client.send("GET", &endpoint, &[], None).await?;
            Ok(InteractshOutput {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            })
        }
        InteractshAction::Poll {
            server,
            correlation_id,
        } => {
            if correlation_id.trim().is_empty() {
                return Err(RicochetError::Usage(
                    "--correlation-id must not be empty".to_string(),
                ));
            }
            let endpoint = format!(
                "{}/poll?id={}",
                server.trim_end_matches('/'),
                urlencoding::encode(&correlation_id),
            );
            let response = client.send("GET", &endpoint, &[], None).await?;
            Ok(InteractshOutput {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn url_action_hits_register_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200).set_body_string("abc123.oast.fun"))
            .mount(&server)
            .await;

        let output = run(InteractshArgs {
            action: InteractshAction::Url {
                server: server.uri(),
            },
        })
        .await
        .unwrap();

        assert_eq!(output.status, 200);
        assert_eq!(output.body, "abc123.oast.fun");
    }

    #[tokio::test]
    async fn poll_action_passes_correlation_id_as_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/poll"))
            .and(query_param("id", "aaaaaaaaaaaaaaaa"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let output = run(InteractshArgs {
            action: InteractshAction::Poll {
                server: server.uri(),
                correlation_id: "aaaaaaaaaaaaaaaa".to_string(),
            },
        })
        .await
        .unwrap();

        assert_eq!(output.status, 200);
        assert_eq!(output.body, "[]");
    }

    #[tokio::test]
    async fn poll_rejects_empty_correlation_id() {
        let result = run(InteractshArgs {
            action: InteractshAction::Poll {
                server: "https://oast.fun".to_string(),
                correlation_id: String::new(),
            },
        })
        .await;
        assert!(result.is_err());
    }
}
