//! Shared setup shared by `inject`, `passive`, and `active`: opening the
//! store, building the HTTP client and rate limiter from CLI/config values,
//! and loading payload templates and request vectors from disk.

use crate::cli::InjectionOpts;
use ricochet_config::RicochetConfig;
use ricochet_net::{ClientConfig, HttpClient, RateLimiter};
use ricochet_request::{vectors, InjectionPoint, RawRequest};
use ricochet_store::Store;
use ricochet_types::{RicochetError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Opens the configured store, creating its parent directory if needed.
///
/// # Errors
///
/// Returns [`RicochetError::StoreIo`] if the database cannot be opened.
pub async fn open_store(config: &RicochetConfig) -> Result<Store> {
    Store::open(&config.db_path).await.map_err(RicochetError::from)
}

/// Builds an [`HttpClient`] and [`RateLimiter`] from per-command overrides,
/// falling back to `config` for anything left unset.
///
/// # Errors
///
/// Returns an error if the client cannot be constructed (bad proxy URL).
pub fn build_client_and_limiter(
    config: &RicochetConfig,
    rate: Option<u32>,
    timeout: Option<u64>,
    proxy: Option<String>,
    insecure: bool,
) -> Result<(HttpClient, RateLimiter)> {
    let client_config = ClientConfig {
        timeout: Some(Duration::from_secs(
            timeout.unwrap_or(config.http_timeout_secs),
        )),
        proxy,
        verify_tls: !insecure,
        ..ClientConfig::default()
    };
    let client = HttpClient::new(&client_config)?;
    let limiter = RateLimiter::new(
        rate.unwrap_or(config.rate_limit_per_second),
        Duration::from_secs(1),
    );
    Ok((client, limiter))
}

/// Loads payload templates from either a single `--payload` string or a
/// `--payloads` file (one template per line; `#`-prefixed and
/// blank lines skipped, trailing line endings stripped, leading whitespace
/// preserved).
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if neither or both were given, or the
/// file cannot be read.
pub fn load_templates(payload: &Option<String>, payloads: &Option<std::path::PathBuf>) -> Result<Vec<String>> {
    match (payload, payloads) {
        (Some(single), None) => Ok(vec![single.clone()]),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| RicochetError::Usage(format!("reading {}: {e}", path.display())))?;
            Ok(text
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(ToString::to_string)
                .collect())
        }
        (None, None) => Err(RicochetError::Usage(
            "one of --payload or --payloads is required".to_string(),
        )),
        (Some(_), Some(_)) => Err(RicochetError::Usage(
            "--payload and --payloads are mutually exclusive".to_string(),
        )),
    }
}

/// One vector from a crawler-produced JSON file (`--from-crawl`): a target
/// URL plus the parameter names found on it.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlVector {
    /// Target URL the crawler observed the parameters on.
    pub url: String,
    /// Injectable parameter names the crawler discovered at `url`.
    pub parameters: Vec<String>,
}

/// Loads a `--from-crawl` JSON vector file: a JSON array of [`CrawlVector`].
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if the file cannot be read or parsed.
pub fn load_crawl_vectors(path: &Path) -> Result<Vec<CrawlVector>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RicochetError::Usage(format!("reading {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| RicochetError::Usage(format!("parsing {}: {e}", path.display())))
}

/// Builds the [`RawRequest`] and its extracted [`InjectionPoint`]s for
/// `-u URL -p PARAM` or `-r REQUEST_FILE` invocations.
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if neither or both targeting modes were
/// given, or [`RicochetError::RequestParse`] if a request file is malformed.
pub fn load_request_and_points(opts: &InjectionOpts) -> Result<(RawRequest, Vec<InjectionPoint>)> {
    match (&opts.url, &opts.request_file) {
        (Some(url), None) => {
            let param = opts.param.clone().ok_or_else(|| {
                RicochetError::Usage("-p/--param is required together with -u/--url".to_string())
            })?;
            let request = request_from_url(url)?;
            Ok((request, vec![InjectionPoint::Query(param)]))
        }
        (None, Some(path)) => {
            let bytes = std::fs::read(path)
                .map_err(|e| RicochetError::Usage(format!("reading {}: {e}", path.display())))?;
            let use_tls = opts
                .url
                .as_deref()
                .is_some_and(|u| u.starts_with("https://"));
            let request = RawRequest::parse(&bytes, use_tls)?;
            let points = vectors::extract(&request);
            Ok((request, points))
        }
        (None, None) => Err(RicochetError::Usage(
            "one of -u/--url (with -p/--param) or -r/--request-file is required".to_string(),
        )),
        (Some(_), Some(_)) => Err(RicochetError::Usage(
            "-u/--url and -r/--request-file are mutually exclusive".to_string(),
        )),
    }
}

/// Synthesizes a minimal [`RawRequest`] for a bare `-u URL` invocation (no
/// Burp request file available, just a single query parameter target).
fn request_from_url(url: &str) -> Result<RawRequest> {
    let parsed = url::Url::parse(url)
        .map_err(|e| RicochetError::Usage(format!("invalid URL {url}: {e}")))?;
    let host = parsed.host_str().ok_or_else(|| {
        RicochetError::Usage(format!("URL {url} has no host"))
    })?;
    let host_header = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let mut path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }
    Ok(RawRequest {
        method: "GET".to_string(),
        path,
        version: "HTTP/1.1".to_string(),
        headers: vec![("Host".to_string(), host_header)],
        body: Vec::new(),
        use_tls: parsed.scheme() == "https",
    })
}
