//! `ricochet active`: probes a catalog of commonly-instrumented endpoints on
//! a single base URL, rather than injecting into a captured request —
//! the `active` subcommand's probe endpoint catalog.

use crate::cli::ActiveArgs;
use crate::commands::support::{build_client_and_limiter, open_store};
use ricochet_config::RicochetConfig;
use ricochet_inject::Injector;
use ricochet_request::{InjectionPoint, RawRequest};
use ricochet_types::{RicochetError, Result};

/// Endpoints commonly wired to background processors, log viewers, or
/// admin dashboards — the kind of second-order sink this mode is meant to
/// shake loose without a captured request to work from.
const DEFAULT_CATALOG: &[&str] = &[
    "/", "/api/health", "/feedback", "/contact", "/support", "/webhook",
    "/api/v1/users", "/search", "/admin/login", "/upload",
];

/// Probes every endpoint in the catalog (or `--endpoints` file) on
/// `args.base_url`'s `q` query parameter, recording one injection per
/// endpoint.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the endpoints file
/// cannot be read, or the base URL is malformed.
pub async fn run(args: ActiveArgs, config: &RicochetConfig) -> Result<Vec<ricochet_inject::InjectOutcome>> {
    let store = open_store(config).await?;
    let (client, limiter) =
        build_client_and_limiter(config, args.rate, None, args.proxy.clone(), false)?;
    let injector = Injector::new(store, client, limiter, args.callback.clone());

    let catalog = match &args.endpoints {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| RicochetError::Usage(format!("reading {}: {e}", path.display())))?;
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        }
        None => DEFAULT_CATALOG.iter().map(ToString::to_string).collect(),
    };

    let base = url::Url::parse(&args.base_url)
        .map_err(|e| RicochetError::Usage(format!("invalid --url {}: {e}", args.base_url)))?;
    let host = base
        .host_str()
        .ok_or_else(|| RicochetError::Usage(format!("URL {} has no host", args.base_url)))?;
    let host_header = match base.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let use_tls = base.scheme() == "https";

    let mut outcomes = Vec::new();
    for endpoint in &catalog {
        let request = RawRequest {
            method: "GET".to_string(),
            path: format!("{endpoint}?q=x"),
            version: "HTTP/1.1".to_string(),
            headers: vec![("Host".to_string(), host_header.clone())],
            body: Vec::new(),
            use_tls,
        };
        let outcome = injector
            .inject_at_point(
                &request,
                &InjectionPoint::Query("q".to_string()),
                "{{CALLBACK}}",
                "active-probe",
                false,
            )
            .await?;
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
