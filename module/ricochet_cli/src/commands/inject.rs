//! `ricochet inject`.

use crate::cli::{InjectArgs, InjectionOpts};
use crate::commands::support::{
    build_client_and_limiter, load_crawl_vectors, load_request_and_points, load_templates,
    open_store,
};
use ricochet_config::RicochetConfig;
use ricochet_inject::{InjectOutcome, Injector};
use ricochet_request::{InjectionPoint, RawRequest};
use ricochet_types::Result;

/// Runs one injection batch: every payload template against every extracted
/// vector, minting a fresh token per combination (multi-payload
/// mode).
///
/// # Errors
///
/// Returns an error if the request/crawl file is malformed, the store
/// cannot be opened, or an injection cannot be recorded.
pub async fn run(args: InjectArgs, config: &RicochetConfig) -> Result<Vec<InjectOutcome>> {
    let opts = &args.injection;
    let store = open_store(config).await?;
    let (client, limiter) = build_client_and_limiter(
        config,
        opts.rate,
        opts.timeout,
        opts.proxy.clone(),
        opts.insecure,
    )?;
    let injector = Injector::new(store, client, limiter, opts.callback.clone());
    let templates = load_templates(&opts.payload, &opts.payloads)?;

    run_with_injector(&injector, opts, &templates).await
}

/// The body of [`run`], split out so tests can supply an [`Injector`] wired
/// to a temp-file store and a mock HTTP target.
pub(crate) async fn run_with_injector(
    injector: &Injector,
    opts: &InjectionOpts,
    templates: &[String],
) -> Result<Vec<InjectOutcome>> {
    let targets: Vec<(RawRequest, Vec<InjectionPoint>)> = if let Some(crawl_path) = &opts.from_crawl
    {
        load_crawl_vectors(crawl_path)?
            .into_iter()
            .map(|vector| {
                let request = RawRequest {
                    method: "GET".to_string(),
                    path: vector.url.clone(),
                    version: "HTTP/1.1".to_string(),
                    headers: vec![("Host".to_string(), host_of(&vector.url))],
                    body: Vec::new(),
                    use_tls: vector.url.starts_with("https://"),
                };
                let points = vector
                    .parameters
                    .into_iter()
                    .map(InjectionPoint::Query)
                    .collect();
                (request, points)
            })
            .collect()
    } else {
        vec![load_request_and_points(opts)?]
    };

    let mut outcomes = Vec::new();
    for (request, points) in &targets {
        for template in templates {
            let batch = injector
                .inject_at_points(request, points, template, &opts.context, opts.dry_run)
                .await?;
            outcomes.extend(batch);
        }
    }
    Ok(outcomes)
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_default()
}
