//! `ricochet passive`: inject, then adaptively poll for callbacks.

use crate::cli::PassiveArgs;
use crate::commands::inject::run_with_injector;
use crate::commands::support::{build_client_and_limiter, load_templates, open_store};
use ricochet_config::RicochetConfig;
use ricochet_inject::Injector;
use ricochet_poller::{PollConfig, PollPhase, Poller};
use ricochet_types::{Finding, Result};
use std::time::Duration;

/// Runs the injection batch described by `args.injection`, then polls the
/// store with adaptive backoff until new callbacks stop arriving or the
/// poll budget elapses, returning every finding observed along the way.
///
/// # Errors
///
/// Returns an error if the injection batch or a store query fails.
pub async fn run(args: PassiveArgs, config: &RicochetConfig) -> Result<Vec<Finding>> {
    let opts = &args.injection;
    let store = open_store(config).await?;
    let (client, limiter) = build_client_and_limiter(
        config,
        opts.rate,
        opts.timeout,
        opts.proxy.clone(),
        opts.insecure,
    )?;
    let injector = Injector::new(store.clone(), client, limiter, opts.callback.clone());
    let templates = load_templates(&opts.payload, &opts.payloads)?;

    let outcomes = run_with_injector(&injector, opts, &templates).await?;
    let tokens: Vec<_> = outcomes.into_iter().map(|o| o.token).collect();
    tracing::info!(count = tokens.len(), "injection batch complete, entering poll loop");

    let poll_config = PollConfig {
        base_interval: Duration::from_secs(
            args.poll_interval.unwrap_or(config.poll_base_interval_secs),
        ),
        max_interval: Duration::from_secs(config.poll_max_interval_secs),
        timeout: Duration::from_secs(args.poll_timeout.unwrap_or(3600)),
        ..PollConfig::default()
    };
    let mut poller = Poller::new(store, tokens, poll_config);

    let mut findings = Vec::new();
    loop {
        let tick = poller.poll_once().await.map_err(ricochet_types::RicochetError::from)?;
        if !tick.new_findings.is_empty() {
            tracing::info!(count = tick.new_findings.len(), "new callbacks observed");
        }
        findings.extend(tick.new_findings);

        if tick.phase == PollPhase::Terminated {
            break;
        }
        tokio::time::sleep(tick.next_interval).await;
    }

    Ok(findings)
}
