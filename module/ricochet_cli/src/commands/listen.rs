//! `ricochet listen --http` / `--dns`.

use crate::cli::ListenArgs;
use crate::commands::support::open_store;
use ricochet_config::RicochetConfig;
use ricochet_types::{Result, RicochetError};

/// Runs the requested listener(s) until `Ctrl-C`.
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if neither `--http` nor `--dns` was
/// given, or a network error if a listener cannot bind its address.
pub async fn run(args: ListenArgs, config: &RicochetConfig) -> Result<()> {
    if !args.http && !args.dns {
        return Err(RicochetError::Usage(
            "listen requires --http and/or --dns".to_string(),
        ));
    }

    let store = open_store(config).await?;

    let http_addr: std::net::SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| RicochetError::Usage(format!("invalid --host/--port: {e}")))?;
    let dns_addr: std::net::SocketAddr = format!("{}:{}", args.host, args.dns_port)
        .parse()
        .map_err(|e| RicochetError::Usage(format!("invalid --host/--dns-port: {e}")))?;

    let http_shutdown = shutdown_signal();
    let dns_shutdown = shutdown_signal();

    match (args.http, args.dns) {
        (true, true) => {
            let http_store = store.clone();
            let http_task = tokio::spawn(async move {
                ricochet_listener::http::serve(http_addr, http_store, http_shutdown).await
            });
            let dns_task = tokio::spawn(async move {
                ricochet_listener::dns::serve(dns_addr, store, dns_shutdown).await
            });
            let (http_result, dns_result) = tokio::try_join!(http_task, dns_task)
                .map_err(|e| RicochetError::Network(format!("listener task panicked: {e}")))?;
            http_result.map_err(|e| RicochetError::Network(e.to_string()))?;
            dns_result.map_err(|e| RicochetError::Network(e.to_string()))?;
        }
        (true, false) => {
            ricochet_listener::http::serve(http_addr, store, http_shutdown)
                .await
                .map_err(|e| RicochetError::Network(e.to_string()))?;
        }
        (false, true) => {
            ricochet_listener::dns::serve(dns_addr, store, dns_shutdown)
                .await
                .map_err(|e| RicochetError::Network(e.to_string()))?;
        }
        (false, false) => unreachable!("checked above"),
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
