//! `ricochet findings`: lists recorded findings.

use crate::cli::{FindingsArgs, OutputFormat};
use crate::commands::support::open_store;
use crate::output::{to_json_line, to_text_line};
use ricochet_config::RicochetConfig;
use ricochet_types::{RicochetError, Result, Severity};

/// Loads findings matching `args` and renders them as JSON or text lines,
/// one per finding, newest callback first.
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if `--min-severity` is not a recognized
/// severity name, or a store error if the query fails.
pub async fn run(args: FindingsArgs, config: &RicochetConfig) -> Result<Vec<String>> {
    let store = open_store(config).await?;

    let min_severity = match &args.min_severity {
        Some(name) => Some(
            Severity::parse(name)
                .ok_or_else(|| RicochetError::Usage(format!("unknown severity {name:?}")))?,
        ),
        None => None,
    };

    let since = args.since.map(|hours_ago| {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        now - hours_ago * 3600.0
    });

    let findings = store.get_findings(since, min_severity).await?;

    let lines = findings
        .iter()
        .map(|finding| match args.output {
            OutputFormat::Json => to_json_line(finding),
            OutputFormat::Text => to_text_line(finding, args.verbose),
        })
        .collect();

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_test_support::TestStore;
    use ricochet_types::{Injection, Token};

    #[tokio::test]
    async fn since_filter_excludes_older_callbacks() {
        let test_store = TestStore::new().await.unwrap();
        let store = test_store.store();
        let token = Token::from_trusted("aaaaaaaaaaaaaaaa".to_string());
        store
            .record_injection(Injection {
                token: token.clone(),
                target_url: "http://t.example/?q=x".into(),
                parameter: "q".into(),
                payload: "x".into(),
                context: "xss:html".into(),
                injected_at: 0.0,
            })
            .await
            .unwrap();
        store
            .record_callback(&token, "10.0.0.1", "/x", "{}", None, 100.0, None)
            .await
            .unwrap();

        // a cutoff after the callback's received_at must exclude it
        let findings = store.get_findings(Some(101.0), None).await.unwrap();
        assert!(findings.is_empty());

        // a cutoff before it must include it
        let findings = store.get_findings(Some(50.0), None).await.unwrap();
        assert_eq!(findings.len(), 1);
    }

    #[tokio::test]
    async fn min_severity_filters_out_info() {
        let test_store = TestStore::new().await.unwrap();
        let store = test_store.store();
        let token = Token::from_trusted("bbbbbbbbbbbbbbbb".to_string());
        store
            .record_injection(Injection {
                token: token.clone(),
                target_url: "http://t.example/?q=x".into(),
                parameter: "q".into(),
                payload: "x".into(),
                context: "probe".into(),
                injected_at: 0.0,
            })
            .await
            .unwrap();
        store
            .record_callback(&token, "10.0.0.1", "/x", "{}", None, 1.0, None)
            .await
            .unwrap();

        let findings = store
            .get_findings(None, Some(Severity::Medium))
            .await
            .unwrap();
        assert!(findings.is_empty());
    }
}
