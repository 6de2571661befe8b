//! `ricochet report`: renders a bug-bounty-style Markdown write-up from the
//! findings recorded against one or more injections.

use crate::cli::ReportArgs;
use crate::commands::support::open_store;
use ricochet_config::RicochetConfig;
use ricochet_types::{Finding, Injection, RicochetError, Result, Severity, Token};
use std::path::PathBuf;

/// One rendered report: either destined for stdout (`path: None`) or a file
/// under `--output` (`path: Some(...)`).
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// The injection's token, used to name the file under `--output`.
    pub token: String,
    /// Where this report was (or should be) written. `None` means stdout.
    pub path: Option<PathBuf>,
    /// The rendered Markdown body.
    pub markdown: String,
}

/// Renders one report per matching injection and, for `--all`, writes each
/// to `<output>/<token>.md`.
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if neither `--correlation-id` nor `--all`
/// was given, if `--all` was given without `--output`, or if a report's
/// target token has no recorded injection. Returns a store or I/O error on
/// query/write failure.
pub async fn run(args: ReportArgs, config: &RicochetConfig) -> Result<Vec<ReportOutput>> {
    let store = open_store(config).await?;

    let mut outputs = Vec::new();

    if let Some(correlation_id) = &args.correlation_id {
        let token = Token::parse(correlation_id)
            .map_err(|e| RicochetError::Usage(format!("invalid --correlation-id: {e}")))?;
        let injection = store
            .get_injection(&token)
            .await?
            .ok_or_else(|| RicochetError::Usage(format!("no injection recorded for {correlation_id}")))?;
        let callbacks = store.get_callbacks_for_injection(&token).await?;
        let findings: Vec<Finding> = callbacks
            .into_iter()
            .map(|cb| Finding::new(injection.clone(), cb))
            .collect();
        let markdown = render_report(&injection, &findings);
        let path = args.output.clone();
        outputs.push(ReportOutput {
            token: token.as_str().to_string(),
            path,
            markdown,
        });
    } else if args.all {
        let output_dir = args
            .output
            .clone()
            .ok_or_else(|| RicochetError::Usage("--all requires --output <dir>".to_string()))?;
        let injections = store.list_injections(i64::MAX).await?;
        for injection in injections {
            let callbacks = store.get_callbacks_for_injection(&injection.token).await?;
            if callbacks.is_empty() {
                continue;
            }
            let findings: Vec<Finding> = callbacks
                .into_iter()
                .map(|cb| Finding::new(injection.clone(), cb))
                .collect();
            let markdown = render_report(&injection, &findings);
            outputs.push(ReportOutput {
                token: injection.token.as_str().to_string(),
                path: Some(output_dir.join(format!("{}.md", injection.token.as_str()))),
                markdown,
            });
        }
    } else {
        return Err(RicochetError::Usage(
            "report requires --correlation-id or --all".to_string(),
        ));
    }

    for output in &outputs {
        if let Some(path) = &output.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| RicochetError::Usage(format!("creating {}: {e}", parent.display())))?;
            }
            std::fs::write(path, &output.markdown)
                .map_err(|e| RicochetError::Usage(format!("writing {}: {e}", path.display())))?;
        }
    }

    Ok(outputs)
}

fn render_report(injection: &Injection, findings: &[Finding]) -> String {
    let severity = Severity::from_context(&injection.context);
    let mut body = format!(
        "# Out-of-band interaction: {}\n\n\
         **Severity:** {severity}\n\
         **Parameter:** `{}`\n\
         **Context:** `{}`\n\
         **Target:** {}\n\
         **Payload:** `{}`\n\n\
         ## Summary\n\n\
         A payload injected into `{}` triggered {} out-of-band callback(s), \
         indicating the value is processed asynchronously outside the original \
         request/response cycle.\n\n\
         ## Timeline\n\n",
        injection.token,
        injection.parameter,
        injection.context,
        injection.target_url,
        injection.payload,
        injection.parameter,
        findings.len(),
    );

    for finding in findings {
        body.push_str(&format!(
            "- `{:.1}`s after injection: `{}` from `{}`\n",
            finding.delay_seconds, finding.callback.request_path, finding.callback.source_ip,
        ));
    }

    body.push_str(
        "\n## Suggested remediation\n\n\
         Treat this value as untrusted wherever it is rendered, executed, or \
         interpolated downstream, not only at the point it was first received.\n",
    );

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_types::Callback;

    fn sample() -> (Injection, Vec<Finding>) {
        let injection = Injection {
            token: Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()),
            target_url: "http://t.example/?q=X".into(),
            parameter: "q".into(),
            payload: "<img src=\"http://cb.example/aaaaaaaaaaaaaaaa\">".into(),
            context: "xss:html".into(),
            injected_at: 1000.0,
        };
        let callback = Callback {
            id: 1,
            token: injection.token.clone(),
            source_ip: "10.0.0.1".into(),
            request_path: "/aaaaaaaaaaaaaaaa".into(),
            headers: "{}".into(),
            body: None,
            received_at: 1005.0,
            metadata: None,
        };
        let finding = Finding::new(injection.clone(), callback);
        (injection, vec![finding])
    }

    #[test]
    fn report_names_token_severity_and_timeline_entry() {
        let (injection, findings) = sample();
        let markdown = render_report(&injection, &findings);
        assert!(markdown.contains("aaaaaaaaaaaaaaaa"));
        assert!(markdown.contains("medium"));
        assert!(markdown.contains("10.0.0.1"));
    }
}
