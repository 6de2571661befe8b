//! `ricochet suggest`: context-based hints for where a second-order trigger
//! is likely to fire, given a parameter name, a specific injection, or the
//! tail of a recent batch.

use crate::cli::SuggestArgs;
use crate::commands::support::open_store;
use ricochet_config::RicochetConfig;
use ricochet_types::{RicochetError, Result};

/// One suggestion: a likely trigger surface plus the reasoning behind it.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The token or parameter this suggestion is about.
    pub subject: String,
    /// Human-readable reasoning.
    pub hint: String,
}

/// Parameter name fragments mapped to the background surface most likely to
/// re-render them later. Matched case-insensitively, first match wins.
const PARAM_HINTS: &[(&str, &str)] = &[
    ("email", "admin notification emails, digest renderers"),
    ("file", "async virus scanners, thumbnail/preview generators"),
    ("upload", "async virus scanners, thumbnail/preview generators"),
    ("name", "user profile pages, exported PDFs/invoices"),
    ("url", "link preview fetchers, webhook relays"),
    ("link", "link preview fetchers, webhook relays"),
    ("comment", "moderation queues, admin review dashboards"),
    ("message", "moderation queues, admin review dashboards"),
    ("feedback", "moderation queues, admin review dashboards"),
    ("search", "search analytics dashboards, saved-search digests"),
    ("query", "search analytics dashboards, saved-search digests"),
    ("address", "shipping label renderers, order management panels"),
    ("referer", "server-side analytics log viewers"),
    ("user-agent", "server-side analytics log viewers"),
];

/// Produces suggestions per `args`: by parameter name heuristic, by a
/// specific injection's recorded context, or across the most recent
/// injections still waiting on a callback.
///
/// # Errors
///
/// Returns [`RicochetError::Usage`] if none of `--param`, `--correlation-id`,
/// or `--recent` was given, or if the store query fails.
pub async fn run(args: SuggestArgs, config: &RicochetConfig) -> Result<Vec<Suggestion>> {
    if let Some(param) = &args.param {
        return Ok(vec![suggest_for_param(param)]);
    }

    let store = open_store(config).await?;

    if let Some(correlation_id) = &args.correlation_id {
        let token = ricochet_types::Token::parse(correlation_id)
            .map_err(|e| RicochetError::Usage(format!("invalid --correlation-id: {e}")))?;
        let injection = store
            .get_injection(&token)
            .await?
            .ok_or_else(|| RicochetError::Usage(format!("no injection recorded for {correlation_id}")))?;
        let callbacks = store.get_callbacks_for_injection(&token).await?;
        let mut suggestion = suggest_for_param(&injection.parameter);
        suggestion.subject = correlation_id.clone();
        if callbacks.is_empty() {
            suggestion
                .hint
                .push_str("; no callback yet, context tag is ");
            suggestion.hint.push_str(&injection.context);
        } else {
            suggestion.hint = format!(
                "already triggered ({} callback(s)); context {}",
                callbacks.len(),
                injection.context
            );
        }
        return Ok(vec![suggestion]);
    }

    if let Some(recent) = args.recent {
        let injections = store.list_injections(i64::from(recent)).await?;
        let mut suggestions = Vec::with_capacity(injections.len());
        for injection in injections {
            let callbacks = store.get_callbacks_for_injection(&injection.token).await?;
            if callbacks.is_empty() {
                let mut suggestion = suggest_for_param(&injection.parameter);
                suggestion.subject = injection.token.as_str().to_string();
                suggestions.push(suggestion);
            }
        }
        return Ok(suggestions);
    }

    Err(RicochetError::Usage(
        "one of --param, --correlation-id, or --recent is required".to_string(),
    ))
}

fn suggest_for_param(param: &str) -> Suggestion {
    let lower = param.to_ascii_lowercase();
    let hint = PARAM_HINTS
        .iter()
        .find(|(fragment, _)| lower.contains(fragment))
        .map_or(
            "generic background processor or log viewer",
            |(_, hint)| hint,
        );
    Suggestion {
        subject: param.to_string(),
        hint: hint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_param_suggests_notification_surfaces() {
        let suggestion = suggest_for_param("user_email");
        assert!(suggestion.hint.contains("notification"));
    }

    #[test]
    fn unmatched_param_falls_back_to_generic_hint() {
        let suggestion = suggest_for_param("xyzzy123");
        assert_eq!(suggestion.hint, "generic background processor or log viewer");
    }
}
