//! JSONL and text rendering of [`Finding`] records.

use ricochet_types::Finding;
use serde::Serialize;
use serde_json::Value;

/// One line of `findings -o json` output.
#[derive(Debug, Serialize)]
pub struct FindingLine {
    /// ISO-8601 timestamp this line was emitted, not when the callback arrived.
    pub timestamp: String,
    /// Fixed tag identifying the producing tool.
    pub tool: &'static str,
    /// The finding payload.
    pub finding: FindingBody,
}

/// The `finding` object nested inside [`FindingLine`].
#[derive(Debug, Serialize)]
pub struct FindingBody {
    /// The token joining injection and callback.
    pub correlation_id: String,
    /// Derived severity.
    pub severity: String,
    /// The injection side of the join.
    pub injection: InjectionBody,
    /// The callback side of the join.
    pub callback: CallbackBody,
}

/// The `injection` object nested inside [`FindingBody`].
#[derive(Debug, Serialize)]
pub struct InjectionBody {
    /// Full target URL the payload was sent to.
    pub target_url: String,
    /// Injected parameter/header/cookie/field name.
    pub parameter: String,
    /// Payload after `{{CALLBACK}}` substitution.
    pub payload: String,
    /// Free-form context tag.
    pub context: String,
    /// Seconds since the Unix epoch.
    pub injected_at: f64,
}

/// The `callback` object nested inside [`FindingBody`].
#[derive(Debug, Serialize)]
pub struct CallbackBody {
    /// Source address of the interaction.
    pub source_ip: String,
    /// Full HTTP path or `DNS:<qname>`.
    pub request_path: String,
    /// Seconds since the Unix epoch.
    pub received_at: f64,
    /// `received_at - injected_at`.
    pub delay_seconds: f64,
    /// Best-effort structured metadata parsed from the callback body, if any.
    pub metadata: Option<Value>,
}

impl From<&Finding> for FindingLine {
    fn from(finding: &Finding) -> Self {
        let metadata = finding
            .callback
            .metadata
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok());

        Self {
            timestamp: now_iso8601(),
            tool: "ricochet",
            finding: FindingBody {
                correlation_id: finding.injection.token.as_str().to_string(),
                severity: finding.severity.as_str().to_string(),
                injection: InjectionBody {
                    target_url: finding.injection.target_url.clone(),
                    parameter: finding.injection.parameter.clone(),
                    payload: finding.injection.payload.clone(),
                    context: finding.injection.context.clone(),
                    injected_at: finding.injection.injected_at,
                },
                callback: CallbackBody {
                    source_ip: finding.callback.source_ip.clone(),
                    request_path: finding.callback.request_path.clone(),
                    received_at: finding.callback.received_at,
                    delay_seconds: finding.delay_seconds,
                    metadata,
                },
            },
        }
    }
}

fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Renders one finding as a JSONL line (no trailing newline).
#[must_use]
pub fn to_json_line(finding: &Finding) -> String {
    serde_json::to_string(&FindingLine::from(finding)).unwrap_or_default()
}

/// Renders one finding as a short human-readable summary.
#[must_use]
pub fn to_text_line(finding: &Finding, verbose: bool) -> String {
    let mut line = format!(
        "[{}] {} {} <- {} {} (delay {:.1}s)",
        finding.severity,
        finding.injection.token,
        finding.injection.parameter,
        finding.callback.source_ip,
        finding.callback.request_path,
        finding.delay_seconds,
    );
    if verbose {
        line.push_str(&format!(
            "\n  target: {}\n  payload: {}\n  headers: {}",
            finding.injection.target_url, finding.injection.payload, finding.callback.headers,
        ));
        if let Some(body) = &finding.callback.body {
            line.push_str(&format!(
                "\n  body: {}",
                String::from_utf8_lossy(body)
            ));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_types::{Callback, Injection, Token};

    fn sample_finding() -> Finding {
        Finding::new(
            Injection {
                token: Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()),
                target_url: "http://t.example/?q=X".into(),
                parameter: "q".into(),
                payload: "<img src=\"http://cb.example/aaaaaaaaaaaaaaaa\">".into(),
                context: "xss:html".into(),
                injected_at: 1000.0,
            },
            Callback {
                id: 1,
                token: Token::from_trusted("aaaaaaaaaaaaaaaa".to_string()),
                source_ip: "10.0.0.1".into(),
                request_path: "/aaaaaaaaaaaaaaaa".into(),
                headers: "{}".into(),
                body: None,
                received_at: 1005.0,
                metadata: None,
            },
        )
    }

    #[test]
    fn json_line_round_trips_through_serde() {
        let finding = sample_finding();
        let line = to_json_line(&finding);
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["tool"], "ricochet");
        assert_eq!(value["finding"]["correlation_id"], "aaaaaaaaaaaaaaaa");
        assert_eq!(value["finding"]["severity"], "medium");
        assert_eq!(value["finding"]["callback"]["delay_seconds"], 5.0);
    }

    #[test]
    fn text_line_includes_severity_and_token() {
        let finding = sample_finding();
        let line = to_text_line(&finding, false);
        assert!(line.contains("medium"));
        assert!(line.contains("aaaaaaaaaaaaaaaa"));
        assert!(!line.contains("target:"));
    }

    #[test]
    fn verbose_text_line_includes_target_and_payload() {
        let finding = sample_finding();
        let line = to_text_line(&finding, true);
        assert!(line.contains("target: http://t.example/?q=X"));
        assert!(line.contains("payload:"));
    }
}
