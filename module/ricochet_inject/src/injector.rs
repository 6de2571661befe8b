//! Drives payload substitution, rate-limited delivery, and injection
//! bookkeeping.

use crate::templating::render;
use ricochet_net::{HttpClient, RateLimiter};
use ricochet_request::{InjectionPoint, RawRequest};
use ricochet_store::Store;
use ricochet_types::{Injection, Result, Token};
use std::time::{SystemTime, UNIX_EPOCH};

/// One injection attempt's outcome: the token minted for it, and — unless
/// this was a dry run — the HTTP response the target returned.
#[derive(Debug, Clone)]
pub struct InjectOutcome {
    /// The token minted for this attempt, embedded in the sent payload.
    pub token: Token,
    /// The injection point the payload was placed at.
    pub point: InjectionPoint,
    /// Response status, if the request was actually sent.
    pub status: Option<u16>,
}

/// Composes the token mint, the templated payload, the rate limiter, the
/// HTTP client, and the store into one "inject a payload at a point" unit.
#[derive(Clone)]
pub struct Injector {
    store: Store,
    client: HttpClient,
    rate_limiter: RateLimiter,
    /// The callback base URL, e.g. `"http://cb.example"` or
    /// `"https://oast.fun"`. `{{CALLBACK}}` resolves to `<callback_base>/<token>`,
    /// the token appended as a final path segment.
    callback_base: String,
}

impl Injector {
    /// Builds an injector over an already-open store, HTTP client, and rate
    /// limiter.
    #[must_use]
    pub fn new(
        store: Store,
        client: HttpClient,
        rate_limiter: RateLimiter,
        callback_base: impl Into<String>,
    ) -> Self {
        Self {
            store,
            client,
            rate_limiter,
            callback_base: callback_base.into(),
        }
    }

    /// Injects `payload_template` at every point in `points`, one request
    /// per point, recording each as an [`Injection`] before it is sent, so a
    /// crash mid-scan never loses a token that did reach the target.
    ///
    /// In `dry_run` mode nothing is sent over the network or rate-limited —
    /// only the injection record is written, for previewing what a scan
    /// would do.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the injection record (a token
    /// collision) or, outside dry-run mode, if the request cannot be sent
    /// at all.
    pub async fn inject_at_points(
        &self,
        request: &RawRequest,
        points: &[InjectionPoint],
        payload_template: &str,
        context: &str,
        dry_run: bool,
    ) -> Result<Vec<InjectOutcome>> {
        let mut outcomes = Vec::with_capacity(points.len());
        for point in points {
            let outcome = self
                .inject_at_point(request, point, payload_template, context, dry_run)
                .await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Injects `payload_template` at a single point. See
    /// [`Self::inject_at_points`] for the record-before-send contract.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the injection record or, when
    /// not a dry run, if the network send fails.
    pub async fn inject_at_point(
        &self,
        request: &RawRequest,
        point: &InjectionPoint,
        payload_template: &str,
        context: &str,
        dry_run: bool,
    ) -> Result<InjectOutcome> {
        let token = ricochet_store::mint_token();
        let callback_url = format!(
            "{}/{}",
            self.callback_base.trim_end_matches('/'),
            token.as_str()
        );
        let payload = render(payload_template, &callback_url);

        let injected = apply_point(request, point, &payload);

        let injected_at = now_seconds();
        self.store
            .record_injection(Injection {
                token: token.clone(),
                target_url: injected.target_url(),
                parameter: point.label(),
                payload: payload.clone(),
                context: context.to_string(),
                injected_at,
            })
            .await
            .map_err(ricochet_types::RicochetError::from)?;

        let status = if dry_run {
            None
        } else {
            self.rate_limiter.acquire().await;
            let response = self
                .client
                .send(
                    &injected.method,
                    &injected.target_url(),
                    &injected.headers,
                    Some(injected.body.clone()),
                )
                .await?;
            Some(response.status)
        };

        Ok(InjectOutcome {
            token,
            point: point.clone(),
            status,
        })
    }
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Produces a new [`RawRequest`] with `value` substituted at `point`,
/// recomputing the body-carrying headers (`Content-Length`, form encoding)
/// as needed.
fn apply_point(request: &RawRequest, point: &InjectionPoint, value: &str) -> RawRequest {
    let mut request = request.clone();
    match point {
        InjectionPoint::Query(name) => {
            request.path = replace_in_pairs(&request.path, '?', '&', name, value, true);
        }
        InjectionPoint::Header(name) => {
            request.set_header(name, value);
        }
        InjectionPoint::Cookie(name) => {
            let current = request.header("cookie").unwrap_or_default().to_string();
            let updated = replace_cookie(&current, name, value);
            request.set_header("Cookie", updated);
        }
        InjectionPoint::FormField(name) => {
            let body = String::from_utf8_lossy(&request.body).to_string();
            let updated = replace_in_pairs(&body, '\0', '&', name, value, false);
            request.body = updated.into_bytes();
            request.set_header("Content-Length", request.body.len().to_string());
        }
        InjectionPoint::JsonField(name) => {
            if let Ok(mut json) = serde_json::from_slice::<serde_json::Value>(&request.body) {
                if let Some(obj) = json.as_object_mut() {
                    obj.insert(name.clone(), serde_json::Value::String(value.to_string()));
                }
                request.body = serde_json::to_vec(&json).unwrap_or_default();
                request.set_header("Content-Length", request.body.len().to_string());
            }
        }
    }
    request
}

/// Replaces the value of `name` inside an `&`-joined `key=value` sequence.
///
/// `prefix_char` marks where the pair sequence starts within `input`
/// (`?` for a URL path, `\0` meaning "the whole string is pairs" for a
/// form body); the prefix and everything before it is preserved verbatim.
fn replace_in_pairs(
    input: &str,
    prefix_char: char,
    sep: char,
    name: &str,
    value: &str,
    has_prefix: bool,
) -> String {
    let (head, pairs) = if has_prefix {
        match input.split_once(prefix_char) {
            Some((h, p)) => (format!("{h}{prefix_char}"), p),
            None => return input.to_string(),
        }
    } else {
        (String::new(), input)
    };

    let rewritten: Vec<String> = pairs
        .split(sep)
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == name => {
                format!("{key}={}", urlencoding::encode(value))
            }
            _ => pair.to_string(),
        })
        .collect();

    format!("{head}{}", rewritten.join(&sep.to_string()))
}

fn replace_cookie(cookie_header: &str, name: &str, value: &str) -> String {
    cookie_header
        .split(';')
        .map(|pair| {
            let trimmed = pair.trim();
            match trimmed.split_once('=') {
                Some((key, _)) if key.trim() == name => format!("{}={value}", key.trim()),
                _ => trimmed.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_request::RawRequest;

    fn sample_request() -> RawRequest {
        RawRequest::parse(
            b"GET /search?q=hello&page=1 HTTP/1.1\r\nHost: victim.example\r\nCookie: session=abc; theme=dark\r\n\r\n",
            true,
        )
        .unwrap()
    }

    #[test]
    fn apply_point_substitutes_query_value() {
        let req = sample_request();
        let injected = apply_point(&req, &InjectionPoint::Query("q".to_string()), "PAYLOAD");
        assert!(injected.path.contains("q=PAYLOAD"));
        assert!(injected.path.contains("page=1"));
    }

    #[test]
    fn apply_point_substitutes_cookie_value() {
        let req = sample_request();
        let injected = apply_point(&req, &InjectionPoint::Cookie("session".to_string()), "x");
        assert_eq!(injected.header("cookie"), Some("session=x; theme=dark"));
    }

    #[test]
    fn apply_point_substitutes_header_value() {
        let mut req = sample_request();
        req.set_header("X-Forwarded-For", "1.1.1.1");
        let injected = apply_point(&req, &InjectionPoint::Header("X-Forwarded-For".to_string()), "2.2.2.2");
        assert_eq!(injected.header("x-forwarded-for"), Some("2.2.2.2"));
    }

    #[test]
    fn apply_point_substitutes_json_field_and_recomputes_length() {
        let raw = b"POST /a HTTP/1.1\r\nHost: x\r\nContent-Type: application/json\r\nContent-Length: 16\r\n\r\n{\"name\":\"bob\"}\r\n";
        let req = RawRequest::parse(raw, true).unwrap();
        let injected = apply_point(&req, &InjectionPoint::JsonField("name".to_string()), "INJ");
        let value: serde_json::Value = serde_json::from_slice(&injected.body).unwrap();
        assert_eq!(value["name"], "INJ");
        assert_eq!(
            injected.header("content-length"),
            Some(injected.body.len().to_string()).as_deref()
        );
    }
}
