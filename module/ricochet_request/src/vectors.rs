//! Enumerates the places inside a [`RawRequest`] a payload can be deposited.

use crate::request::RawRequest;
use url::Url;

/// One place inside a request a payload could be substituted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionPoint {
    /// A URL query string parameter, by name.
    Query(String),
    /// A request header, by name (`Host`, `Cookie`, and `Content-Length`
    /// are excluded — see [`extract`]).
    Header(String),
    /// A single cookie within the `Cookie` header, by name.
    Cookie(String),
    /// A `application/x-www-form-urlencoded` body field, by name.
    FormField(String),
    /// A top-level key in a `application/json` body object.
    JsonField(String),
}

impl InjectionPoint {
    /// A short human-readable label, e.g. `query:q` or `json:username`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Query(n) => format!("query:{n}"),
            Self::Header(n) => format!("header:{n}"),
            Self::Cookie(n) => format!("cookie:{n}"),
            Self::FormField(n) => format!("form:{n}"),
            Self::JsonField(n) => format!("json:{n}"),
        }
    }
}

const EXCLUDED_HEADERS: &[&str] = &["host", "content-length", "cookie"];

/// Enumerates every injectable position in `request`.
///
/// Order is deterministic: query parameters, then headers, then cookies,
/// then body fields — so repeated runs against the same request produce
/// the same injection sequence (useful for resuming an interrupted scan).
#[must_use]
pub fn extract(request: &RawRequest) -> Vec<InjectionPoint> {
    let mut points = Vec::new();

    if let Some(query) = request.path.split_once('?').map(|(_, q)| q) {
        for pair in query.split('&') {
            if let Some((name, _)) = pair.split_once('=') {
                if !name.is_empty() {
                    points.push(InjectionPoint::Query(name.to_string()));
                }
            }
        }
    }

    for (name, _) in &request.headers {
        if !EXCLUDED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            points.push(InjectionPoint::Header(name.clone()));
        }
    }

    if let Some(cookie_header) = request.header("cookie") {
        for pair in cookie_header.split(';') {
            if let Some((name, _)) = pair.trim().split_once('=') {
                if !name.is_empty() {
                    points.push(InjectionPoint::Cookie(name.to_string()));
                }
            }
        }
    }

    let content_type = request.header("content-type").unwrap_or_default();
    if content_type.contains("application/x-www-form-urlencoded") {
        if let Ok(body) = std::str::from_utf8(&request.body) {
            for pair in body.split('&') {
                if let Some((name, _)) = pair.split_once('=') {
                    if !name.is_empty() {
                        points.push(InjectionPoint::FormField(name.to_string()));
                    }
                }
            }
        }
    } else if content_type.contains("application/json") {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&request.body) {
            if let Some(obj) = value.as_object() {
                for key in obj.keys() {
                    points.push(InjectionPoint::JsonField(key.clone()));
                }
            }
        }
    }

    points
}

/// Parses `url` and returns its query parameter names in order, for
/// targets provided as a bare URL rather than a Burp request file (a
/// single-parameter active/passive scan against one URL).
#[must_use]
pub fn query_params_of(url: &str) -> Vec<String> {
    Url::parse(url)
        .map(|parsed| {
            parsed
                .query_pairs()
                .map(|(name, _)| name.into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(path: &str, headers: &[(&str, &str)], body: &[u8]) -> RawRequest {
        RawRequest {
            method: "GET".into(),
            path: path.into(),
            version: "HTTP/1.1".into(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.to_vec(),
            use_tls: true,
        }
    }

    #[test]
    fn extracts_query_params_excluding_value() {
        let req = request_with(
            "/search?q=test&page=2",
            &[("Host", "x"), ("X-Custom", "1")],
            b"",
        );
        let points = extract(&req);
        assert!(points.contains(&InjectionPoint::Query("q".to_string())));
        assert!(points.contains(&InjectionPoint::Query("page".to_string())));
    }

    #[test]
    fn excludes_host_and_content_length_headers() {
        let req = request_with("/", &[("Host", "x"), ("Content-Length", "0")], b"");
        let points = extract(&req);
        assert!(!points.iter().any(|p| p.label() == "header:Host"));
        assert!(!points.iter().any(|p| p.label() == "header:Content-Length"));
    }

    #[test]
    fn extracts_cookies_separately_from_the_cookie_header() {
        let req = request_with(
            "/",
            &[("Host", "x"), ("Cookie", "session=abc; theme=dark")],
            b"",
        );
        let points = extract(&req);
        assert!(points.contains(&InjectionPoint::Cookie("session".to_string())));
        assert!(points.contains(&InjectionPoint::Cookie("theme".to_string())));
        assert!(!points.iter().any(|p| matches!(p, InjectionPoint::Header(n) if n == "Cookie")));
    }

    #[test]
    fn extracts_json_body_fields() {
        let req = request_with(
            "/",
            &[("Host", "x"), ("Content-Type", "application/json")],
            br#"{"username":"alice","note":"hi"}"#,
        );
        let points = extract(&req);
        assert!(points.contains(&InjectionPoint::JsonField("username".to_string())));
        assert!(points.contains(&InjectionPoint::JsonField("note".to_string())));
    }

    #[test]
    fn extracts_form_encoded_body_fields() {
        let req = request_with(
            "/",
            &[
                ("Host", "x"),
                ("Content-Type", "application/x-www-form-urlencoded"),
            ],
            b"user=admin&pass=secret",
        );
        let points = extract(&req);
        assert!(points.contains(&InjectionPoint::FormField("user".to_string())));
        assert!(points.contains(&InjectionPoint::FormField("pass".to_string())));
    }
}
