//! Parsing of Burp Suite's "raw request" export format.

use ricochet_types::RicochetError;

/// A parsed raw HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    /// HTTP method (`GET`, `POST`, ...), as written in the request line.
    pub method: String,
    /// Request-target as written in the request line (path + optional query).
    pub path: String,
    /// HTTP version token (e.g. `HTTP/1.1`), as written in the request line.
    pub version: String,
    /// Headers in on-wire order. Names keep their original casing; lookups
    /// via [`RawRequest::header`] are case-insensitive.
    pub headers: Vec<(String, String)>,
    /// Raw body bytes, empty if the request has none.
    pub body: Vec<u8>,
    /// Whether to target `https://` (`true`, the default) or `http://`.
    pub use_tls: bool,
}

impl RawRequest {
    /// Parses `text` as a Burp-style raw request.
    ///
    /// Tolerant of LF-only line endings (Burp's own export is CRLF, but
    /// files edited on Unix tooling often lose the `\r`) and of a blank
    /// final line before the body. The `Host` header is mandatory — without
    /// it there is no way to resolve a complete target URL.
    ///
    /// # Errors
    ///
    /// Returns [`RicochetError::RequestParse`] if the request line is
    /// missing or malformed, or if no `Host` header is present.
    pub fn parse(text: &[u8], use_tls: bool) -> Result<Self, RicochetError> {
        let text = String::from_utf8_lossy(text);
        let normalized = text.replace("\r\n", "\n");
        let mut lines = normalized.split('\n');

        let request_line = lines.next().ok_or_else(|| RicochetError::RequestParse {
            context: "request line".to_string(),
            reason: "empty request".to_string(),
        })?;

        let mut parts = request_line.split_whitespace();
        let method = parts
            .next()
            .ok_or_else(|| RicochetError::RequestParse {
                context: "request line".to_string(),
                reason: "missing method".to_string(),
            })?
            .to_string();
        let path = parts
            .next()
            .ok_or_else(|| RicochetError::RequestParse {
                context: "request line".to_string(),
                reason: "missing path".to_string(),
            })?
            .to_string();
        let version = parts.next().unwrap_or("HTTP/1.1").to_string();

        let mut headers = Vec::new();
        let mut body_start = normalized.len();
        let mut consumed = request_line.len() + 1;

        for line in &mut lines {
            if line.is_empty() {
                body_start = consumed + 1;
                break;
            }
            let (name, value) = line.split_once(':').ok_or_else(|| RicochetError::RequestParse {
                context: line.to_string(),
                reason: "header line missing ':'".to_string(),
            })?;
            headers.push((name.trim().to_string(), value.trim().to_string()));
            consumed += line.len() + 1;
        }

        let body = normalized
            .get(body_start.min(normalized.len())..)
            .unwrap_or_default()
            .as_bytes()
            .to_vec();

        let request = Self {
            method,
            path,
            version,
            headers,
            body,
            use_tls,
        };

        if request.header("host").is_none() {
            return Err(RicochetError::RequestParse {
                context: "headers".to_string(),
                reason: "missing mandatory Host header".to_string(),
            });
        }

        Ok(request)
    }

    /// Looks up a header by case-insensitive name, returning the first
    /// match in wire order.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets (replacing any existing occurrence) a header by case-insensitive
    /// name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            entry.1 = value.into();
        } else {
            self.headers.push((name.to_string(), value.into()));
        }
    }

    /// Reconstructs the full target URL from `Host` and `path`.
    #[must_use]
    pub fn target_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        let host = self.header("host").unwrap_or("");
        format!("{scheme}://{host}{}", self.path)
    }

    /// Re-serializes this request back into raw bytes (CRLF line endings),
    /// recomputing `Content-Length` if a body is present.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} {}\r\n", self.method, self.path, self.version);
        let needs_length = !self.body.is_empty() && self.header("content-length").is_none();

        for (name, value) in &self.headers {
            if needs_length && name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        if needs_length {
            out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        out.push_str("\r\n");

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_get() {
        let raw = b"GET /search?q=test HTTP/1.1\r\nHost: victim.example\r\nUser-Agent: x\r\n\r\n";
        let req = RawRequest::parse(raw, true).unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/search?q=test");
        assert_eq!(req.header("host"), Some("victim.example"));
        assert_eq!(req.target_url(), "https://victim.example/search?q=test");
    }

    #[test]
    fn tolerates_lf_only_line_endings() {
        let raw = b"POST /login HTTP/1.1\nHost: victim.example\nContent-Length: 9\n\nuser=test";
        let req = RawRequest::parse(raw, false).unwrap();
        assert_eq!(req.body, b"user=test");
        assert_eq!(req.target_url(), "http://victim.example/login");
    }

    #[test]
    fn rejects_request_without_host_header() {
        let raw = b"GET / HTTP/1.1\r\nUser-Agent: x\r\n\r\n";
        let err = RawRequest::parse(raw, true).unwrap_err();
        assert!(matches!(err, RicochetError::RequestParse { .. }));
    }

    #[test]
    fn round_trip_recomputes_content_length_after_body_edit() {
        let raw = b"POST /a HTTP/1.1\r\nHost: x\r\nContent-Length: 3\r\n\r\nabc";
        let mut req = RawRequest::parse(raw, true).unwrap();
        req.body = b"abcdef".to_vec();
        req.set_header("content-length", req.body.len().to_string());
        let serialized = req.to_bytes();
        let text = String::from_utf8(serialized).unwrap();
        assert!(text.contains("Content-Length: 6"));
        assert!(text.ends_with("abcdef"));
    }
}
