//! Shared types and error taxonomy for Ricochet's correlation engine.
//!
//! This crate provides the foundational data model used across every Ricochet
//! module: [`Token`], [`Injection`], [`Callback`], [`Finding`], and the
//! [`Severity`] they derive. Nothing here talks to a database or a socket —
//! that's `ricochet_store` and `ricochet_listener`'s job.

pub mod error;
pub mod severity;
pub mod token;

pub use error::{Result, RicochetError};
pub use severity::Severity;
pub use token::{Token, TOKEN_LEN};

use serde::{Deserialize, Serialize};

/// A single recorded attempt to deposit a payload at a specific target/parameter.
///
/// Immutable once constructed — the injection's fields describe exactly what was
/// sent, not what may be inferred later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    /// Correlation token embedded in `payload`.
    pub token: Token,
    /// The full target URL the request was sent to.
    pub target_url: String,
    /// Name of the parameter/header/cookie/json-field that carried the payload.
    pub parameter: String,
    /// The payload after `{{CALLBACK}}` substitution.
    pub payload: String,
    /// Free-form context tag (e.g. `xss:html`, `sqli:mssql`) driving severity.
    pub context: String,
    /// Seconds since the Unix epoch, double precision.
    pub injected_at: f64,
}

/// An inbound HTTP request or DNS query observed by a callback listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callback {
    /// Autoincrement primary key assigned by the store.
    pub id: i64,
    /// Token extracted from the inbound interaction.
    pub token: Token,
    /// Source address of the interaction (IP, no port).
    pub source_ip: String,
    /// Full request path (HTTP) or `DNS:<qname>` (DNS).
    pub request_path: String,
    /// Serialized header/metadata mapping (JSON object as text).
    pub headers: String,
    /// Raw body bytes, if any were present.
    pub body: Option<Vec<u8>>,
    /// Seconds since the Unix epoch, double precision.
    pub received_at: f64,
    /// Best-effort structured metadata extracted by the listener (JSON text).
    ///
    /// Populated by the HTTP listener when a callback carries exfiltrated
    /// DOM/cookie data appended after the token; `None` for plain pings and
    /// for every DNS callback.
    pub metadata: Option<String>,
}

/// A materialized join of one [`Injection`] with one [`Callback`] on token.
///
/// Never stored — always computed from the injection's context at query
/// time. See `ricochet_store::findings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// The injection side of the join.
    pub injection: Injection,
    /// The callback side of the join.
    pub callback: Callback,
    /// `callback.received_at - injection.injected_at`, not clamped to zero.
    pub delay_seconds: f64,
    /// Derived purely from `injection.context`.
    pub severity: Severity,
}

impl Finding {
    /// Materializes a `Finding` from its two joined rows.
    #[must_use]
    pub fn new(injection: Injection, callback: Callback) -> Self {
        let delay_seconds = callback.received_at - injection.injected_at;
        let severity = Severity::from_context(&injection.context);
        Self {
            injection,
            callback,
            delay_seconds,
            severity,
        }
    }
}
