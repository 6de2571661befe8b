//! Outbound networking: a shared rate limiter and the HTTP client the
//! injector and active probes send through.

#![warn(missing_docs)]

pub mod http_client;
pub mod rate_limiter;

pub use http_client::{ClientConfig, HttpClient, HttpResponse};
pub use rate_limiter::RateLimiter;
