//! Parses Burp-style raw HTTP request files and enumerates the positions in
//! them where a payload can be injected.
//!
//! Nothing here sends a request — that is `ricochet_net`'s job. This crate
//! only turns request text into a structured [`RawRequest`] and that
//! request into a list of [`InjectionPoint`]s.

pub mod request;
pub mod vectors;

pub use request::RawRequest;
pub use vectors::InjectionPoint;
