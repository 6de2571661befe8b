//! HTTP and DNS callback receivers for Ricochet's correlation engine.
//!
//! Both listeners share one contract: accept any interaction, try to pull a
//! 16-character lowercase-hex token out of it, hand it to the
//! [`Store`](ricochet_store::Store), and respond identically whether or not
//! the token matched an injection. Nothing here decides what an injection
//! looks like or sends one — that's `ricochet_inject`.

#![warn(missing_docs)]

pub mod dns;
pub mod error;
pub mod http;

pub use error::{ListenerError, Result};
