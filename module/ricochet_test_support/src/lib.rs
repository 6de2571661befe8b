//! Test-only helpers shared across Ricochet's crates: temp-file-backed
//! stores and free-port discovery for listener integration tests.

pub mod builder;
pub mod error;
pub mod ports;

pub use builder::TestStore;
pub use error::{Result, TestSupportError};
pub use ports::{free_tcp_port, free_udp_port};
