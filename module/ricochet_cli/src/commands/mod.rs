//! One module per CLI subcommand.

pub mod active;
pub mod findings;
pub mod inject;
pub mod interactsh;
pub mod listen;
pub mod passive;
pub mod report;
pub mod suggest;
pub mod support;
