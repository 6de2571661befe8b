//! CLI-level error handling: every failure mode converges on [`RicochetError`]
//! so `main` has one place to map an error onto an exit code.

pub use ricochet_types::{Result, RicochetError};
