//! # `ricochet_store`
//!
//! Durable storage of Injections and Callbacks with referential integrity
//! and the correlation join that produces [`Finding`](ricochet_types::Finding)
//! records.
//!
//! ## Architecture
//!
//! Backed by a single-file `SQLite` database via `sqlx`, with foreign-key
//! enforcement turned on for every connection in the pool. Two tables:
//! `injections` and `callbacks`, joined on `token`. Migrations are embedded
//! `.sql` files applied idempotently behind guard tables, following the same
//! pattern the workspace already uses for its own schema evolution.
//!
//! ## Known pitfalls
//!
//! **Never reuse a connection pool across `sqlite::memory:` URLs in tests.**
//! Each in-memory database is private to the connection that created it;
//! `ricochet_test_support` hands out file-backed temp databases for exactly
//! this reason — a `:memory:` pool with `max_connections(1)` would also work,
//! but a pool of temp files matches how the CLI actually opens the store.

#![warn(missing_docs)]

pub mod error;
pub mod findings;
pub mod migrations;
pub mod mint;
pub mod store;

pub use error::{Result, StoreError};
pub use mint::mint_token;
pub use store::Store;
