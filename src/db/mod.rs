//! State store: the last announcement seen per Steam app.
//!
//! - `model`: rows returned by queries.
//! - `repo`: pool setup, migrations and the SQL for the `news` table.
//!
//! The pool holds a single connection, so every read and write goes through
//! one SQLite handle in order. Change detection relies on this to make its
//! lookup-compare-write transaction linearizable.

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::StateRecord;
