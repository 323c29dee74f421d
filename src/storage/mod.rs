//!  Storage is organized through the [store::Store] trait, realized by [sqlite::SqliteStore].
//!  The basic idea is:
//!   - There is a single database file holding projects and their work intervals.
//!   - Instants are stored as UTC milliseconds since the epoch.
//!   - At most one work interval may be open at any time, across all projects.

pub mod entities;
pub mod error;
pub mod sqlite;
pub mod store;
