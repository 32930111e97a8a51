//! SQLite storage for notes and local accounts.
//!
//! # Responsibility
//! - Open connections configured for the note and account repositories.
//! - Bring the GameNote schema up to date and confirm its tables exist.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer build is refused, never downgraded.

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory, DbError, DbResult};
