//! Domain model for notes, users and mentor chat.
//!
//! # Responsibility
//! - Define the data structures shared by router handlers, services and
//!   the mentor client.
//!
//! # Invariants
//! - Notes are always owned by exactly one user (`Note::user_id`).
//! - Chat messages are transient and never persisted.

pub mod chat;
pub mod note;
pub mod user;
