//! Use-case services over the repository layer.
//!
//! # Responsibility
//! - Apply domain normalization before persistence.
//! - Keep router handlers and the CLI decoupled from storage details.

pub mod note_service;
