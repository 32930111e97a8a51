//! Authenticated user reference.

use serde::{Deserialize, Serialize};

/// Minimal identity handed out by the identity provider.
///
/// The router only checks presence; services use `uid` to scope storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub uid: String,
    pub email: String,
}

impl UserRef {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}
