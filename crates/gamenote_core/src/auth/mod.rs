//! Identity collaborator: sign-up, sign-in, session and auth-state events.
//!
//! # Responsibility
//! - Define the identity interface consumed by the router shell.
//! - Translate provider error codes into user-facing (pt-BR) messages.
//! - Provide a local provider over pluggable account storage.
//!
//! # Invariants
//! - Auth-state listeners fire on every session change and once on
//!   subscription with the current state.
//! - Passwords are never stored or logged in clear text.

use crate::listeners::SubscriptionId;
use crate::model::user::UserRef;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod local;
mod store;

pub use local::{InMemoryIdentityProvider, LocalIdentityProvider, SqliteIdentityProvider};
pub use store::{AccountRecord, AccountStore, InMemoryAccountStore, SqliteAccountStore};

/// Callback invoked with the new session state.
pub type AuthListener = Box<dyn Fn(&Option<UserRef>)>;

/// Identity provider interface.
pub trait IdentityProvider {
    /// Creates an account and signs it in.
    fn sign_up(&mut self, email: &str, password: &str) -> Result<UserRef, AuthError>;
    fn sign_in(&mut self, email: &str, password: &str) -> Result<UserRef, AuthError>;
    fn sign_out(&mut self);
    /// Registers `listener`; it is called immediately with the current state.
    fn subscribe(&mut self, listener: AuthListener) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
    fn current_user(&self) -> Option<&UserRef>;
}

/// Provider error codes understood by the translator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailAlreadyInUse,
    InvalidEmail,
    OperationNotAllowed,
    WeakPassword,
    UserDisabled,
    UserNotFound,
    WrongPassword,
    InvalidCredential,
    TooManyRequests,
    Unknown(String),
}

impl AuthErrorCode {
    /// Parses a provider code, with or without the `auth/` prefix.
    pub fn from_code(code: &str) -> Self {
        let trimmed = code.trim();
        let bare = trimmed.strip_prefix("auth/").unwrap_or(trimmed);
        match bare {
            "email-already-in-use" => Self::EmailAlreadyInUse,
            "invalid-email" => Self::InvalidEmail,
            "operation-not-allowed" => Self::OperationNotAllowed,
            "weak-password" => Self::WeakPassword,
            "user-disabled" => Self::UserDisabled,
            "user-not-found" => Self::UserNotFound,
            "wrong-password" => Self::WrongPassword,
            "invalid-credential" => Self::InvalidCredential,
            "too-many-requests" => Self::TooManyRequests,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::InvalidEmail => "auth/invalid-email",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::WeakPassword => "auth/weak-password",
            Self::UserDisabled => "auth/user-disabled",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::TooManyRequests => "auth/too-many-requests",
            Self::Unknown(code) => code.as_str(),
        }
    }

    /// User-facing message shown next to the auth form.
    pub fn localized_message(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => "Este email já está em uso.",
            Self::InvalidEmail => "Email inválido.",
            Self::OperationNotAllowed => "Operação não permitida.",
            Self::WeakPassword => "A senha deve ter pelo menos 6 caracteres.",
            Self::UserDisabled => "Esta conta foi desativada.",
            Self::UserNotFound => "Usuário não encontrado.",
            Self::WrongPassword => "Senha incorreta.",
            Self::InvalidCredential => "Email ou senha inválidos.",
            Self::TooManyRequests => "Muitas tentativas. Tente novamente mais tarde.",
            Self::Unknown(_) => "Ocorreu um erro. Tente novamente.",
        }
    }
}

/// Error returned by identity operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthError {
    pub code: AuthErrorCode,
}

impl AuthError {
    pub fn new(code: AuthErrorCode) -> Self {
        Self { code }
    }

    pub fn localized_message(&self) -> &'static str {
        self.code.localized_message()
    }
}

impl From<AuthErrorCode> for AuthError {
    fn from(value: AuthErrorCode) -> Self {
        Self::new(value)
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.localized_message(), self.code.as_code())
    }
}

impl Error for AuthError {}

/// Translates a raw provider code into its localized message.
pub fn localized_auth_message(code: &str) -> &'static str {
    AuthErrorCode::from_code(code).localized_message()
}

#[cfg(test)]
mod tests {
    use super::{localized_auth_message, AuthErrorCode};

    #[test]
    fn known_codes_round_trip_with_and_without_prefix() {
        assert_eq!(
            AuthErrorCode::from_code("auth/weak-password"),
            AuthErrorCode::WeakPassword
        );
        assert_eq!(
            AuthErrorCode::from_code("user-not-found"),
            AuthErrorCode::UserNotFound
        );
        assert_eq!(
            AuthErrorCode::TooManyRequests.as_code(),
            "auth/too-many-requests"
        );
    }

    #[test]
    fn unknown_codes_map_to_generic_message() {
        assert_eq!(
            localized_auth_message("auth/quota-exceeded"),
            "Ocorreu um erro. Tente novamente."
        );
        assert_eq!(
            localized_auth_message("auth/invalid-credential"),
            "Email ou senha inválidos."
        );
    }
}
