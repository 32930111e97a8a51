//! Local identity provider over an [`AccountStore`].
//!
//! Stands in for the managed identity backend: validates input the same way,
//! reports the same error codes, and keeps the session in memory.

use super::store::{AccountRecord, AccountStore, InMemoryAccountStore, SqliteAccountStore};
use super::{AuthError, AuthErrorCode, AuthListener, IdentityProvider};
use crate::listeners::{Listeners, SubscriptionId};
use crate::model::user::UserRef;
use log::{info, warn};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::collections::HashMap;
use uuid::Uuid;

/// Minimum accepted password length.
pub const MIN_PASSWORD_CHARS: usize = 6;
/// Consecutive failed sign-ins per email before `too-many-requests`.
///
/// Counted per provider instance and never persisted: a new provider over the
/// same store starts with a clean slate.
pub const MAX_FAILED_SIGN_INS: u32 = 5;
/// PBKDF2-HMAC-SHA256 iterations for stored password digests.
pub const PASSWORD_ROUNDS: u32 = 100_000;
const DIGEST_BYTES: usize = 32;

pub type SqliteIdentityProvider<'conn> = LocalIdentityProvider<SqliteAccountStore<'conn>>;
pub type InMemoryIdentityProvider = LocalIdentityProvider<InMemoryAccountStore>;

/// Identity provider keeping the session in memory.
pub struct LocalIdentityProvider<S: AccountStore> {
    store: S,
    current: Option<UserRef>,
    listeners: Listeners<Option<UserRef>>,
    failed_sign_ins: HashMap<String, u32>,
}

impl<S: AccountStore> LocalIdentityProvider<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
            listeners: Listeners::new(),
            failed_sign_ins: HashMap::new(),
        }
    }

    fn set_session(&mut self, user: Option<UserRef>) {
        self.current = user;
        self.listeners.notify(&self.current);
    }

    fn record_failure(&mut self, email_key: &str) {
        *self
            .failed_sign_ins
            .entry(email_key.to_string())
            .or_insert(0) += 1;
    }
}

impl InMemoryIdentityProvider {
    pub fn in_memory() -> Self {
        Self::new(InMemoryAccountStore::default())
    }
}

impl<S: AccountStore> IdentityProvider for LocalIdentityProvider<S> {
    fn sign_up(&mut self, email: &str, password: &str) -> Result<UserRef, AuthError> {
        let email = validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthErrorCode::WeakPassword.into());
        }
        if self.store.find_by_email(&email).map_err(storage_error)?.is_some() {
            return Err(AuthErrorCode::EmailAlreadyInUse.into());
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = AccountRecord {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            password_digest: password_digest(&salt, password),
            password_salt: salt,
            disabled: false,
        };
        self.store.insert(&account).map_err(storage_error)?;
        info!("event=auth_sign_up module=auth status=ok uid={}", account.uid);

        let user = UserRef::new(account.uid, account.email);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<UserRef, AuthError> {
        let email = validate_email(email)?;
        let email_key = email.to_lowercase();
        if self.failed_sign_ins.get(&email_key).copied().unwrap_or(0) >= MAX_FAILED_SIGN_INS {
            warn!("event=auth_sign_in module=auth status=error error_code=too_many_requests");
            return Err(AuthErrorCode::TooManyRequests.into());
        }

        let Some(account) = self.store.find_by_email(&email).map_err(storage_error)? else {
            return Err(AuthErrorCode::UserNotFound.into());
        };
        if account.disabled {
            return Err(AuthErrorCode::UserDisabled.into());
        }
        let candidate = password_digest(&account.password_salt, password);
        if !constant_time_eq(candidate.as_bytes(), account.password_digest.as_bytes()) {
            self.record_failure(&email_key);
            warn!("event=auth_sign_in module=auth status=error error_code=wrong_password");
            return Err(AuthErrorCode::WrongPassword.into());
        }

        self.failed_sign_ins.remove(&email_key);
        info!("event=auth_sign_in module=auth status=ok uid={}", account.uid);
        let user = UserRef::new(account.uid, account.email);
        self.set_session(Some(user.clone()));
        Ok(user)
    }

    fn sign_out(&mut self) {
        if self.current.is_some() {
            info!("event=auth_sign_out module=auth status=ok");
        }
        self.set_session(None);
    }

    fn subscribe(&mut self, listener: AuthListener) -> SubscriptionId {
        listener(&self.current);
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    fn current_user(&self) -> Option<&UserRef> {
        self.current.as_ref()
    }
}

fn validate_email(email: &str) -> Result<String, AuthError> {
    let trimmed = email.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !trimmed.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(AuthErrorCode::InvalidEmail.into())
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut derived = [0u8; DIGEST_BYTES];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PASSWORD_ROUNDS,
        &mut derived,
    );
    derived.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

fn storage_error(err: crate::repo::RepoError) -> AuthError {
    warn!("event=auth_storage module=auth status=error error={err}");
    AuthError::new(AuthErrorCode::Unknown("storage-failure".to_string()))
}

#[cfg(test)]
mod tests {
    use super::{constant_time_eq, password_digest, validate_email};

    #[test]
    fn digest_depends_on_salt() {
        assert_ne!(password_digest("a", "secret"), password_digest("b", "secret"));
        assert_eq!(password_digest("a", "secret"), password_digest("a", "secret"));
        assert_eq!(password_digest("a", "secret").len(), 64);
    }

    #[test]
    fn constant_time_eq_compares_whole_slices() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    #[test]
    fn email_validation_requires_local_and_domain_parts() {
        assert!(validate_email(" dev@studio.io ").is_ok());
        assert!(validate_email("dev@").is_err());
        assert!(validate_email("@studio.io").is_err());
        assert!(validate_email("dev studio@io").is_err());
        assert!(validate_email("plain").is_err());
    }
}
