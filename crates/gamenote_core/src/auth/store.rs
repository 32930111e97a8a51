//! Account storage behind the local identity provider.

use crate::repo::RepoResult;
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

/// Stored account. `password_digest` is hex SHA-256 over salt and password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub uid: String,
    pub email: String,
    pub password_salt: String,
    pub password_digest: String,
    pub disabled: bool,
}

/// Account persistence used by [`super::LocalIdentityProvider`].
///
/// Emails are compared case-insensitively.
pub trait AccountStore {
    fn insert(&mut self, account: &AccountRecord) -> RepoResult<()>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<AccountRecord>>;
}

/// Process-local account store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: HashMap<String, AccountRecord>,
}

impl AccountStore for InMemoryAccountStore {
    fn insert(&mut self, account: &AccountRecord) -> RepoResult<()> {
        self.accounts
            .insert(account.email.to_lowercase(), account.clone());
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<AccountRecord>> {
        Ok(self.accounts.get(&email.to_lowercase()).cloned())
    }
}

/// SQLite-backed account store over the `accounts` table.
pub struct SqliteAccountStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AccountStore for SqliteAccountStore<'_> {
    fn insert(&mut self, account: &AccountRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO accounts (uid, email, password_salt, password_digest, disabled)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                account.uid.as_str(),
                account.email.as_str(),
                account.password_salt.as_str(),
                account.password_digest.as_str(),
                i64::from(account.disabled),
            ],
        )?;
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<AccountRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, email, password_salt, password_digest, disabled
             FROM accounts
             WHERE email = ?1 COLLATE NOCASE;",
        )?;
        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }
        Ok(None)
    }
}

fn parse_account_row(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    let disabled: i64 = row.get("disabled")?;
    Ok(AccountRecord {
        uid: row.get("uid")?,
        email: row.get("email")?,
        password_salt: row.get("password_salt")?,
        password_digest: row.get("password_digest")?,
        disabled: disabled != 0,
    })
}
