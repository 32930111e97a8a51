use gamenote_core::auth::{
    AuthErrorCode, IdentityProvider, InMemoryIdentityProvider, SqliteAccountStore,
    SqliteIdentityProvider,
};
use gamenote_core::db::open_db_in_memory;
use gamenote_core::UserRef;
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::rc::Rc;

fn recorder() -> (Rc<RefCell<Vec<Option<String>>>>, Box<dyn Fn(&Option<UserRef>)>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let listener: Box<dyn Fn(&Option<UserRef>)> = Box::new(move |user: &Option<UserRef>| {
        sink.borrow_mut()
            .push(user.as_ref().map(|user| user.email.clone()));
    });
    (seen, listener)
}

#[test]
fn sign_up_signs_in_and_notifies_listeners() {
    let mut identity = InMemoryIdentityProvider::in_memory();
    let (seen, listener) = recorder();
    identity.subscribe(listener);

    let user = identity.sign_up("dev@studio.io", "secret1").unwrap();
    assert_eq!(identity.current_user(), Some(&user));

    identity.sign_out();
    assert!(identity.current_user().is_none());

    assert_eq!(
        *seen.borrow(),
        vec![None, Some("dev@studio.io".to_string()), None]
    );
}

#[test]
fn unsubscribed_listener_stops_receiving_events() {
    let mut identity = InMemoryIdentityProvider::in_memory();
    let (seen, listener) = recorder();
    let id = identity.subscribe(listener);
    assert!(identity.unsubscribe(id));
    assert!(!identity.unsubscribe(id));

    identity.sign_up("dev@studio.io", "secret1").unwrap();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn sign_up_validation_errors_use_provider_codes() {
    let mut identity = InMemoryIdentityProvider::in_memory();

    let err = identity.sign_up("not-an-email", "secret1").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::InvalidEmail);

    let err = identity.sign_up("dev@studio.io", "12345").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::WeakPassword);
    assert_eq!(
        err.localized_message(),
        "A senha deve ter pelo menos 6 caracteres."
    );

    identity.sign_up("dev@studio.io", "secret1").unwrap();
    let err = identity.sign_up("DEV@studio.io", "secret2").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::EmailAlreadyInUse);
}

#[test]
fn sign_in_checks_credentials() {
    let mut identity = InMemoryIdentityProvider::in_memory();
    let created = identity.sign_up("dev@studio.io", "secret1").unwrap();
    identity.sign_out();

    let err = identity.sign_in("ghost@studio.io", "secret1").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::UserNotFound);
    let err = identity.sign_in("dev@studio.io", "wrong-pass").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::WrongPassword);
    assert!(identity.current_user().is_none());

    let user = identity.sign_in(" dev@studio.io ", "secret1").unwrap();
    assert_eq!(user, created);
}

#[test]
fn repeated_wrong_passwords_lock_the_email() {
    let mut identity = InMemoryIdentityProvider::in_memory();
    identity.sign_up("dev@studio.io", "secret1").unwrap();
    identity.sign_out();

    for _ in 0..5 {
        let err = identity.sign_in("dev@studio.io", "nope-nope").unwrap_err();
        assert_eq!(err.code, AuthErrorCode::WrongPassword);
    }
    let err = identity.sign_in("dev@studio.io", "secret1").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::TooManyRequests);
    assert_eq!(
        err.localized_message(),
        "Muitas tentativas. Tente novamente mais tarde."
    );
}

#[test]
fn sqlite_accounts_survive_a_new_provider() {
    let conn = open_db_in_memory().unwrap();
    let uid = {
        let mut identity = SqliteIdentityProvider::new(SqliteAccountStore::new(&conn));
        identity.sign_up("dev@studio.io", "secret1").unwrap().uid
    };

    let mut identity = SqliteIdentityProvider::new(SqliteAccountStore::new(&conn));
    assert!(identity.current_user().is_none());
    let user = identity.sign_in("Dev@Studio.io", "secret1").unwrap();
    assert_eq!(user.uid, uid);

    let stored: String = conn
        .query_row(
            "SELECT password_digest FROM accounts WHERE uid = ?1;",
            [uid.as_str()],
            |row| row.get(0),
        )
        .unwrap();
    assert_ne!(stored, "secret1");
    assert_eq!(stored.len(), 64);
}

#[test]
fn stored_digest_is_a_stretched_hash() {
    let conn = open_db_in_memory().unwrap();
    let mut identity = SqliteIdentityProvider::new(SqliteAccountStore::new(&conn));
    identity.sign_up("dev@studio.io", "secret1").unwrap();

    let (salt, stored): (String, String) = conn
        .query_row(
            "SELECT password_salt, password_digest FROM accounts;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    let plain = Sha256::digest(format!("{salt}:secret1").as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    let unsalted = Sha256::digest(b"secret1")
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();

    assert_ne!(stored, plain);
    assert_ne!(stored, unsalted);
}

#[test]
fn lockout_is_scoped_to_one_provider_instance() {
    let conn = open_db_in_memory().unwrap();
    {
        let mut identity = SqliteIdentityProvider::new(SqliteAccountStore::new(&conn));
        identity.sign_up("dev@studio.io", "secret1").unwrap();
        identity.sign_out();
        for _ in 0..5 {
            identity.sign_in("dev@studio.io", "nope-nope").unwrap_err();
        }
        let err = identity.sign_in("dev@studio.io", "secret1").unwrap_err();
        assert_eq!(err.code, AuthErrorCode::TooManyRequests);
    }

    let mut fresh = SqliteIdentityProvider::new(SqliteAccountStore::new(&conn));
    assert!(fresh.sign_in("dev@studio.io", "secret1").is_ok());
}

#[test]
fn disabled_accounts_cannot_sign_in() {
    let conn = open_db_in_memory().unwrap();
    let mut identity = SqliteIdentityProvider::new(SqliteAccountStore::new(&conn));
    identity.sign_up("dev@studio.io", "secret1").unwrap();
    identity.sign_out();
    conn.execute("UPDATE accounts SET disabled = 1;", []).unwrap();

    let err = identity.sign_in("dev@studio.io", "secret1").unwrap_err();
    assert_eq!(err.code, AuthErrorCode::UserDisabled);
    assert_eq!(err.localized_message(), "Esta conta foi desativada.");
}
