//! SQLite database operations for authentication

use rusqlite::{params, OptionalExtension, Row};

use super::models::{Account, Role};
use crate::db::{Database, StoreError, StoreResult};

/// Persistence for accounts. Each call is atomic on a single row.
pub trait CredentialStore: Send + Sync {
    /// Fails with [`StoreError::DuplicateEmail`] when the email is taken.
    fn create(&self, account: &Account) -> StoreResult<()>;

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Mark the email verified. Returns the number of rows changed.
    fn set_verified(&self, email: &str) -> StoreResult<usize>;

    /// Replace the password hash. Returns the number of rows changed.
    fn set_password(&self, email: &str, password_hash: &str) -> StoreResult<usize>;

    /// Remember the latest verification token sent. Returns rows changed.
    fn set_verification_token(&self, email: &str, token: &str) -> StoreResult<usize>;
}

#[derive(Clone)]
pub struct SqliteCredentialStore {
    db: Database,
}

impl SqliteCredentialStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

const ACCOUNT_COLUMNS: &str =
    "id, name, email, password_hash, role, email_verified, verification_token, created_at, updated_at";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let role: String = row.get(4)?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role).unwrap_or(Role::User),
        email_verified: row.get::<_, i32>(5)? != 0,
        verification_token: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl CredentialStore for SqliteCredentialStore {
    fn create(&self, account: &Account) -> StoreResult<()> {
        let result = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO accounts (id, name, email, password_hash, role, email_verified,
                                       verification_token, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    account.id,
                    account.name,
                    account.email,
                    account.password_hash,
                    account.role.as_str(),
                    account.email_verified as i32,
                    account.verification_token,
                    account.created_at,
                    account.updated_at,
                ],
            )
        });

        match result {
            Ok(_) => Ok(()),
            Err(StoreError::Sqlite(e)) if is_unique_violation(&e) => Err(StoreError::DuplicateEmail),
            Err(e) => Err(e),
        }
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {} FROM accounts WHERE email = ?1", ACCOUNT_COLUMNS),
                params![email],
                account_from_row,
            )
            .optional()
        })
    }

    fn set_verified(&self, email: &str) -> StoreResult<usize> {
        let now = chrono::Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET email_verified = 1, verification_token = NULL, updated_at = ?1
                 WHERE email = ?2",
                params![now, email],
            )
        })
    }

    fn set_password(&self, email: &str, password_hash: &str) -> StoreResult<usize> {
        let now = chrono::Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET password_hash = ?1, updated_at = ?2 WHERE email = ?3",
                params![password_hash, now, email],
            )
        })
    }

    fn set_verification_token(&self, email: &str, token: &str) -> StoreResult<usize> {
        let now = chrono::Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE accounts SET verification_token = ?1, updated_at = ?2 WHERE email = ?3",
                params![token, now, email],
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn store() -> SqliteCredentialStore {
        SqliteCredentialStore::new(Database::in_memory().unwrap())
    }

    fn account(id: &str, email: &str) -> Account {
        Account {
            id: id.to_string(),
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "hash123".to_string(),
            role: Role::User,
            email_verified: false,
            verification_token: Some("tok".to_string()),
            created_at: chrono::Utc::now().to_rfc3339(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_create_and_find_account() {
        let store = store();
        store.create(&account("acc_1", "test@example.com")).unwrap();

        let found = store.find_by_email("test@example.com").unwrap().unwrap();
        assert_eq!(found.id, "acc_1");
        assert_eq!(found.role, Role::User);
        assert!(!found.email_verified);
        assert_eq!(found.verification_token.as_deref(), Some("tok"));

        assert!(store.find_by_email("other@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_reported() {
        let store = store();
        store.create(&account("acc_1", "dup@example.com")).unwrap();

        assert_matches!(
            store.create(&account("acc_2", "dup@example.com")),
            Err(StoreError::DuplicateEmail)
        );
        let first = store.find_by_email("dup@example.com").unwrap().unwrap();
        assert_eq!(first.id, "acc_1");
    }

    #[test]
    fn test_set_verified_clears_token() {
        let store = store();
        store.create(&account("acc_1", "verify@example.com")).unwrap();

        assert_eq!(store.set_verified("verify@example.com").unwrap(), 1);
        let found = store.find_by_email("verify@example.com").unwrap().unwrap();
        assert!(found.email_verified);
        assert!(found.verification_token.is_none());
    }

    #[test]
    fn test_updates_report_rows_affected() {
        let store = store();
        store.create(&account("acc_1", "pw@example.com")).unwrap();

        assert_eq!(store.set_password("pw@example.com", "newhash").unwrap(), 1);
        assert_eq!(store.set_password("ghost@example.com", "newhash").unwrap(), 0);
        assert_eq!(store.set_verified("ghost@example.com").unwrap(), 0);

        let found = store.find_by_email("pw@example.com").unwrap().unwrap();
        assert_eq!(found.password_hash, "newhash");
    }
}
