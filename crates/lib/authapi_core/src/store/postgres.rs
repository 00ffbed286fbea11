//! PostgreSQL account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::error;
use uuid::Uuid;

use super::AccountStore;
use crate::auth::AuthError;
use crate::models::auth::Account;

type AccountRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

/// [`AccountStore`] backed by the `accounts` table.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate a write error: unique violations become `AlreadyExists`,
/// everything else is logged and passed through as a database error.
fn map_write_error(op: &'static str, e: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        return AuthError::AlreadyExists;
    }
    error!(error = %e, op, "account store write failed");
    AuthError::Db(e)
}

#[async_trait]
impl AccountStore for PgAccountStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, AuthError> {
        self.pool.begin().await.map_err(|e| {
            error!(error = %e, "failed to begin transaction");
            AuthError::Db(e)
        })
    }

    async fn save(&self, tx: &mut Self::Tx, account: &Account) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO accounts (user_id, email, password, last_login, created) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.user_id())
        .bind(account.email())
        .bind(account.password_hash())
        .bind(account.last_login())
        .bind(account.created())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error("save", e))?;
        Ok(())
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), AuthError> {
        tx.commit().await.map_err(|e| map_write_error("commit", e))
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, AuthError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT user_id, email, password, last_login, created \
             FROM accounts WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "account lookup failed");
            AuthError::Db(e)
        })?;

        match row {
            None => Err(AuthError::NotFound),
            Some((user_id, email, password_hash, last_login, created)) => Ok(
                Account::from_parts(user_id, email, password_hash, last_login, created),
            ),
        }
    }
}
