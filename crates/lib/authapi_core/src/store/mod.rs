//! Account persistence boundary.
//!
//! [`AccountStore`] is the capability the service depends on. It owns the
//! transaction boundary and the translation of backend errors into
//! [`AuthError`] domain outcomes.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::auth::AuthError;
use crate::models::auth::Account;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

/// Transactional account storage.
///
/// A transaction obtained from [`begin`](AccountStore::begin) is rolled back
/// when dropped without being passed to [`commit`](AccountStore::commit).
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Scoped unit-of-work. Dropping it without commit discards its writes.
    type Tx: Send;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Tx, AuthError>;

    /// Insert a new account inside `tx`.
    ///
    /// Returns [`AuthError::AlreadyExists`] when the email is taken.
    async fn save(&self, tx: &mut Self::Tx, account: &Account) -> Result<(), AuthError>;

    /// Make the transaction's writes durable.
    async fn commit(&self, tx: Self::Tx) -> Result<(), AuthError>;

    /// Look up an account by exact email.
    ///
    /// Returns [`AuthError::NotFound`] when no account matches.
    async fn find_by_email(&self, email: &str) -> Result<Account, AuthError>;
}
