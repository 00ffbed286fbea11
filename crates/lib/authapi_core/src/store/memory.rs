//! In-memory account store.
//!
//! Same contract as the PostgreSQL store, keyed by email. Writes are staged
//! in the transaction and only become visible on commit; a dropped
//! transaction discards them. Used by tests, including commit fault
//! injection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::AccountStore;
use crate::auth::AuthError;
use crate::models::auth::Account;

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    accounts: Arc<DashMap<String, Account>>,
    fail_next_commit: Arc<AtomicBool>,
}

/// Pending writes of one unit-of-work.
#[derive(Debug, Default)]
pub struct MemoryTx {
    staged: Vec<Account>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Whether a committed account has this email.
    pub fn contains_email(&self, email: &str) -> bool {
        self.accounts.contains_key(email)
    }

    /// Make the next commit fail after its writes were staged.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, AuthError> {
        Ok(MemoryTx::default())
    }

    async fn save(&self, tx: &mut Self::Tx, account: &Account) -> Result<(), AuthError> {
        let email = account.email();
        if self.accounts.contains_key(email) || tx.staged.iter().any(|a| a.email() == email) {
            return Err(AuthError::AlreadyExists);
        }
        tx.staged.push(account.clone());
        Ok(())
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), AuthError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            tracing::error!("injected commit failure");
            return Err(AuthError::Internal("commit failed".into()));
        }

        // First commit wins; a conflicting commit undoes its own inserts.
        let mut inserted: Vec<String> = Vec::with_capacity(tx.staged.len());
        let mut conflict = false;
        for account in tx.staged {
            let email = account.email().to_string();
            match self.accounts.entry(email.clone()) {
                Entry::Occupied(_) => {
                    conflict = true;
                    break;
                }
                Entry::Vacant(slot) => {
                    slot.insert(account);
                    inserted.push(email);
                }
            }
        }

        // Entry guards are released here; safe to touch the shards again.
        if conflict {
            for email in &inserted {
                self.accounts.remove(email);
            }
            return Err(AuthError::AlreadyExists);
        }
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, AuthError> {
        self.accounts
            .get(email)
            .map(|entry| entry.value().clone())
            .ok_or(AuthError::NotFound)
    }
}
