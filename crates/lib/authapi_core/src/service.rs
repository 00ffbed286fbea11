//! Account service: register/login flows over an [`AccountStore`].
//!
//! Every step up to the commit (hashing, transaction begin/save, lookup)
//! observes the caller's [`CancellationToken`]. A cancelled or failed
//! registration drops its transaction, which rolls it back. A commit, once
//! started, runs to completion: its outcome decides the result.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::auth::AuthError;
use crate::auth::password::{hash_password_async, verify_password_async};
use crate::auth::token::TokenProvider;
use crate::models::auth::{Account, AuthRequest};
use crate::store::AccountStore;

/// A signed token together with the account it was issued for.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub account: Account,
    pub token: String,
}

/// Orchestrates hashing, storage and token issuance.
#[derive(Debug)]
pub struct AccountService<S> {
    store: S,
    tokens: TokenProvider,
}

/// Race `fut` against cancellation; cancellation wins ties.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AuthError::Cancelled),
        res = fut => res,
    }
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S, tokens: TokenProvider) -> Self {
        Self { store, tokens }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Create an account and issue its first token.
    ///
    /// Exactly one account row exists afterwards on success and none on any
    /// error path.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn register(
        &self,
        req: &AuthRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthGrant, AuthError> {
        req.validate()?;

        let password_hash = cancellable(cancel, hash_password_async(req.password.clone())).await?;
        let account = Account::new(req.email.clone(), password_hash);

        let mut tx = cancellable(cancel, self.store.begin()).await?;
        cancellable(cancel, self.store.save(&mut tx, &account)).await?;
        if cancel.is_cancelled() {
            return Err(AuthError::Cancelled);
        }
        self.store.commit(tx).await?;

        // The account is durable from here on; cancellation no longer applies.
        let token = self.tokens.issue(account.user_id(), account.email())?;
        info!(user_id = %account.user_id(), "account registered");
        Ok(AuthGrant { account, token })
    }

    /// Authenticate with email + password and issue a token.
    ///
    /// Unknown email and wrong password are reported separately
    /// (`NotFound` / `InvalidPassword`). last-login is left untouched.
    #[instrument(skip_all, fields(email = %req.email))]
    pub async fn login(
        &self,
        req: &AuthRequest,
        cancel: &CancellationToken,
    ) -> Result<AuthGrant, AuthError> {
        req.validate()?;

        let account = cancellable(cancel, self.store.find_by_email(&req.email)).await?;

        let matches = cancellable(
            cancel,
            verify_password_async(req.password.clone(), account.password_hash().to_string()),
        )
        .await?;
        if !matches {
            warn!(user_id = %account.user_id(), "invalid password attempt");
            return Err(AuthError::InvalidPassword);
        }

        let token = self.tokens.issue(account.user_id(), account.email())?;
        debug!(user_id = %account.user_id(), "account logged in");
        Ok(AuthGrant { account, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{ISSUER, TOKEN_EXPIRY_SECS};
    use crate::store::MemoryAccountStore;
    use crate::store::memory::MemoryTx;
    use async_trait::async_trait;

    /// Store step after which [`CancellingStore`] fires the token.
    #[derive(Clone, Copy)]
    enum CancelAfter {
        Save,
        Commit,
    }

    /// Memory store that cancels the caller's token once a given step completes.
    struct CancellingStore {
        inner: MemoryAccountStore,
        cancel: CancellationToken,
        after: CancelAfter,
    }

    #[async_trait]
    impl AccountStore for CancellingStore {
        type Tx = MemoryTx;

        async fn begin(&self) -> Result<MemoryTx, AuthError> {
            self.inner.begin().await
        }

        async fn save(&self, tx: &mut MemoryTx, account: &Account) -> Result<(), AuthError> {
            self.inner.save(tx, account).await?;
            if let CancelAfter::Save = self.after {
                self.cancel.cancel();
            }
            Ok(())
        }

        async fn commit(&self, tx: MemoryTx) -> Result<(), AuthError> {
            self.inner.commit(tx).await?;
            if let CancelAfter::Commit = self.after {
                self.cancel.cancel();
            }
            Ok(())
        }

        async fn find_by_email(&self, email: &str) -> Result<Account, AuthError> {
            self.inner.find_by_email(email).await
        }
    }

    fn cancelling_service(
        after: CancelAfter,
    ) -> (
        AccountService<CancellingStore>,
        MemoryAccountStore,
        CancellationToken,
    ) {
        let inner = MemoryAccountStore::new();
        let cancel = CancellationToken::new();
        let store = CancellingStore {
            inner: inner.clone(),
            cancel: cancel.clone(),
            after,
        };
        let tokens = TokenProvider::new(SECRET).unwrap();
        (AccountService::new(store, tokens), inner, cancel)
    }

    const SECRET: &[u8] = b"test-secret";

    fn service() -> (AccountService<MemoryAccountStore>, MemoryAccountStore) {
        let store = MemoryAccountStore::new();
        let tokens = TokenProvider::new(SECRET).unwrap();
        (AccountService::new(store.clone(), tokens), store)
    }

    fn req(email: &str, password: &str) -> AuthRequest {
        AuthRequest::new(email, password)
    }

    #[tokio::test]
    async fn register_then_login_succeeds_with_distinct_tokens() {
        let (svc, _) = service();
        let cancel = CancellationToken::new();

        let registered = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap();
        assert_eq!(registered.account.email(), "a@x.com");
        assert!(!registered.token.is_empty());

        // iat has one-second resolution; make sure the second token differs.
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let logged_in = svc.login(&req("a@x.com", "pw1"), &cancel).await.unwrap();
        assert_eq!(logged_in.account.email(), "a@x.com");
        assert_eq!(logged_in.account.user_id(), registered.account.user_id());
        assert!(!logged_in.token.is_empty());
        assert_ne!(logged_in.token, registered.token);

        assert!(svc.tokens().verify(&registered.token).is_ok());
        assert!(svc.tokens().verify(&logged_in.token).is_ok());
    }

    #[tokio::test]
    async fn stored_password_is_hashed() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();
        svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap();

        let stored = store.find_by_email("a@x.com").await.unwrap();
        assert_ne!(stored.password_hash(), "pw1");
        assert!(stored.password_hash().starts_with("$2"));
    }

    #[tokio::test]
    async fn token_claims_describe_the_account() {
        let (svc, _) = service();
        let cancel = CancellationToken::new();
        let grant = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap();

        let claims = svc.tokens().verify(&grant.token).unwrap();
        assert_eq!(claims.user_id, grant.account.user_id());
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iss, ISSUER);
        assert_eq!(claims.exp - claims.iat, TOKEN_EXPIRY_SECS);
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_a_single_account() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();

        let first = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap();
        let err = svc.register(&req("a@x.com", "pw2"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists));

        assert_eq!(store.len(), 1);
        let stored = store.find_by_email("a@x.com").await.unwrap();
        assert_eq!(stored.user_id(), first.account.user_id());

        // The registered password still works, the rejected one does not.
        assert!(svc.login(&req("a@x.com", "pw1"), &cancel).await.is_ok());
        assert!(matches!(
            svc.login(&req("a@x.com", "pw2"), &cancel).await,
            Err(AuthError::InvalidPassword)
        ));
    }

    #[tokio::test]
    async fn concurrent_registration_of_same_email_has_one_winner() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();
        let a = req("a@x.com", "pw1");
        let b = req("a@x.com", "pw2");

        let (ra, rb) = tokio::join!(svc.register(&a, &cancel), svc.register(&b, &cancel));
        let results = [ra, rb];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(AuthError::AlreadyExists)))
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_and_store_unchanged() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();
        let grant = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap();

        let err = svc.login(&req("a@x.com", "wrong"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));

        assert_eq!(store.len(), 1);
        let stored = store.find_by_email("a@x.com").await.unwrap();
        assert_eq!(stored.last_login(), grant.account.last_login());
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let (svc, _) = service();
        let cancel = CancellationToken::new();
        let err = svc.login(&req("nobody@x.com", "pw"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn invalid_request_shape_is_a_validation_error() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();

        let err = svc.register(&req("not-an-email", "pw"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        let err = svc.register(&req("a@x.com", ""), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        let err = svc.login(&req("", "pw"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn passwords_differing_past_72_bytes_are_not_interchangeable() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();
        let prefix = "a".repeat(72);

        let err = svc
            .register(&req("a@x.com", &format!("{prefix}RIGHT")), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(store.is_empty());

        svc.register(&req("a@x.com", &prefix), &cancel).await.unwrap();
        let err = svc
            .login(&req("a@x.com", &format!("{prefix}WRONG")), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn failed_commit_leaves_no_account() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();
        store.fail_next_commit();

        let err = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap_err();
        assert!(!err.is_domain());
        assert!(store.is_empty());
        assert!(matches!(
            svc.login(&req("a@x.com", "pw1"), &cancel).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn cancelled_registration_persists_nothing() {
        let (svc, store) = service();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::Cancelled));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn cancelled_login_is_reported() {
        let (svc, _) = service();
        let live = CancellationToken::new();
        svc.register(&req("a@x.com", "pw1"), &live).await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = svc.login(&req("a@x.com", "pw1"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_between_save_and_commit_persists_nothing() {
        let (svc, store, cancel) = cancelling_service(CancelAfter::Save);

        let err = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap_err();
        assert!(matches!(err, AuthError::Cancelled));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn cancellation_after_commit_still_returns_the_account() {
        let (svc, store, cancel) = cancelling_service(CancelAfter::Commit);

        let grant = svc.register(&req("a@x.com", "pw1"), &cancel).await.unwrap();
        assert!(cancel.is_cancelled());
        assert_eq!(store.len(), 1);
        assert!(store.contains_email("a@x.com"));

        let claims = svc.tokens().verify(&grant.token).unwrap();
        assert_eq!(claims.user_id, grant.account.user_id());
    }
}
