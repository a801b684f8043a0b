//! In-memory store backend. Backs the integration tests and local
//! development without a database; every atomic unit holds the single
//! mutex for its whole duration, which gives the same guarantees the
//! MySQL backend gets from transactions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::interface::{
    AccountStore, AuthError, Result, TokenStore, TwoFactorConfirmationStore, UserChanges,
    UserStore,
};
use super::model::{LinkedAccount, TokenRecord, TwoFactorConfirmation, User};
use super::tokens::TokenKind;

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    accounts: Vec<LinkedAccount>,
    verification_tokens: Vec<TokenRecord>,
    password_reset_tokens: Vec<TokenRecord>,
    two_factor_tokens: Vec<TokenRecord>,
    confirmations: Vec<TwoFactorConfirmation>,
}

impl Inner {
    fn tokens(&self, kind: TokenKind) -> &Vec<TokenRecord> {
        match kind {
            TokenKind::Verification => &self.verification_tokens,
            TokenKind::PasswordReset => &self.password_reset_tokens,
            TokenKind::TwoFactor => &self.two_factor_tokens,
        }
    }

    fn tokens_mut(&mut self, kind: TokenKind) -> &mut Vec<TokenRecord> {
        match kind {
            TokenKind::Verification => &mut self.verification_tokens,
            TokenKind::PasswordReset => &mut self.password_reset_tokens,
            TokenKind::TwoFactor => &mut self.two_factor_tokens,
        }
    }
}

/// Cloning is cheap and every clone shares the same underlying state.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn users(&self) -> Arc<dyn UserStore> {
        Arc::new(self.clone())
    }

    pub fn accounts(&self) -> Arc<dyn AccountStore> {
        Arc::new(self.clone())
    }

    pub fn confirmations(&self) -> Arc<dyn TwoFactorConfirmationStore> {
        Arc::new(self.clone())
    }

    pub fn verification_tokens(&self) -> Arc<dyn TokenStore> {
        Arc::new(MemoryTokenStore {
            inner: self.inner.clone(),
            kind: TokenKind::Verification,
        })
    }

    pub fn password_reset_tokens(&self) -> Arc<dyn TokenStore> {
        Arc::new(MemoryTokenStore {
            inner: self.inner.clone(),
            kind: TokenKind::PasswordReset,
        })
    }

    pub fn two_factor_tokens(&self) -> Arc<dyn TokenStore> {
        Arc::new(MemoryTokenStore {
            inner: self.inner.clone(),
            kind: TokenKind::TwoFactor,
        })
    }

    // Seeding and inspection helpers for tests and local fixtures.

    pub async fn insert_user(&self, user: User) {
        self.inner.lock().await.users.push(user);
    }

    pub async fn insert_account(&self, account: LinkedAccount) {
        self.inner.lock().await.accounts.push(account);
    }

    pub async fn remove_user(&self, user_id: &str) {
        self.inner.lock().await.users.retain(|u| u.id != user_id);
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .lock()
            .await
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    pub async fn token_count(&self, kind: TokenKind) -> usize {
        self.inner.lock().await.tokens(kind).len()
    }

    pub async fn tokens_for_email(&self, kind: TokenKind, email: &str) -> Vec<TokenRecord> {
        self.inner
            .lock()
            .await
            .tokens(kind)
            .iter()
            .filter(|t| t.email == email)
            .cloned()
            .collect()
    }

    pub async fn confirmation_count(&self, user_id: &str) -> usize {
        self.inner
            .lock()
            .await
            .confirmations
            .iter()
            .filter(|c| c.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            // Mirrors the unique-email constraint of the MySQL schema.
            return Err(AuthError::EmailInUse);
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user_id: &str, changes: &UserChanges) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;

        if let Some(name) = &changes.name {
            user.name = Some(name.clone());
        }
        if let Some(hash) = &changes.password_hash {
            user.password_hash = Some(hash.clone());
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(enabled) = changes.two_factor_enabled {
            user.two_factor_enabled = enabled;
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn apply_email_verification(
        &self,
        user_id: &str,
        email: &str,
        verified_at: DateTime<Utc>,
        token_id: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        user.email = email.to_string();
        user.email_verified = Some(verified_at);
        user.updated_at = verified_at;
        inner.verification_tokens.retain(|t| t.id != token_id);
        Ok(())
    }

    async fn apply_password_reset(
        &self,
        user_id: &str,
        password_hash: &str,
        token_id: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        user.password_hash = Some(password_hash.to_string());
        user.updated_at = Utc::now();
        inner.password_reset_tokens.retain(|t| t.id != token_id);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<LinkedAccount>> {
        let inner = self.inner.lock().await;
        Ok(inner.accounts.iter().find(|a| a.user_id == user_id).cloned())
    }
}

#[async_trait]
impl TwoFactorConfirmationStore for MemoryStore {
    async fn record_challenge(
        &self,
        confirmation: &TwoFactorConfirmation,
        token_id: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.two_factor_tokens.retain(|t| t.id != token_id);
        inner
            .confirmations
            .retain(|c| c.user_id != confirmation.user_id);
        inner.confirmations.push(confirmation.clone());
        Ok(())
    }

    async fn take_for_user(&self, user_id: &str) -> Result<Option<TwoFactorConfirmation>> {
        let mut inner = self.inner.lock().await;
        let found = inner
            .confirmations
            .iter()
            .position(|c| c.user_id == user_id);
        Ok(found.map(|idx| inner.confirmations.remove(idx)))
    }
}

struct MemoryTokenStore {
    inner: Arc<Mutex<Inner>>,
    kind: TokenKind,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tokens(self.kind)
            .iter()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<TokenRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tokens(self.kind)
            .iter()
            .find(|t| t.email == email)
            .cloned())
    }

    async fn replace(&self, record: &TokenRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let tokens = inner.tokens_mut(self.kind);
        tokens.retain(|t| t.email != record.email);
        tokens.push(record.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.tokens_mut(self.kind).retain(|t| t.id != id);
        Ok(())
    }
}
