use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::config::TokenTtls;

use super::interface::{AuthError, Result, TokenStore};
use super::model::TokenRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Verification,
    PasswordReset,
    TwoFactor,
}

/// Issues and validates the single-use tokens behind email verification,
/// password reset and two-factor login. Every kind follows the same
/// protocol: issuing replaces any live token for the email in one atomic
/// unit, and consuming checks existence and expiry but leaves deletion to
/// the caller so it can be paired with the state change the token
/// authorizes.
pub struct TokenService {
    verification: Arc<dyn TokenStore>,
    password_reset: Arc<dyn TokenStore>,
    two_factor: Arc<dyn TokenStore>,
    ttls: TokenTtls,
}

impl TokenService {
    pub fn new(
        verification: Arc<dyn TokenStore>,
        password_reset: Arc<dyn TokenStore>,
        two_factor: Arc<dyn TokenStore>,
        ttls: TokenTtls,
    ) -> Self {
        Self {
            verification,
            password_reset,
            two_factor,
            ttls,
        }
    }

    fn store(&self, kind: TokenKind) -> &dyn TokenStore {
        match kind {
            TokenKind::Verification => self.verification.as_ref(),
            TokenKind::PasswordReset => self.password_reset.as_ref(),
            TokenKind::TwoFactor => self.two_factor.as_ref(),
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        let secs = match kind {
            TokenKind::Verification => self.ttls.verification_secs,
            TokenKind::PasswordReset => self.ttls.password_reset_secs,
            TokenKind::TwoFactor => self.ttls.two_factor_secs,
        };
        Duration::seconds(secs)
    }

    fn generate_value(kind: TokenKind) -> String {
        match kind {
            // Short numeric code typed in by the user.
            TokenKind::TwoFactor => rand::rng().random_range(100_000..1_000_000).to_string(),
            _ => Uuid::new_v4().to_string(),
        }
    }

    /// Mint a fresh token for the email. Any prior unconsumed token of the
    /// same kind is removed in the same atomic unit, so at most one is
    /// live per (kind, email) at any time.
    pub async fn issue(&self, kind: TokenKind, email: &str) -> Result<TokenRecord> {
        let record = TokenRecord::new(
            email,
            Self::generate_value(kind),
            Utc::now() + self.ttl(kind),
        );

        self.store(kind).replace(&record).await?;

        Ok(record)
    }

    /// Look up a raw token and check its expiry. The row is NOT deleted
    /// here; the caller deletes it together with the mutation it
    /// authorizes so a token can never be spent without effect.
    pub async fn consume(&self, kind: TokenKind, raw: &str) -> Result<TokenRecord> {
        let record = self
            .store(kind)
            .find_by_token(raw)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if record.is_expired(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }

        Ok(record)
    }

    /// Live (unexpired or not) token currently held for an email, if any.
    pub async fn peek(&self, kind: TokenKind, email: &str) -> Result<Option<TokenRecord>> {
        self.store(kind).find_by_email(email).await
    }

    /// Remove a token by row id. Used when the atomic unit consuming the
    /// token lives entirely in the token table.
    pub async fn delete(&self, kind: TokenKind, id: &str) -> Result<()> {
        self.store(kind).delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::memory::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> TokenService {
        TokenService::new(
            store.verification_tokens(),
            store.password_reset_tokens(),
            store.two_factor_tokens(),
            TokenTtls::default(),
        )
    }

    #[tokio::test]
    async fn issue_then_consume_yields_the_same_email() {
        let store = MemoryStore::shared();
        let tokens = service(&store);

        let issued = tokens
            .issue(TokenKind::Verification, "a@example.com")
            .await
            .unwrap();
        let consumed = tokens
            .consume(TokenKind::Verification, &issued.token)
            .await
            .unwrap();

        assert_eq!(consumed.email, "a@example.com");
        assert_eq!(consumed.id, issued.id);
    }

    #[tokio::test]
    async fn reissue_replaces_the_previous_token() {
        let store = MemoryStore::shared();
        let tokens = service(&store);

        let first = tokens
            .issue(TokenKind::PasswordReset, "a@example.com")
            .await
            .unwrap();
        let second = tokens
            .issue(TokenKind::PasswordReset, "a@example.com")
            .await
            .unwrap();

        assert_ne!(first.token, second.token);

        // The stale token is gone, the fresh one is the only live row.
        let err = tokens
            .consume(TokenKind::PasswordReset, &first.token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenNotFound));

        let live = tokens
            .peek(TokenKind::PasswordReset, "a@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(live.token, second.token);
    }

    #[tokio::test]
    async fn consumed_and_deleted_token_is_gone() {
        let store = MemoryStore::shared();
        let tokens = service(&store);

        let issued = tokens
            .issue(TokenKind::Verification, "a@example.com")
            .await
            .unwrap();

        let consumed = tokens
            .consume(TokenKind::Verification, &issued.token)
            .await
            .unwrap();
        tokens
            .delete(TokenKind::Verification, &consumed.id)
            .await
            .unwrap();

        let err = tokens
            .consume(TokenKind::Verification, &issued.token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenNotFound));
    }

    #[tokio::test]
    async fn expired_token_fails_expired_not_notfound() {
        let store = MemoryStore::shared();
        let tokens = service(&store);

        let expired = TokenRecord::new(
            "a@example.com",
            "stale-token".to_string(),
            Utc::now() - Duration::seconds(1),
        );
        store.verification_tokens().replace(&expired).await.unwrap();

        let err = tokens
            .consume(TokenKind::Verification, "stale-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn two_factor_codes_are_six_digit_numbers() {
        let store = MemoryStore::shared();
        let tokens = service(&store);

        for _ in 0..16 {
            let code = tokens
                .issue(TokenKind::TwoFactor, "a@example.com")
                .await
                .unwrap();
            let value: u32 = code.token.parse().unwrap();
            assert!((100_000..1_000_000).contains(&value));
        }
    }
}
