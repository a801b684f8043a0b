use std::sync::Arc;

use serde::Serialize;

use crate::services::jwt::{Claims, JwtService};

use super::interface::{
    AccountStore, AuthError, Result, TwoFactorConfirmationStore, UserStore,
};
use super::model::UserRole;
use super::policy;

/// The session payload handed to callers: the user's identity plus the
/// role and flags route guards key off. `is_oauth` reflects LinkedAccount
/// presence.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: UserRole,
    pub is_oauth: bool,
    pub is_two_factor_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct IssuedSession {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Resolve the subject to its current user record and project the session
/// payload. Pure projection: nothing is mutated. A subject that no longer
/// resolves (deleted account) yields `None`; a stale token simply stops
/// describing a session instead of failing hard.
pub async fn enrich(
    users: &dyn UserStore,
    accounts: &dyn AccountStore,
    subject: &str,
) -> Result<Option<SessionUser>> {
    let Some(user) = users.find_by_id(subject).await? else {
        return Ok(None);
    };

    let is_oauth = accounts.find_by_user_id(&user.id).await?.is_some();

    Ok(Some(SessionUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        is_oauth,
        is_two_factor_enabled: user.two_factor_enabled,
    }))
}

/// Session issuer. `sign_in` is a full authorization boundary of its own:
/// even a caller that skips the login flow and hits this directly gets the
/// same credential, verification and two-factor checks.
pub struct SessionService {
    jwt: JwtService,
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    confirmations: Arc<dyn TwoFactorConfirmationStore>,
}

impl SessionService {
    pub fn new(
        jwt: JwtService,
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        confirmations: Arc<dyn TwoFactorConfirmationStore>,
    ) -> Self {
        Self {
            jwt,
            users,
            accounts,
            confirmations,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession> {
        let user = policy::authorize(self.users.as_ref(), email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        policy::sign_in_gate(&user, self.confirmations.as_ref()).await?;

        let session = enrich(self.users.as_ref(), self.accounts.as_ref(), &user.id)
            .await?
            .ok_or(AuthError::AccessDenied)?;

        let access_token = self.jwt.create_session_token(
            &session.id,
            &session.email,
            session.name.as_deref(),
            session.role,
            session.is_oauth,
            session.is_two_factor_enabled,
        )?;

        Ok(IssuedSession {
            access_token,
            token_type: "Bearer",
            expires_in: self.jwt.session_duration_secs(),
        })
    }

    /// Verify a bearer token and return its claims. Enrichment happens on
    /// every read (`read_session`), never from these claims alone.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = self
            .jwt
            .verify_session_token(token)
            .map_err(|_| AuthError::Unauthorized)?;
        Ok(data.claims)
    }

    pub async fn read_session(&self, subject: &str) -> Result<Option<SessionUser>> {
        enrich(self.users.as_ref(), self.accounts.as_ref(), subject).await
    }
}
