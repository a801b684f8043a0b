use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    /// None for accounts created through an OAuth provider; such accounts
    /// can never log in with credentials.
    pub password_hash: Option<String>,
    pub email_verified: Option<DateTime<Utc>>,
    pub role: UserRole,
    pub two_factor_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// External identity-provider link. Presence means the user signs in
/// through OAuth (possibly in addition to a password).
#[derive(Debug, Clone, FromRow)]
pub struct LinkedAccount {
    pub id: String,
    pub user_id: String,
    pub provider: String,
    pub provider_account_id: String,
    pub created_at: DateTime<Utc>,
}

/// Row shape shared by all three single-use token kinds
/// (verification, password reset, two-factor code).
#[derive(Debug, Clone, FromRow)]
pub struct TokenRecord {
    pub id: String,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(email: &str, token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            token,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Marker that a user passed a two-factor challenge for the current login
/// attempt. Deleted the moment the session issuer checks it.
#[derive(Debug, Clone, FromRow)]
pub struct TwoFactorConfirmation {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl TwoFactorConfirmation {
    pub fn new(user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        }
    }
}
