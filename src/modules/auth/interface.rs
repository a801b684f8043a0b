use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{LinkedAccount, TokenRecord, TwoFactorConfirmation, User, UserRole};

// =============================================================================
// STORE TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, AuthError>;

/// Partial user update applied by the settings flow. `None` fields are
/// left untouched.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub two_factor_enabled: Option<bool>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn update(&self, user_id: &str, changes: &UserChanges) -> Result<()>;

    /// Stamp `email_verified`, move the user onto the token's email and
    /// delete the consumed verification token, all in one transaction.
    async fn apply_email_verification(
        &self,
        user_id: &str,
        email: &str,
        verified_at: DateTime<Utc>,
        token_id: &str,
    ) -> Result<()>;

    /// Overwrite the password hash and delete the consumed reset token in
    /// one transaction. A lone update would let the same reset link be
    /// replayed.
    async fn apply_password_reset(
        &self,
        user_id: &str,
        password_hash: &str,
        token_id: &str,
    ) -> Result<()>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<LinkedAccount>>;
}

/// One instance per token kind (verification, password reset, two-factor).
/// All kinds share the lifecycle: at most one live token per email,
/// replaced atomically on issue, deleted atomically on consume.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn find_by_token(&self, token: &str) -> Result<Option<TokenRecord>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<TokenRecord>>;

    /// Delete any existing token for the record's email, then insert the
    /// new one, as a single transaction.
    async fn replace(&self, record: &TokenRecord) -> Result<()>;
    async fn delete(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait TwoFactorConfirmationStore: Send + Sync {
    /// Delete the consumed two-factor token and replace any stale
    /// confirmation for the user in one transaction.
    async fn record_challenge(
        &self,
        confirmation: &TwoFactorConfirmation,
        token_id: &str,
    ) -> Result<()>;

    /// Find and delete the confirmation in one unit; it is single-use.
    async fn take_for_user(&self, user_id: &str) -> Result<Option<TwoFactorConfirmation>>;
}

// =============================================================================
// EMAIL SENDER
// =============================================================================

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, email: &str, token: &str) -> Result<()>;
    async fn send_password_reset_email(&self, email: &str, token: &str) -> Result<()>;
    async fn send_two_factor_email(&self, email: &str, code: &str) -> Result<()>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid fields!")]
    InvalidFields,

    #[error("Invalid email!")]
    InvalidEmail,

    #[error("Email does not exist!")]
    UserNotFound,

    #[error("Email not found!")]
    EmailNotFound,

    #[error("Email already in use!")]
    EmailInUse,

    #[error("Missing token!")]
    MissingToken,

    #[error("Invalid token!")]
    TokenNotFound,

    #[error("Token has expired!")]
    TokenExpired,

    #[error("Invalid code!")]
    InvalidCode,

    #[error("Code expired!")]
    CodeExpired,

    #[error("Invalid credentials!")]
    InvalidCredentials,

    #[error("Incorrect password!")]
    IncorrectPassword,

    #[error("Provider account! Change not allowed!")]
    OAuthAccount,

    #[error("Unauthorized")]
    Unauthorized,

    /// The session issuer's own gate declined a sign-in that got past the
    /// login flow. Surfaced as the generic message, like any unexpected
    /// failure.
    #[error("Access denied")]
    AccessDenied,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Email delivery failed: {0}")]
    Mail(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidFields | Self::InvalidEmail | Self::MissingToken => {
                StatusCode::BAD_REQUEST
            }
            Self::UserNotFound | Self::EmailNotFound => StatusCode::NOT_FOUND,
            Self::EmailInUse => StatusCode::CONFLICT,
            Self::TokenNotFound | Self::TokenExpired => StatusCode::BAD_REQUEST,
            Self::InvalidCode | Self::CodeExpired => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::IncorrectPassword | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::OAuthAccount => StatusCode::FORBIDDEN,
            Self::AccessDenied | Self::Database(_) | Self::Mail(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a caller. Internal failures never leak their
    /// detail through a response body.
    pub fn public_message(&self) -> String {
        match self {
            Self::AccessDenied | Self::Database(_) | Self::Mail(_) | Self::Internal(_) => {
                "Something went wrong!".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::Internal(format!("password hash: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Internal(format!("session token: {err}"))
    }
}
