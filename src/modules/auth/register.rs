use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::services::hashing;
use crate::AppState;

use super::interface::{AuthError, Result};
use super::model::{User, UserRole};
use super::schema::RegisterRequest;
use super::tokens::TokenKind;

/// Create a credentials account and send the initial verification email.
/// The account stays unusable for login until the email is verified.
pub async fn register(state: &AppState, req: &RegisterRequest) -> Result<&'static str> {
    req.validate().map_err(|_| AuthError::InvalidFields)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AuthError::EmailInUse);
    }

    let password_hash = hashing::hash_password(&req.password)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: Some(req.name.clone()),
        email: req.email.clone(),
        password_hash: Some(password_hash),
        email_verified: None,
        role: UserRole::User,
        two_factor_enabled: false,
        created_at: now,
        updated_at: now,
    };

    state.users.create(&user).await?;

    let token = state
        .tokens
        .issue(TokenKind::Verification, &user.email)
        .await?;
    state
        .mailer
        .send_verification_email(&token.email, &token.token)
        .await?;

    Ok("Confirmation email sent!")
}
