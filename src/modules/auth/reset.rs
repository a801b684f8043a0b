use validator::Validate;

use crate::services::hashing;
use crate::AppState;

use super::interface::{AuthError, Result};
use super::schema::{NewPasswordRequest, ResetRequest};
use super::tokens::TokenKind;

/// First phase: mint a reset token and email it. Accounts that sign in
/// through a provider have no password to reset, so the request is
/// refused outright rather than mailing a token that could never be used.
pub async fn request_reset(state: &AppState, req: &ResetRequest) -> Result<&'static str> {
    req.validate().map_err(|_| AuthError::InvalidEmail)?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(AuthError::EmailNotFound)?;

    if state.accounts.find_by_user_id(&user.id).await?.is_some() {
        return Err(AuthError::OAuthAccount);
    }

    let token = state
        .tokens
        .issue(TokenKind::PasswordReset, &user.email)
        .await?;
    state
        .mailer
        .send_password_reset_email(&token.email, &token.token)
        .await?;

    Ok("Reset email sent!")
}

/// Second phase: consume the token and overwrite the password. The
/// password update and the token deletion form a single transaction, so
/// the same reset link can never be spent twice.
pub async fn complete_reset(state: &AppState, req: &NewPasswordRequest) -> Result<&'static str> {
    let Some(token) = req.token.as_deref() else {
        return Err(AuthError::MissingToken);
    };

    req.validate().map_err(|_| AuthError::InvalidFields)?;

    let record = state.tokens.consume(TokenKind::PasswordReset, token).await?;

    let user = state
        .users
        .find_by_email(&record.email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    let password_hash = hashing::hash_password(&req.password)?;

    state
        .users
        .apply_password_reset(&user.id, &password_hash, &record.id)
        .await?;

    Ok("Password updated!")
}
