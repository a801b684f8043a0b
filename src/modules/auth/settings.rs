use validator::Validate;

use crate::services::hashing;
use crate::AppState;

use super::interface::{AuthError, Result, UserChanges};
use super::schema::SettingsRequest;
use super::tokens::TokenKind;

/// Update the caller's own account. The caller's identity is an explicit
/// argument (the subject of a verified session token); there is no
/// ambient "current user" lookup anywhere in the flows.
pub async fn update_settings(
    state: &AppState,
    user_id: &str,
    req: &SettingsRequest,
) -> Result<&'static str> {
    req.validate().map_err(|_| AuthError::InvalidFields)?;

    // Re-resolve the caller; a leftover session for a deleted account
    // holds no authority.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    let is_oauth = state.accounts.find_by_user_id(&user.id).await?.is_some();

    let mut req_email = req.email.clone();
    let mut req_password = req.password.clone();
    let mut req_new_password = req.new_password.clone();
    let mut req_two_factor = req.is_two_factor_enabled;

    // Email, password and two-factor settings belong to the provider for
    // OAuth accounts; those fields are ignored, not errors.
    if is_oauth {
        req_email = None;
        req_password = None;
        req_new_password = None;
        req_two_factor = None;
    }

    // An email change only ever produces a verification token for the new
    // address. The address itself changes when that token is consumed, so
    // nobody can claim an inbox they cannot read.
    if let Some(new_email) = req_email.filter(|e| *e != user.email) {
        if let Some(existing) = state.users.find_by_email(&new_email).await? {
            if existing.id != user.id {
                return Err(AuthError::EmailInUse);
            }
        }

        let token = state
            .tokens
            .issue(TokenKind::Verification, &new_email)
            .await?;
        state
            .mailer
            .send_verification_email(&token.email, &token.token)
            .await?;

        return Ok("Verification email sent!");
    }

    let mut changes = UserChanges {
        name: req.name.clone(),
        role: req.role,
        two_factor_enabled: req_two_factor,
        ..UserChanges::default()
    };

    // A password change demands proof of the current password.
    if let (Some(current), Some(new_password)) = (&req_password, &req_new_password) {
        let Some(hash) = user.password_hash.as_deref() else {
            return Err(AuthError::IncorrectPassword);
        };
        if !hashing::verify_password(current, hash)? {
            return Err(AuthError::IncorrectPassword);
        }
        changes.password_hash = Some(hashing::hash_password(new_password)?);
    }

    state.users.update(&user.id, &changes).await?;

    Ok("Settings updated!")
}
