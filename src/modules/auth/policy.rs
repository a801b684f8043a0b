//! Credential and sign-in policy shared by the two authorization
//! boundaries: the login flow callers reach directly, and the session
//! issuer a caller could talk to while bypassing that flow. Both invoke
//! these same functions, so the policy cannot drift between them.

use crate::services::hashing;

use super::interface::{AuthError, Result, TwoFactorConfirmationStore, UserStore};
use super::model::User;

/// Check an email/password pair against the stored hash.
///
/// Returns `None` for a missing user, an OAuth-only account (no stored
/// password, so credentials login must not be offered) and a failed hash
/// comparison alike; callers must not distinguish those cases to a client.
pub async fn authorize(
    users: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    if email.is_empty() || password.is_empty() {
        return Ok(None);
    }

    let Some(user) = users.find_by_email(email).await? else {
        return Ok(None);
    };

    let Some(hash) = user.password_hash.as_deref() else {
        return Ok(None);
    };

    if hashing::verify_password(password, hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Final gate before a session is issued for a credentials user: the email
/// must be verified, and a two-factor-enabled user must hold a
/// confirmation from the current login attempt. The confirmation is
/// deleted as it is checked; it never survives into a second sign-in.
pub async fn sign_in_gate(
    user: &User,
    confirmations: &dyn TwoFactorConfirmationStore,
) -> Result<()> {
    if user.email_verified.is_none() {
        return Err(AuthError::AccessDenied);
    }

    if user.two_factor_enabled {
        if confirmations.take_for_user(&user.id).await?.is_none() {
            return Err(AuthError::AccessDenied);
        }
    }

    Ok(())
}
