use chrono::Utc;
use validator::Validate;

use crate::AppState;

use super::interface::{AuthError, Result};
use super::model::TwoFactorConfirmation;
use super::schema::LoginRequest;
use super::session::IssuedSession;
use super::tokens::TokenKind;

#[derive(Debug)]
pub enum LoginOutcome {
    /// All gates passed; the session issuer accepted the credentials.
    Session(IssuedSession),
    /// A two-factor code was emailed; the caller must re-submit the whole
    /// request with the code.
    TwoFactorRequired,
    /// The account's email is unverified; a confirmation email was sent
    /// and login cannot proceed until it is consumed out-of-band.
    ConfirmationSent,
}

/// The login state machine: input validation, credential check,
/// email-verification gate, two-factor gate, then session issuance.
///
/// Re-submitting after a pause is idempotent: issuing a token always
/// replaces the previous one, so retries never accumulate live tokens.
pub async fn login(state: &AppState, req: &LoginRequest) -> Result<LoginOutcome> {
    req.validate().map_err(|_| AuthError::InvalidFields)?;

    let user = state.users.find_by_email(&req.email).await?;

    // A missing user and an OAuth-only account get the identical
    // rejection, so the response never reveals whether the email exists
    // as a credentials account.
    let Some(user) = user.filter(|u| u.password_hash.is_some()) else {
        return Err(AuthError::UserNotFound);
    };

    if user.email_verified.is_none() {
        let token = state
            .tokens
            .issue(TokenKind::Verification, &user.email)
            .await?;
        state
            .mailer
            .send_verification_email(&token.email, &token.token)
            .await?;
        return Ok(LoginOutcome::ConfirmationSent);
    }

    if user.two_factor_enabled {
        match req.code.as_deref() {
            Some(code) => {
                // The lookup is scoped to this account's email, never by
                // code alone: six-digit codes are only unique per email,
                // and two accounts can legitimately hold the same code.
                let token = state
                    .tokens
                    .peek(TokenKind::TwoFactor, &user.email)
                    .await?
                    .ok_or(AuthError::InvalidCode)?;

                if token.token != code {
                    return Err(AuthError::InvalidCode);
                }

                if token.is_expired(Utc::now()) {
                    return Err(AuthError::CodeExpired);
                }

                // Spend the code and durably record that this login
                // attempt passed the challenge, in one atomic unit. The
                // sign-in gate below consumes the confirmation.
                state
                    .confirmations
                    .record_challenge(&TwoFactorConfirmation::new(&user.id), &token.id)
                    .await?;
            }
            None => {
                let token = state
                    .tokens
                    .issue(TokenKind::TwoFactor, &user.email)
                    .await?;
                state
                    .mailer
                    .send_two_factor_email(&token.email, &token.token)
                    .await?;
                return Ok(LoginOutcome::TwoFactorRequired);
            }
        }
    }

    // The issuer re-runs credential and gate policy on its own boundary.
    let session = state.sessions.sign_in(&req.email, &req.password).await?;
    Ok(LoginOutcome::Session(session))
}
