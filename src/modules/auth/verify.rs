use chrono::Utc;

use crate::AppState;

use super::interface::{AuthError, Result};
use super::tokens::TokenKind;

/// Consume a verification token and activate the email it was minted for.
///
/// The user is resolved by the token's stored email, never by a caller
/// session, so the same mechanism authorizes an email change: the token
/// always proves control of the destination address, and the user's email
/// becomes the token's email in the same stroke that stamps
/// `email_verified`. User update and token deletion happen as one atomic
/// unit; a lone update would allow replaying the link, a lone deletion
/// would lose the verification.
pub async fn verify_email(state: &AppState, token: &str) -> Result<&'static str> {
    let record = state.tokens.consume(TokenKind::Verification, token).await?;

    let user = state
        .users
        .find_by_email(&record.email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    state
        .users
        .apply_email_verification(&user.id, &record.email, Utc::now(), &record.id)
        .await?;

    Ok("Email verified!")
}
