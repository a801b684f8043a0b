use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::UserRole;
use super::session::IssuedSession;

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 6, message = "Minimum 6 characters required"))]
    pub password: String,
}

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Two-factor code, supplied on the second pass of the login flow.
    #[serde(default)]
    pub code: Option<String>,
}

/// The three shapes a login can resolve to: an issued session, a pause for
/// the two-factor code, or a pause for out-of-band email confirmation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Session(IssuedSession),
    TwoFactor {
        #[serde(rename = "twoFactor")]
        two_factor: bool,
    },
    Confirmation { success: &'static str },
}

// =============================================================================
// PASSWORD RESET
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewPasswordRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[validate(length(min = 6, message = "Minimum 6 characters required"))]
    pub password: String,
}

// =============================================================================
// EMAIL VERIFICATION
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct NewVerificationRequest {
    pub token: String,
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SettingsRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, message = "Minimum 6 characters required"))]
    pub new_password: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub is_two_factor_enabled: Option<bool>,
}

// =============================================================================
// GENERIC RESULTS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: &'static str,
}

impl SuccessResponse {
    pub fn new(success: &'static str) -> Self {
        Self { success }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
