use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::services::jwt::Claims;
use crate::AppState;

use super::guard::bearer_token;
use super::interface::AuthError;
use super::login::{self, LoginOutcome};
use super::register;
use super::reset;
use super::schema::{
    ErrorResponse, LoginRequest, LoginResponse, NewPasswordRequest, NewVerificationRequest,
    RegisterRequest, ResetRequest, SettingsRequest, SuccessResponse,
};
use super::session::SessionUser;
use super::settings;
use super::verify;

/// Boundary between flow errors and HTTP. Expected rejections keep their
/// short message; anything internal is logged here and collapsed to the
/// generic body.
pub struct ApiError(AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "auth flow failed");
        }
        (status, Json(ErrorResponse::new(self.0.public_message()))).into_response()
    }
}

/// Verified session claims extracted from the bearer token. Flows that
/// act on behalf of a user receive the subject from here explicitly.
pub struct AuthSession(pub Claims);

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError(AuthError::Unauthorized))?;
        let claims = state.sessions.verify(token)?;
        Ok(Self(claims))
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let message = register::register(&state, &req).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(message))))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = match login::login(&state, &req).await? {
        LoginOutcome::Session(session) => LoginResponse::Session(session),
        LoginOutcome::TwoFactorRequired => LoginResponse::TwoFactor { two_factor: true },
        LoginOutcome::ConfirmationSent => LoginResponse::Confirmation {
            success: "Confirmation email sent!",
        },
    };
    Ok(Json(response))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let message = reset::request_reset(&state, &req).await?;
    Ok(Json(SuccessResponse::new(message)))
}

pub async fn new_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewPasswordRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let message = reset::complete_reset(&state, &req).await?;
    Ok(Json(SuccessResponse::new(message)))
}

pub async fn new_verification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewVerificationRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let message = verify::verify_email(&state, &req.token).await?;
    Ok(Json(SuccessResponse::new(message)))
}

pub async fn settings(
    State(state): State<Arc<AppState>>,
    AuthSession(claims): AuthSession,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let message = settings::update_settings(&state, &claims.sub, &req).await?;
    Ok(Json(SuccessResponse::new(message)))
}

/// Session read. Enrichment runs here on every call, so role and flag
/// changes show up without re-login; a deleted account reads as no
/// session at all.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthSession(claims): AuthSession,
) -> Result<Json<SessionUser>, ApiError> {
    let session = state
        .sessions
        .read_session(&claims.sub)
        .await?
        .ok_or(AuthError::Unauthorized)?;
    Ok(Json(session))
}
