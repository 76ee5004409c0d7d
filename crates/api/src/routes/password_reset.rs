//! Password reset: request a token by email, then redeem it.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::auth::auth_service;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct PasswordResetRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct PasswordResetConfirmRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,

    #[validate(length(min = 1, message = "new_password is required"))]
    pub new_password: String,
}

/// Same body whether or not the email is known.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PasswordResetResponse {
    pub detail: String,
    /// Present only when `password_reset.return_token` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// POST /api/v1/password-reset
pub async fn request_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<PasswordResetResponse>, ApiError> {
    request.validate()?;

    let token = auth_service(&state)
        .request_password_reset(&request.email)
        .await?;

    Ok(Json(PasswordResetResponse {
        detail: "If the email is registered, a reset token has been issued".to_string(),
        token: token.filter(|_| state.config.password_reset.return_token),
    }))
}

/// POST /api/v1/password-reset/confirm
pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;

    auth_service(&state)
        .confirm_password_reset(&request.token, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
