use axum::extract::Path;
use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldViolation;
use crate::inbound::http::router::AppState;
use crate::principal::models::Role;

const MIN_PASSWORD_LENGTH: usize = 6;

pub async fn reset_password(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<ApiSuccess<ResetPasswordResponseData>, ApiError> {
    if body.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(vec![FieldViolation::new(
            "password",
            "Please enter a password with 6 or more characters",
        )]));
    }

    state
        .auth_service
        .reset_password(role, &token, &body.password)
        .await?;

    Ok(ApiSuccess::ok(ResetPasswordResponseData {
        msg: "Password reset successful".to_string(),
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPasswordResponseData {
    pub msg: String,
}
