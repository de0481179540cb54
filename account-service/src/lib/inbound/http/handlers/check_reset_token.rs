use axum::extract::Path;
use axum::extract::State;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::principal::errors::AuthError;
use crate::principal::models::Role;

pub async fn check_reset_token(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(token): Path<String>,
) -> Result<ApiSuccess<CheckResetTokenResponseData>, ApiError> {
    state
        .auth_service
        .check_reset_token(role, &token)
        .await
        .map_err(|e| match e {
            AuthError::ResetTokenInvalid => {
                ApiError::BadRequest("Invalid or expired token".to_string())
            }
            other => ApiError::from(other),
        })?;

    Ok(ApiSuccess::ok(CheckResetTokenResponseData {
        msg: "Valid token".to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResetTokenResponseData {
    pub msg: String,
}
