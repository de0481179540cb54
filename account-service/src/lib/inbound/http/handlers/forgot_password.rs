use axum::extract::State;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldViolation;
use crate::inbound::http::router::AppState;
use crate::principal::errors::AuthError;
use crate::principal::models::EmailAddress;
use crate::principal::models::Role;

pub async fn forgot_password(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiSuccess<ForgotPasswordResponseData>, ApiError> {
    if EmailAddress::new(body.email.clone()).is_err() {
        return Err(ApiError::Validation(vec![FieldViolation::new(
            "email",
            "Please include a valid email",
        )]));
    }

    state
        .auth_service
        .forgot_password(role, &body.email)
        .await
        .map_err(|e| match e {
            AuthError::PrincipalNotFound => {
                ApiError::NotFound(format!("{} does not exist", capitalized(role)))
            }
            other => ApiError::from(other),
        })?;

    Ok(ApiSuccess::ok(ForgotPasswordResponseData {
        msg: "Email sent".to_string(),
    }))
}

fn capitalized(role: Role) -> &'static str {
    match role {
        Role::Student => "Student",
        Role::Teacher => "Teacher",
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForgotPasswordResponseData {
    pub msg: String,
}
