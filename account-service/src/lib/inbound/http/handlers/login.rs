use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldViolation;
use crate::inbound::http::middleware;
use crate::inbound::http::router::AppState;
use crate::principal::models::EmailAddress;
use crate::principal::models::LoginOutcome;
use crate::principal::models::Role;

pub async fn login(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, ApiSuccess<LoginResponseData>), ApiError> {
    let mut violations = Vec::new();
    if EmailAddress::new(body.email.clone()).is_err() {
        violations.push(FieldViolation::new("email", "Please include a valid email"));
    }
    if body.password.is_empty() {
        violations.push(FieldViolation::new("password", "Password is required"));
    }
    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    let outcome = state.auth_service.login(role, &body.email, &body.password).await?;

    let mut headers = HeaderMap::new();
    let response = match outcome {
        LoginOutcome::Session { token } => {
            headers.insert(header::SET_COOKIE, middleware::session_cookie(&token)?);
            LoginResponseData {
                msg: "Login successful".to_string(),
                login_token: Some(token),
            }
        }
        LoginOutcome::StepUp { token } => {
            headers.insert(header::SET_COOKIE, middleware::step_up_cookie(role, &token)?);
            LoginResponseData {
                msg: "OTP sent to your email".to_string(),
                login_token: None,
            }
        }
    };

    Ok((headers, ApiSuccess::ok(response)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub msg: String,
    #[serde(rename = "loginToken", skip_serializing_if = "Option::is_none")]
    pub login_token: Option<String>,
}
