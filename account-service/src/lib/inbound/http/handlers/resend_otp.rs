use axum::extract::State;
use axum::http::HeaderMap;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware;
use crate::inbound::http::router::AppState;
use crate::principal::models::Role;

pub async fn resend_otp(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    headers: HeaderMap,
) -> Result<ApiSuccess<ResendOtpResponseData>, ApiError> {
    let step_up_token = middleware::step_up_token(&headers, role)?;

    state.auth_service.resend_otp(role, &step_up_token).await?;

    Ok(ApiSuccess::ok(ResendOtpResponseData {
        msg: "OTP sent successfully".to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResendOtpResponseData {
    pub msg: String,
}
