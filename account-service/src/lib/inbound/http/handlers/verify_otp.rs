use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware;
use crate::inbound::http::router::AppState;
use crate::principal::models::Role;

pub async fn verify_otp(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    headers: HeaderMap,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<(HeaderMap, ApiSuccess<VerifyOtpResponseData>), ApiError> {
    let step_up_token = middleware::step_up_token(&headers, role)?;

    let session_token = state
        .auth_service
        .verify_otp(role, &step_up_token, &body.otp)
        .await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        middleware::session_cookie(&session_token)?,
    );

    Ok((
        response_headers,
        ApiSuccess::ok(VerifyOtpResponseData {
            msg: "OTP verified successfully".to_string(),
            token: session_token,
        }),
    ))
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    otp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyOtpResponseData {
    pub msg: String,
    pub token: String,
}
