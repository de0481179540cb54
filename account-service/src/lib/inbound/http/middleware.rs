use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;

use super::handlers::ApiError;
use super::router::AppState;
use crate::principal::models::Role;
use crate::principal::models::SessionClaims;

/// Cookie carrying the full 30-day session token.
pub const SESSION_COOKIE: &str = "token";

const SESSION_COOKIE_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;
const STEP_UP_COOKIE_MAX_AGE_SECONDS: i64 = 60 * 60;

/// The authenticated identity attached to a request by [`authenticate`].
#[derive(Debug, Clone)]
pub struct CurrentPrincipal {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<SessionClaims> for CurrentPrincipal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        }
    }
}

/// Build the `Set-Cookie` value for a full session.
pub fn session_cookie(token: &str) -> Result<HeaderValue, ApiError> {
    build_cookie(SESSION_COOKIE, token, SESSION_COOKIE_MAX_AGE_SECONDS)
}

/// Build the `Set-Cookie` value for a role-scoped step-up token.
pub fn step_up_cookie(role: Role, token: &str) -> Result<HeaderValue, ApiError> {
    build_cookie(role.verify_cookie(), token, STEP_UP_COOKIE_MAX_AGE_SECONDS)
}

fn build_cookie(name: &str, value: &str, max_age_seconds: i64) -> Result<HeaderValue, ApiError> {
    let cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age_seconds}");
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::Internal(format!("Invalid cookie value: {}", e)))
}

/// Read a single cookie out of the `Cookie` header, if present.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Read the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extraction rule for step-up endpoints (`verify-otp`, `resend-otp`):
/// the explicit `Authorization` header wins, the role-scoped verify cookie
/// is the fallback.
pub fn step_up_token(headers: &HeaderMap, role: Role) -> Result<String, ApiError> {
    if headers.get(header::AUTHORIZATION).is_some() {
        return bearer_token(headers).map(str::to_string).ok_or_else(|| {
            ApiError::Unauthorized("Token missing from Authorization header".to_string())
        });
    }
    cookie_value(headers, role.verify_cookie())
        .ok_or_else(|| ApiError::Unauthorized("Authorization header missing".to_string()))
}

/// Extraction rule for full-session endpoints: the session cookie wins,
/// the bearer header is the fallback.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| bearer_token(headers).map(str::to_string))
}

/// Middleware validating the session token and attaching the decoded
/// principal to request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = session_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("No token, authorization denied".to_string()).into_response()
    })?;

    let claims: SessionClaims = state.tokens.verify(&token).map_err(|e| {
        tracing::warn!(error = %e, "Session token rejected");
        ApiError::Unauthorized("Token is not valid".to_string()).into_response()
    })?;

    req.extensions_mut().insert(CurrentPrincipal::from(claims));

    Ok(next.run(req).await)
}

/// Middleware gating the document upload endpoint to teacher sessions.
pub async fn require_teacher(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = session_token(req.headers()).ok_or_else(|| {
        ApiError::Unauthorized("Access Denied. No token provided.".to_string()).into_response()
    })?;

    let claims: SessionClaims = state.tokens.verify(&token).map_err(|e| {
        tracing::warn!(error = %e, "Upload token rejected");
        ApiError::BadRequest("Invalid token.".to_string()).into_response()
    })?;

    if claims.role != Role::Teacher {
        return Err(ApiError::Forbidden(
            "Forbidden. Only teachers can upload notes.".to_string(),
        )
        .into_response());
    }

    Ok(next.run(req).await)
}
