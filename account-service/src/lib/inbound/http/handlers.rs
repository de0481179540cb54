use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::principal::errors::AuthError;

pub mod check_email;
pub mod check_enrollment;
pub mod check_external_id;
pub mod check_reset_token;
pub mod forgot_password;
pub mod login;
pub mod protected;
pub mod register;
pub mod resend_otp;
pub mod reset_password;
pub mod upload_note;
pub mod verify_otp;

/// Success response: a status plus a flat JSON body.
#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(status: StatusCode, body: T) -> Self {
        ApiSuccess(status, Json(body))
    }

    pub fn ok(body: T) -> Self {
        Self::new(StatusCode::OK, body)
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// One rejected input field, express-validator style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub path: &'static str,
    pub msg: String,
}

impl FieldViolation {
    pub fn new(path: &'static str, msg: impl Into<String>) -> Self {
        Self {
            path,
            msg: msg.into(),
        }
    }
}

/// HTTP error contract.
///
/// Domain errors are translated here, at the boundary, into the status +
/// body taxonomy; nothing internal leaks past it. `Internal` carries the
/// full detail for the log and renders as a generic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 with `{"msg": ...}`
    BadRequest(String),
    /// 400 with `{"<field>": ...}` - the field-specific login errors
    FieldError {
        field: &'static str,
        message: String,
    },
    /// 400 with `{"errors": [{path, msg}, ...]}`
    Validation(Vec<FieldViolation>),
    /// 401 with `{"msg": ...}`
    Unauthorized(String),
    /// 403 with `{"msg": ...}`
    Forbidden(String),
    /// 404 with `{"msg": ...}`
    NotFound(String),
    /// 409 with `{"msg": ...}`
    Conflict(String),
    /// 500; detail is logged, the caller sees a generic message
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::FieldError { field, message } => {
                (StatusCode::BAD_REQUEST, Json(json!({ field: message }))).into_response()
            }
            ApiError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": violations })),
            )
                .into_response(),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "msg": "Server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken { .. } | AuthError::ExternalIdTaken { .. } => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::EmailNotFound => ApiError::FieldError {
                field: "email",
                message: "Invalid Credentials! Email is incorrect.".to_string(),
            },
            AuthError::PasswordMismatch => ApiError::FieldError {
                field: "password",
                message: "Invalid Credentials! Password is incorrect.".to_string(),
            },
            AuthError::MissingCredential(msg) => ApiError::Unauthorized(msg),
            AuthError::TokenExpired => {
                ApiError::BadRequest("Token Expired! Please relogin!".to_string())
            }
            AuthError::TokenInvalid => ApiError::BadRequest("Token is not valid".to_string()),
            AuthError::PrincipalNotFound => ApiError::NotFound("User not found".to_string()),
            AuthError::InvalidOtp => ApiError::BadRequest("Invalid or expired OTP".to_string()),
            AuthError::OtpStillLive => ApiError::BadRequest(
                "An OTP has already been sent. Please wait for it to expire before requesting a new one."
                    .to_string(),
            ),
            AuthError::ResetTokenInvalid => {
                ApiError::BadRequest("Token is invalid or has expired".to_string())
            }
            AuthError::Password(_)
            | AuthError::Signing(_)
            | AuthError::Notification(_)
            | AuthError::Directory(_)
            | AuthError::Database(_)
            | AuthError::Unknown(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::principal::models::Role;

    use super::*;

    #[test]
    fn test_conflict_mapping_is_role_aware() {
        let err = ApiError::from(AuthError::EmailTaken {
            role: Role::Teacher,
        });
        assert_eq!(
            err,
            ApiError::Conflict("Email already registered as a teacher".to_string())
        );
    }

    #[test]
    fn test_login_errors_are_field_keyed() {
        assert_eq!(
            ApiError::from(AuthError::EmailNotFound),
            ApiError::FieldError {
                field: "email",
                message: "Invalid Credentials! Email is incorrect.".to_string()
            }
        );
        assert_eq!(
            ApiError::from(AuthError::PasswordMismatch),
            ApiError::FieldError {
                field: "password",
                message: "Invalid Credentials! Password is incorrect.".to_string()
            }
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = ApiError::from(AuthError::Database("connection refused".to_string()));
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
