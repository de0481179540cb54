use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::principal::models::EnrollmentCheck;
use crate::principal::models::Role;

/// Student registration pre-check: the claimed enrollment id/name pair is
/// validated against the institution roster, after ruling out collisions
/// with already-registered principals of either role.
pub async fn check_enrollment(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Query(query): Query<CheckEnrollmentQuery>,
) -> Result<ApiSuccess<CheckEnrollmentResponseData>, ApiError> {
    let check = state
        .auth_service
        .check_enrollment(&external_id, query.name.as_deref())
        .await?;

    let response = match check {
        EnrollmentCheck::IdTaken { role } => {
            let message = match role {
                Role::Teacher => {
                    "ID already exists as a teacher ID. Please use a different enrollment ID."
                }
                Role::Student => {
                    "ID already exists in database as a student ID. Please use a different enrollment ID."
                }
            };
            ApiSuccess::new(
                StatusCode::CONFLICT,
                CheckEnrollmentResponseData {
                    message: message.to_string(),
                    exists: true,
                    proceed: None,
                },
            )
        }
        EnrollmentCheck::Match => ApiSuccess::ok(CheckEnrollmentResponseData {
            message: "Enrollment number and name match. Proceed with login.".to_string(),
            exists: true,
            proceed: Some(true),
        }),
        EnrollmentCheck::NameMismatch => ApiSuccess::new(
            StatusCode::CONFLICT,
            CheckEnrollmentResponseData {
                message: "The enrollment number exists, but the name does not match.".to_string(),
                exists: true,
                proceed: Some(false),
            },
        ),
        EnrollmentCheck::UnknownEnrollment => ApiSuccess::new(
            StatusCode::NOT_FOUND,
            CheckEnrollmentResponseData {
                message: "Enrollment ID does not exist.".to_string(),
                exists: false,
                proceed: Some(false),
            },
        ),
    };

    Ok(response)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckEnrollmentQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckEnrollmentResponseData {
    pub message: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proceed: Option<bool>,
}
