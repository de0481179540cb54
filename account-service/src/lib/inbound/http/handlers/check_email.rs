use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::principal::models::Role;

/// Read-only registry query. Conflicts name the owning role so the client
/// can tell "taken by the other role" from "you already have an account".
pub async fn check_email(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(email): Path<String>,
) -> Result<ApiSuccess<CheckExistsResponseData>, ApiError> {
    let owner = state.auth_service.email_owner(&email).await?;

    let response = match owner {
        Some(owner_role) if owner_role != role => ApiSuccess::new(
            StatusCode::CONFLICT,
            CheckExistsResponseData {
                message: Some(format!(
                    "User already exists as a {}, use a new email!",
                    owner_role
                )),
                exists: true,
            },
        ),
        Some(_) => ApiSuccess::new(
            StatusCode::CONFLICT,
            CheckExistsResponseData {
                message: Some("User already exists, you can login!".to_string()),
                exists: true,
            },
        ),
        None => ApiSuccess::ok(CheckExistsResponseData {
            message: None,
            exists: false,
        }),
    };

    Ok(response)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckExistsResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub exists: bool,
}
