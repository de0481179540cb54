use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;
use crate::principal::models::Role;

/// Teacher-id availability check across both stores.
pub async fn check_external_id(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Path(external_id): Path<String>,
) -> Result<ApiSuccess<CheckIdResponseData>, ApiError> {
    let owner = state.auth_service.external_id_owner(&external_id).await?;

    let response = match owner {
        Some(owner_role) if owner_role != role => ApiSuccess::new(
            StatusCode::CONFLICT,
            CheckIdResponseData {
                message: Some(format!(
                    "ID already exists as a {} ID, use a different one!",
                    owner_role
                )),
                exists: true,
            },
        ),
        Some(_) => ApiSuccess::new(
            StatusCode::CONFLICT,
            CheckIdResponseData {
                message: Some("ID already exists, use different!".to_string()),
                exists: true,
            },
        ),
        None => ApiSuccess::ok(CheckIdResponseData {
            message: None,
            exists: false,
        }),
    };

    Ok(response)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckIdResponseData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub exists: bool,
}
