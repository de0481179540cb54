use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::CurrentPrincipal;
use crate::principal::models::Role;

/// Returns the decoded session claim for any valid bearer session.
pub async fn protected(
    Extension(principal): Extension<CurrentPrincipal>,
) -> Result<ApiSuccess<SessionClaimData>, ApiError> {
    Ok(ApiSuccess::ok(SessionClaimData {
        id: principal.id,
        email: principal.email,
        name: principal.name,
        role: principal.role,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionClaimData {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}
