use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldViolation;
use crate::principal::models::EmailAddress;
use crate::principal::models::ExternalId;
use crate::principal::models::RegisterCommand;
use crate::principal::models::Role;
use crate::principal::models::RoleDetails;
use crate::principal::models::Subjects;
use crate::inbound::http::router::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    Extension(role): Extension<Role>,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    let command = body.try_into_command(role)?;

    let registration = state.auth_service.register(role, command).await?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        RegisterResponseData {
            token: registration.token,
        },
    ))
}

/// HTTP request body for registration (raw JSON).
///
/// The external id arrives as `studentId` or `teacherId` depending on the
/// endpoint family.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default, alias = "studentId", alias = "teacherId")]
    external_id: Option<String>,
    #[serde(default)]
    subjects: Option<Vec<String>>,
}

impl RegisterRequest {
    /// Validate every field, collecting all violations like the wire
    /// contract expects, then build the domain command.
    fn try_into_command(self, role: Role) -> Result<RegisterCommand, ApiError> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(FieldViolation::new("name", "Please enter a name"));
        }

        let email = EmailAddress::new(self.email).map_err(|_| {
            FieldViolation::new("email", "Please include a valid email")
        });
        if let Err(violation) = &email {
            violations.push(violation.clone());
        }

        if self.password.len() < MIN_PASSWORD_LENGTH {
            violations.push(FieldViolation::new(
                "password",
                "Please enter a password with 6 or more characters",
            ));
        }

        let (id_field, id_message) = match role {
            Role::Student => ("studentId", "Please enter a enrollment ID"),
            Role::Teacher => ("teacherId", "Please enter a teacher ID"),
        };
        let external_id = self
            .external_id
            .ok_or(())
            .and_then(|id| ExternalId::new(id).map_err(|_| ()))
            .map_err(|_| FieldViolation::new(id_field, id_message));
        if let Err(violation) = &external_id {
            violations.push(violation.clone());
        }

        let details = match role {
            Role::Student => Ok(RoleDetails::Student),
            Role::Teacher => self
                .subjects
                .ok_or(())
                .and_then(|subjects| Subjects::new(subjects).map_err(|_| ()))
                .map(|subjects| RoleDetails::Teacher { subjects })
                .map_err(|_| {
                    FieldViolation::new("subjects", "Please include at least one subject")
                }),
        };
        if let Err(violation) = &details {
            violations.push(violation.clone());
        }

        if !violations.is_empty() {
            return Err(ApiError::Validation(violations));
        }

        // Unwraps are fine: a failed field always pushed a violation above.
        Ok(RegisterCommand {
            name: self.name.trim().to_string(),
            email: email.unwrap(),
            password: self.password,
            external_id: external_id.unwrap(),
            details: details.unwrap(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str, id: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            external_id: id.map(str::to_string),
            subjects: None,
        }
    }

    #[test]
    fn test_valid_student_request() {
        let command = request("Asha Rao", "a@x.com", "secret1", Some("S100"))
            .try_into_command(Role::Student)
            .unwrap();
        assert_eq!(command.name, "Asha Rao");
        assert_eq!(command.external_id.as_str(), "S100");
        assert_eq!(command.details, RoleDetails::Student);
    }

    #[test]
    fn test_teacher_requires_subjects() {
        let result = request("T One", "t@x.com", "secret1", Some("T100"))
            .try_into_command(Role::Teacher);

        let Err(ApiError::Validation(violations)) = result else {
            panic!("Expected validation failure");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "subjects");
    }

    #[test]
    fn test_all_violations_are_collected() {
        let result = request("", "nope", "short", None).try_into_command(Role::Student);

        let Err(ApiError::Validation(violations)) = result else {
            panic!("Expected validation failure");
        };
        let paths: Vec<_> = violations.iter().map(|v| v.path).collect();
        assert_eq!(paths, vec!["name", "email", "password", "studentId"]);
    }
}
