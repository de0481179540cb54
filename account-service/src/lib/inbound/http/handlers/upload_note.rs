use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::documents::models::DocumentUpload;
use crate::inbound::http::router::AppState;

/// Teacher-gated document upload (the role gate lives in middleware).
///
/// Multipart fields: `file`, `subject`, `title`, `uploadedBy`.
pub async fn upload_note(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ApiSuccess<UploadNoteResponseData>, ApiError> {
    let mut subject = None;
    let mut title = None;
    let mut uploaded_by = None;
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("subject") => subject = Some(read_text(field).await?),
            Some("title") => title = Some(read_text(field).await?),
            Some("uploadedBy") => uploaded_by = Some(read_text(field).await?),
            Some("file") => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload.bin")
                    .to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let uploaded_by =
        uploaded_by.ok_or_else(|| ApiError::BadRequest("uploadedBy field is required".to_string()))?;
    let subject =
        subject.ok_or_else(|| ApiError::BadRequest("Subject field is required".to_string()))?;

    let stored = state
        .documents
        .store(DocumentUpload {
            subject,
            title: title.unwrap_or_default(),
            uploaded_by,
            file_name,
            content_type,
            bytes,
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        UploadNoteResponseData {
            msg: "Notes stored successfully".to_string(),
            view_url: stored.view_url,
            download_url: stored.download_url,
        },
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart field: {}", e)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadNoteResponseData {
    pub msg: String,
    #[serde(rename = "viewURL")]
    pub view_url: String,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
}
