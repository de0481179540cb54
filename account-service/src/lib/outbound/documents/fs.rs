use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::documents::models::DocumentUpload;
use crate::documents::models::StoredDocument;
use crate::documents::ports::DocumentStore;
use crate::documents::ports::DocumentStoreError;

/// Filesystem adapter for document storage.
///
/// Stands in for the real object-storage subsystem: files land under
/// `dir/<SUBJECT>/` and locators are built from `public_base`.
pub struct FsDocumentStore {
    dir: PathBuf,
    public_base: String,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base: public_base.into(),
        }
    }
}

fn sanitize_subject(subject: &str) -> String {
    subject
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn store(&self, upload: DocumentUpload) -> Result<StoredDocument, DocumentStoreError> {
        let subject = sanitize_subject(&upload.subject);
        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(&upload.file_name));

        let folder = self.dir.join(&subject);
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| DocumentStoreError::StoreFailed(e.to_string()))?;

        tokio::fs::write(folder.join(&file_name), &upload.bytes)
            .await
            .map_err(|e| DocumentStoreError::StoreFailed(e.to_string()))?;

        tracing::info!(
            subject = %subject,
            file = %file_name,
            uploaded_by = %upload.uploaded_by,
            size = upload.bytes.len(),
            "Document stored"
        );

        let view_url = format!("{}/{}/{}", self.public_base, subject, file_name);
        let download_url = format!("{}?download=true", view_url);

        Ok(StoredDocument {
            view_url,
            download_url,
        })
    }
}
