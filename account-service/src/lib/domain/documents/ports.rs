use async_trait::async_trait;
use thiserror::Error;

use crate::documents::models::DocumentUpload;
use crate::documents::models::StoredDocument;

/// Error for document storage operations
#[derive(Debug, Clone, Error)]
pub enum DocumentStoreError {
    #[error("Failed to store document: {0}")]
    StoreFailed(String),
}

/// Port for the document storage subsystem.
///
/// Only the teacher-role gate couples this to the auth core; the storage
/// engine behind it is not this service's concern.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Persist an upload and return its view/download locators.
    async fn store(&self, upload: DocumentUpload) -> Result<StoredDocument, DocumentStoreError>;
}
