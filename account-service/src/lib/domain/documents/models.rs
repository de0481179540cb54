/// A document handed in by an uploader, plus its catalog fields.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub subject: String,
    pub title: String,
    pub uploaded_by: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Locators for a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub view_url: String,
    pub download_url: String,
}
