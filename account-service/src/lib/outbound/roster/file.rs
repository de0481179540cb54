use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::principal::errors::DirectoryError;
use crate::principal::ports::EnrollmentDirectory;
use crate::principal::ports::RosterEntry;

/// Enrollment roster backed by an institution-provided JSON file.
///
/// The file is read once at startup; the roster changes once per intake,
/// not per request.
pub struct FileEnrollmentDirectory {
    entries: HashMap<String, RosterEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    enrollment: String,
    name: String,
}

impl FileEnrollmentDirectory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, DirectoryError> {
        let raw: Vec<RawEntry> = serde_json::from_str(content)
            .map_err(|e| DirectoryError::Unavailable(format!("Malformed roster: {}", e)))?;

        let entries = raw
            .into_iter()
            .map(|entry| {
                (
                    entry.enrollment.clone(),
                    RosterEntry {
                        enrollment: entry.enrollment,
                        name: entry.name,
                    },
                )
            })
            .collect();

        Ok(Self { entries })
    }
}

#[async_trait]
impl EnrollmentDirectory for FileEnrollmentDirectory {
    async fn find(&self, enrollment: &str) -> Result<Option<RosterEntry>, DirectoryError> {
        Ok(self.entries.get(enrollment).cloned())
    }
}
