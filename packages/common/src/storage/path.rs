use std::path::PathBuf;

use super::error::StorageError;
use super::kind::MediaKind;

/// Root-relative prefix every stored image reference starts with.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// A validated image reference of the form `/uploads/<kind>/<file>`.
///
/// References come back from the database, so they are re-validated before
/// any filesystem access to keep deletes inside the uploads tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPath(String);

impl MediaPath {
    /// Build the reference for a freshly named file.
    pub fn new(kind: MediaKind, file_name: &str) -> Self {
        Self(format!("{UPLOADS_PREFIX}{}/{file_name}", kind.dir()))
    }

    /// Parse and validate a stored reference.
    pub fn parse(reference: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidPath(reference.to_string());

        let rest = reference.strip_prefix(UPLOADS_PREFIX).ok_or_else(invalid)?;
        if rest.len() > 512 {
            return Err(invalid());
        }
        if rest.chars().any(|c| c == '\\' || c.is_ascii_control()) {
            return Err(invalid());
        }

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() != 2 {
            return Err(invalid());
        }
        for segment in &segments {
            if segment.is_empty() || segment.starts_with('.') {
                return Err(invalid());
            }
        }

        Ok(Self(reference.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filesystem path relative to the public root.
    pub fn relative_path(&self) -> PathBuf {
        self.0.trim_start_matches('/').split('/').collect()
    }
}
