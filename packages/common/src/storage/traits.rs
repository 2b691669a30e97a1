use async_trait::async_trait;

use super::error::StorageError;
use super::kind::MediaKind;

/// Storage for uploaded images, addressed by generated opaque names.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under a fresh opaque name and return the root-relative
    /// reference (`/uploads/<kind>/<id>.<ext>`).
    async fn store(
        &self,
        kind: MediaKind,
        data: &[u8],
        extension: &str,
    ) -> Result<String, StorageError>;

    /// Delete a stored image by reference.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, reference: &str) -> Result<bool, StorageError>;

    /// Check whether a stored image exists.
    async fn exists(&self, reference: &str) -> Result<bool, StorageError>;
}
