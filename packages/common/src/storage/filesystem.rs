use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use super::error::StorageError;
use super::kind::MediaKind;
use super::path::MediaPath;
use super::traits::MediaStore;

/// Filesystem-backed media store.
///
/// Files live under `{public_root}/uploads/{kind}/{uuid}.{ext}`, so the
/// reference returned by [`MediaStore::store`] doubles as the URL path below
/// the static file mount.
pub struct FilesystemMediaStore {
    public_root: PathBuf,
    max_size: u64,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store.
    pub async fn new(public_root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        let uploads = public_root.join("uploads");
        fs::create_dir_all(uploads.join(".tmp")).await?;
        for kind in [MediaKind::Venue, MediaKind::Activity] {
            fs::create_dir_all(uploads.join(kind.dir())).await?;
        }
        Ok(Self {
            public_root,
            max_size,
        })
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    /// Resolve a reference to its location on disk.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, StorageError> {
        let path = MediaPath::parse(reference)?;
        Ok(self.public_root.join(path.relative_path()))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.public_root
            .join("uploads")
            .join(".tmp")
            .join(Uuid::new_v4().to_string())
    }
}

fn normalize_extension(extension: &str) -> Result<String, StorageError> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidExtension(extension.to_string()));
    }
    Ok(ext)
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn store(
        &self,
        kind: MediaKind,
        data: &[u8],
        extension: &str,
    ) -> Result<String, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let ext = normalize_extension(extension)?;
        let reference = MediaPath::new(kind, &format!("{}.{ext}", Uuid::new_v4()));
        let target = self.public_root.join(reference.relative_path());

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(reference = %reference.as_str(), size = data.len(), "Stored media");
        Ok(reference.as_str().to_string())
    }

    async fn delete(&self, reference: &str) -> Result<bool, StorageError> {
        let path = self.resolve(reference)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, reference: &str) -> Result<bool, StorageError> {
        let path = self.resolve(reference)?;
        Ok(fs::try_exists(&path).await?)
    }
}
