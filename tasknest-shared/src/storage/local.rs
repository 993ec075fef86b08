/// Filesystem-backed object store
///
/// Objects are written to `<root>/<bucket>/<path>`. Writes go to a sibling
/// `.part` file and are renamed into place. The content type is recovered
/// from the file extension on read.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{validate_path, ImageKind, ObjectStore, StorageError, StoredObject, BUCKET};

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    bucket_dir: PathBuf,
}

impl LocalObjectStore {
    /// Store rooted at `root`, using the attachment bucket
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_bucket(root, BUCKET)
    }

    pub fn with_bucket(root: impl AsRef<Path>, bucket: &str) -> Self {
        Self {
            bucket_dir: root.as_ref().join(bucket),
        }
    }

    /// Directory holding this bucket's objects
    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let segments = validate_path(path)?;
        Ok(segments
            .into_iter()
            .fold(self.bucket_dir.clone(), |dir, segment| dir.join(segment)))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: Bytes) -> Result<(), StorageError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = target.clone().into_os_string();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %path, size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StorageError> {
        let target = self.resolve(path)?;

        let bytes = match tokio::fs::read(&target).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let content_type = ImageKind::from_file_name(path)
            .map(|kind| kind.content_type())
            .unwrap_or("application/octet-stream");

        Ok(Some(StoredObject::new(Bytes::from(bytes), content_type)))
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.resolve(path)?;

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                debug!(path = %path, "Deleted object");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
