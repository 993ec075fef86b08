/// Attachment storage
///
/// Task images live in a single bucket, `task-attachments`, keyed by
/// `{user_id}/{task_id}.{ext}`. The [`ObjectStore`] trait is the seam between
/// the API and the backing store; [`LocalObjectStore`] keeps objects on the
/// local filesystem.
///
/// # Example
///
/// ```no_run
/// use bytes::Bytes;
/// use tasknest_shared::storage::{attachment_path, ImageKind, LocalObjectStore, ObjectStore};
/// # use uuid::Uuid;
///
/// # async fn example(user_id: Uuid, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalObjectStore::new("./storage");
/// let kind = ImageKind::detect(Some("image/png"), None).ok_or("unsupported")?;
/// let path = attachment_path(user_id, task_id, kind);
///
/// store.put(&path, Bytes::from_static(b"\x89PNG")).await?;
/// assert!(store.get(&path).await?.is_some());
/// # Ok(())
/// # }
/// ```

mod local;

pub use local::LocalObjectStore;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Bucket holding task images
pub const BUCKET: &str = "task-attachments";

/// Default upload limit (1 MiB)
pub const MAX_ATTACHMENT_BYTES: usize = 1024 * 1024;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Object path is empty, absolute, or escapes the bucket
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    /// Upload exceeds the size limit
    #[error("File size must be less than {}", format_limit(.limit))]
    TooLarge { size: usize, limit: usize },

    /// Content type is not an accepted image format
    #[error("Unsupported file type: {0}. Only JPEG and PNG images are allowed")]
    UnsupportedType(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_limit(limit: &usize) -> String {
    let limit = *limit;
    if limit % (1024 * 1024) == 0 {
        format!("{}MB", limit / (1024 * 1024))
    } else if limit % 1024 == 0 {
        format!("{}KB", limit / 1024)
    } else {
        format!("{} bytes", limit)
    }
}

/// A stored object with its metadata
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,

    /// Hex SHA-256 of the content
    pub etag: String,
}

impl StoredObject {
    pub fn new(bytes: Bytes, content_type: impl Into<String>) -> Self {
        let etag = hex::encode(Sha256::digest(&bytes));
        Self {
            bytes,
            content_type: content_type.into(),
            etag,
        }
    }
}

/// Backing store for attachment objects
///
/// Paths are relative to the attachment bucket and use `/` separators.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes an object, replacing any existing one at `path`
    ///
    /// The content type served back is derived from the path's extension.
    async fn put(&self, path: &str, bytes: Bytes) -> Result<(), StorageError>;

    /// Reads an object, `None` if it does not exist
    async fn get(&self, path: &str) -> Result<Option<StoredObject>, StorageError>;

    /// Removes an object, returning whether it existed
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;
}

/// Image formats accepted as task attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageKind::Jpeg),
            "image/png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// Accepts the extension of a file name or object path
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            _ => None,
        }
    }

    /// Uses the declared content type, falling back to the file name
    ///
    /// A generic `application/octet-stream` declaration defers to the file name.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        match content_type {
            Some(ct) if !ct.starts_with("application/octet-stream") => Self::from_content_type(ct),
            _ => file_name.and_then(Self::from_file_name),
        }
    }
}

/// Object path of a task's attachment
pub fn attachment_path(user_id: Uuid, task_id: Uuid, kind: ImageKind) -> String {
    format!("{}/{}.{}", user_id, task_id, kind.extension())
}

/// Rejects uploads larger than `limit`
pub fn check_size(size: usize, limit: usize) -> Result<(), StorageError> {
    if size > limit {
        return Err(StorageError::TooLarge { size, limit });
    }
    Ok(())
}

/// Splits an object path into safe segments
///
/// Rejects empty paths, absolute paths, backslashes, and any `.`, `..`, or
/// empty segment.
pub fn validate_path(path: &str) -> Result<Vec<&str>, StorageError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\0'))
    {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    Ok(segments)
}
