//! Filesystem adapter for ImageStore
//!
//! Layout: `<root>/projects/<file>` and `<root>/recipes/<file>`, where every
//! file name is `<uuid>_<sanitised original name>`.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use uuid::Uuid;

use crate::domain::entities::ImageOwner;
use crate::domain::ports::ImageStore;
use crate::error::StorageError;

/// Used when nothing of the original name survives sanitising
const FALLBACK_NAME: &str = "image";

/// Longest sanitised name kept from the client's file name
const MAX_NAME_LEN: usize = 100;

/// Image store writing plain files with `tokio::fs`
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, owner: ImageOwner) -> PathBuf {
        self.root.join(owner.directory())
    }

    /// Path of a stored file; names that could leave the owner directory are unknown
    fn path(&self, owner: ImageOwner, file_name: &str) -> Result<PathBuf, StorageError> {
        if file_name.is_empty()
            || file_name.contains(['/', '\\'])
            || file_name == "."
            || file_name == ".."
        {
            return Err(not_found(owner, file_name));
        }
        Ok(self.dir(owner).join(file_name))
    }
}

fn not_found(owner: ImageOwner, name: &str) -> StorageError {
    StorageError::NotFound {
        owner,
        name: name.to_string(),
    }
}

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid file name pattern"));

/// Reduce a client supplied file name to a safe base name.
///
/// Directory parts are dropped, runs of characters outside `[A-Za-z0-9._-]`
/// become a single `_` and leading dots are removed.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = UNSAFE_CHARS
        .replace_all(base, "_")
        .trim_start_matches('.')
        .chars()
        .take(MAX_NAME_LEN)
        .collect();

    if cleaned.is_empty() || cleaned == "_" {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(
        &self,
        owner: ImageOwner,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let dir = self.dir(owner);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        tracing::debug!("Stored {} image {} ({} bytes)", owner, file_name, bytes.len());
        Ok(file_name)
    }

    async fn load(&self, owner: ImageOwner, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(owner, file_name)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(owner, file_name),
            _ => StorageError::Io(e),
        })
    }

    async fn exists(&self, owner: ImageOwner, file_name: &str) -> Result<bool, StorageError> {
        let Ok(path) = self.path(owner, file_name) else {
            return Ok(false);
        };
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, owner: ImageOwner, file_name: &str) -> Result<(), StorageError> {
        let path = self.path(owner, file_name)?;
        tokio::fs::remove_file(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(owner, file_name),
            _ => StorageError::Io(e),
        })?;

        tracing::debug!("Deleted {} image {}", owner, file_name);
        Ok(())
    }
}
