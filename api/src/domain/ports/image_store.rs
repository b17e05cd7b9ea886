//! Image store port trait
//!
//! Binary image files are kept outside of the database; only their file
//! names are stored with the owning project or recipe.

use async_trait::async_trait;

use crate::domain::entities::ImageOwner;
use crate::error::StorageError;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image under a fresh unique file name derived from `original_name`.
    /// Returns the stored file name.
    async fn save(
        &self,
        owner: ImageOwner,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError>;

    /// Read a stored image
    async fn load(&self, owner: ImageOwner, file_name: &str) -> Result<Vec<u8>, StorageError>;

    /// Whether a stored image is present
    async fn exists(&self, owner: ImageOwner, file_name: &str) -> Result<bool, StorageError>;

    /// Delete a stored image
    async fn delete(&self, owner: ImageOwner, file_name: &str) -> Result<(), StorageError>;
}
