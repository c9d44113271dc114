use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::ecg::EcgImage;

#[derive(Clone)]
pub struct UploadService {
    upload_dir: PathBuf,
    max_size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PNG encoding error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("File too large")]
    FileTooLarge,
}

/// A normalized upload written to disk. `png` holds the exact bytes that were stored.
pub struct StoredUpload {
    pub id: Uuid,
    pub path: PathBuf,
    pub image_hash: String,
    pub png: Vec<u8>,
}

impl UploadService {
    pub fn new(upload_dir: impl Into<PathBuf>, max_size: usize) -> Result<Self, UploadServiceError> {
        let upload_dir = upload_dir.into();
        fs::create_dir_all(&upload_dir)?;
        Ok(Self {
            upload_dir,
            max_size,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn calculate_image_hash(image_data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(image_data);
        hex::encode(hasher.finalize())
    }

    pub fn generate_file_name(id: Uuid) -> String {
        format!("{}.png", id)
    }

    pub fn validate_image_size(&self, image_data: &[u8]) -> Result<(), UploadServiceError> {
        if image_data.len() > self.max_size {
            return Err(UploadServiceError::FileTooLarge);
        }
        Ok(())
    }

    /// Re-encodes the decoded upload as PNG and saves it under a fresh id.
    pub fn store(&self, image: &EcgImage) -> Result<StoredUpload, UploadServiceError> {
        let png = image.encode_png()?;
        let id = Uuid::new_v4();
        let path = self.upload_dir.join(Self::generate_file_name(id));
        fs::write(&path, &png)?;

        let image_hash = Self::calculate_image_hash(&png);
        log::info!(
            "Stored {:?} upload as {} ({}x{}, {} bytes, sha256 {})",
            image.format(),
            path.display(),
            image.width(),
            image.height(),
            png.len(),
            image_hash
        );

        Ok(StoredUpload {
            id,
            path,
            image_hash,
            png,
        })
    }
}
