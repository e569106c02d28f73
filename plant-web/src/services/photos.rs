use base64::{engine::general_purpose::STANDARD, Engine};
use service_core::error::AppError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Invalid photo data")]
    InvalidData,

    #[error("Invalid photo name: {0}")]
    InvalidName(String),

    #[error("Photo storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw image bytes recovered from a browser data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPhoto {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DecodedPhoto {
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }
}

/// Where a photo landed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPhoto {
    pub filepath: String,
    pub filename: String,
}

/// Decode `data:<mime>;base64,<payload>` into bytes.
///
/// Only the part after the first comma is decoded. A missing comma, a bad
/// payload or an empty image are all rejected.
pub fn decode_photo(data_url: &str) -> Result<DecodedPhoto, PhotoError> {
    let (header, payload) = data_url.split_once(',').ok_or(PhotoError::InvalidData)?;

    let mime_type = header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_ascii_lowercase();

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| PhotoError::InvalidData)?;

    if bytes.is_empty() {
        return Err(PhotoError::InvalidData);
    }

    Ok(DecodedPhoto { mime_type, bytes })
}

/// Photos kept as flat files in one directory.
pub struct PhotoStore {
    base_path: PathBuf,
}

impl PhotoStore {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Write the photo under a fresh UUID name.
    pub async fn save(&self, photo: &DecodedPhoto) -> Result<SavedPhoto, PhotoError> {
        let filename = format!("{}.{}", Uuid::new_v4(), photo.extension());
        let path = self.base_path.join(&filename);

        fs::write(&path, &photo.bytes).await?;

        tracing::debug!(filename = %filename, size = photo.bytes.len(), "Photo saved");

        Ok(SavedPhoto {
            filepath: path.to_string_lossy().into_owned(),
            filename,
        })
    }

    /// Remove a stored photo. Already-missing files are fine.
    pub async fn delete(&self, filename: &str) -> Result<(), PhotoError> {
        let path = self.resolve(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf, PhotoError> {
        let is_plain_name = !filename.is_empty()
            && filename != "."
            && filename != ".."
            && !filename.contains(['/', '\\']);

        if !is_plain_name {
            return Err(PhotoError::InvalidName(filename.to_string()));
        }

        Ok(self.base_path.join(filename))
    }
}
