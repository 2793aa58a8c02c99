//! Recipe images: decoding of `data:` URIs and storage under the media root.

use std::{io, path::PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use thiserror::Error;
use tracing::debug;

use crate::digest::sha256_hex;

const RECIPE_IMAGES: &str = "recipes/images";

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("not a base64 data URI")]
    NotDataUri,

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("unrecognized image format")]
    UnknownFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// Decodes `data:image/<subtype>;base64,<payload>`.
    pub fn from_data_uri(data: &str) -> Result<Self, ImageError> {
        let (header, payload) = data.split_once(";base64,").ok_or(ImageError::NotDataUri)?;
        if !header.starts_with("data:") {
            return Err(ImageError::NotDataUri);
        }

        let bytes = STANDARD.decode(payload.trim())?;
        let format = image::guess_format(&bytes).map_err(|_| ImageError::UnknownFormat)?;

        Ok(Self { format, bytes })
    }

    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }

    /// Content-addressed, so re-uploading the same picture reuses the file.
    pub fn file_name(&self) -> String {
        format!("{}.{}", sha256_hex(&[&self.bytes]), self.extension())
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Writes the image and returns its public URL.
    pub async fn save_recipe_image(&self, image: &DecodedImage) -> io::Result<String> {
        let directory = self.root.join(RECIPE_IMAGES);
        tokio::fs::create_dir_all(&directory).await?;

        let file_name = image.file_name();
        let path = directory.join(&file_name);
        if tokio::fs::try_exists(&path).await? {
            debug!("Image {file_name} already stored");
        } else {
            tokio::fs::write(&path, &image.bytes).await?;
            debug!("Stored image {}", path.display());
        }

        Ok(format!("{}{RECIPE_IMAGES}/{file_name}", self.base_url))
    }
}
