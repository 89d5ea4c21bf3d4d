//! Product image storage on S3
//!
//! Uploads are validated, re-encoded to JPEG and stored under their SHA-256
//! content hash: `s3://{bucket}/images/{hash}.jpg`. Uploading the same
//! picture twice yields the same key.

use aws_sdk_s3::Client as S3Client;
use image::codecs::jpeg::JpegEncoder;
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};
use std::io::Cursor;

/// Maximum file size (20MB)
pub const MAX_FILE_SIZE: usize = 20 * 1024 * 1024;

const JPEG_QUALITY: u8 = 85;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

fn s3_image_key(hash: &str) -> String {
    format!("images/{hash}.jpg")
}

/// Hex SHA-256, the only accepted form of an image key
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit())
}

/// Size and extension checks, before decoding anything
pub fn validate_upload(data: &[u8], filename: &str) -> Result<(), AppError> {
    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large: {} bytes (max {MAX_FILE_SIZE})", data.len()),
        ));
    }

    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!(
                "Unsupported format '{ext}'. Supported: {}",
                SUPPORTED_FORMATS.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Decode and re-encode as JPEG
pub fn compress_to_jpeg(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}"))
    })?;

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
        AppError::with_message(
            ErrorCode::ImageProcessingFailed,
            format!("Image compression failed: {e}"),
        )
    })?;
    Ok(buffer)
}

pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Stored image
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredImage {
    pub hash: String,
    pub url: String,
}

#[derive(Clone)]
pub struct ImageStorage {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl ImageStorage {
    pub fn new(client: S3Client, bucket: String, base_url: String) -> Self {
        Self {
            client,
            bucket,
            base_url,
        }
    }

    pub fn public_url(&self, hash: &str) -> String {
        format!("{}/{}", self.base_url, s3_image_key(hash))
    }

    /// Validate, compress and upload; returns the content hash and public URL.
    pub async fn upload(&self, data: &[u8], filename: &str) -> Result<StoredImage, AppError> {
        validate_upload(data, filename)?;
        let jpeg = compress_to_jpeg(data)?;
        let hash = content_hash(&jpeg);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(s3_image_key(&hash))
            .body(jpeg.into())
            .content_type("image/jpeg")
            .send()
            .await
            .map_err(|e| {
                tracing::error!(hash = %hash, error = %e, "S3 upload failed");
                AppError::new(ErrorCode::FileStorageFailed)
            })?;

        tracing::info!(hash = %hash, "Product image uploaded to S3");
        Ok(StoredImage {
            url: self.public_url(&hash),
            hash,
        })
    }

    pub async fn delete(&self, hash: &str) -> Result<(), AppError> {
        if !is_valid_hash(hash) {
            return Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                "Invalid image hash",
            ));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(s3_image_key(hash))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(hash = %hash, error = %e, "S3 delete failed");
                AppError::new(ErrorCode::FileStorageFailed)
            })?;

        tracing::info!(hash = %hash, "Product image deleted from S3");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    /// 8x8 PNG written through a temp file the way a browser upload arrives
    fn sample_png() -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8 * 30, y as u8 * 30, 128]));
        img.save_with_format(&path, ImageFormat::Png).unwrap();
        std::fs::read(&path).unwrap()
    }

    #[test]
    fn test_validate_upload() {
        let png = sample_png();
        assert!(validate_upload(&png, "shirt.PNG").is_ok());
        assert_eq!(
            validate_upload(&png, "shirt.gif").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            validate_upload(&png, "no-extension").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            validate_upload(&[], "shirt.png").unwrap_err().code,
            ErrorCode::EmptyFile
        );
    }

    #[test]
    fn test_oversized_upload() {
        let data = vec![0u8; MAX_FILE_SIZE + 1];
        assert_eq!(
            validate_upload(&data, "big.jpg").unwrap_err().code,
            ErrorCode::FileTooLarge
        );
    }

    #[test]
    fn test_compress_produces_jpeg() {
        let jpeg = compress_to_jpeg(&sample_png()).unwrap();
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            ImageFormat::Jpeg
        );
        // same input, same key
        assert_eq!(
            content_hash(&jpeg),
            content_hash(&compress_to_jpeg(&sample_png()).unwrap())
        );
    }

    #[test]
    fn test_garbage_is_not_an_image() {
        let err = compress_to_jpeg(b"definitely not a picture").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidImageFile);
    }

    #[test]
    fn test_hash_format() {
        let hash = content_hash(b"abc");
        assert!(is_valid_hash(&hash));
        assert!(!is_valid_hash("../../etc/passwd"));
        assert!(!is_valid_hash(&hash[..63]));
    }
}
