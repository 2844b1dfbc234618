use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::ImageFormat;
use sha2::{Digest, Sha256};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("No image data received")]
    Empty,
    #[error("Unsupported image format (expected JPG, PNG, WEBP or BMP)")]
    InvalidFormat,
    #[error("Image too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
}

/// An uploaded image checked and ready for transport.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub base64: String,
    pub sha256: String,
}

impl EncodedImage {
    pub fn from_bytes(image_data: &[u8], max_size: usize) -> Result<Self, CodecError> {
        validate_image_size(image_data, max_size)?;
        let mime_type = detect_mime_type(image_data)?;
        Ok(Self {
            mime_type,
            base64: encode(image_data),
            sha256: calculate_image_hash(image_data),
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }
}

pub fn encode(image_data: &[u8]) -> String {
    STANDARD.encode(image_data)
}

pub fn calculate_image_hash(image_data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image_data);
    hex::encode(hasher.finalize())
}

pub fn validate_image_size(image_data: &[u8], max_size: usize) -> Result<(), CodecError> {
    if image_data.is_empty() {
        return Err(CodecError::Empty);
    }
    if image_data.len() > max_size {
        return Err(CodecError::TooLarge {
            size: image_data.len(),
            limit: max_size,
        });
    }
    Ok(())
}

pub fn detect_mime_type(image_data: &[u8]) -> Result<&'static str, CodecError> {
    match image::guess_format(image_data) {
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(ImageFormat::WebP) => Ok("image/webp"),
        Ok(ImageFormat::Bmp) => Ok("image/bmp"),
        _ => Err(CodecError::InvalidFormat),
    }
}
