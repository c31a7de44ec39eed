//! Decoding and normalization of submitted photos.
//!
//! Every accepted photo is scaled down to fit inside 1280x720 (aspect ratio
//! kept) and re-encoded as JPEG at quality 75 before it reaches the vision
//! model.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};

pub const MAX_WIDTH: u32 = 1280;
pub const MAX_HEIGHT: u32 = 720;
const JPEG_QUALITY: u8 = 75;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PhotoError {
    #[error("Photo is required")]
    Missing,
    #[error("Photo is not valid base64")]
    NotBase64,
    #[error("Photo exceeds {0} bytes")]
    TooLarge(usize),
    #[error("Photo is not a supported image type")]
    UnsupportedType,
    #[error("Photo could not be decoded")]
    Undecodable,
    #[error("Failed to encode photo: {0}")]
    Encode(String),
}

/// A normalized JPEG photo, ready to hand to the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

impl Photo {
    /// Accepts raw base64 or a `data:<mime>;base64,<payload>` URL holding a
    /// JPEG, PNG, GIF or WebP image. The declared mime type is ignored.
    pub fn decode(raw: Option<&str>, max_bytes: usize) -> Result<Self, PhotoError> {
        let bytes = decode_payload(raw, max_bytes)?;

        let format = image::guess_format(&bytes).map_err(|_| PhotoError::UnsupportedType)?;
        if !matches!(
            format,
            ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP
        ) {
            return Err(PhotoError::UnsupportedType);
        }

        let image = image::load_from_memory_with_format(&bytes, format).map_err(|e| {
            tracing::debug!(error = %e, ?format, "Rejected undecodable photo");
            PhotoError::Undecodable
        })?;

        Self::normalize(&image)
    }

    fn normalize(image: &DynamicImage) -> Result<Self, PhotoError> {
        let fitted = if image.width() > MAX_WIDTH || image.height() > MAX_HEIGHT {
            image.resize(MAX_WIDTH, MAX_HEIGHT, FilterType::Lanczos3)
        } else {
            image.clone()
        };

        // JPEG has no alpha channel
        let rgb = fitted.to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| PhotoError::Encode(e.to_string()))?;

        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            jpeg,
        })
    }

    pub fn mime(&self) -> &'static str {
        "image/jpeg"
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.jpeg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jpeg.is_empty()
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime(), BASE64.encode(&self.jpeg))
    }
}

/// Strip an optional data URL prefix and base64-decode, enforcing the size cap.
fn decode_payload(raw: Option<&str>, max_bytes: usize) -> Result<Vec<u8>, PhotoError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(PhotoError::Missing)?;

    let payload = match raw.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, data)| data)
            .ok_or(PhotoError::NotBase64)?,
        None => raw,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(PhotoError::Missing);
    }

    // base64 grows data by 4/3; reject early before allocating
    if cleaned.len() / 4 * 3 > max_bytes + 3 {
        return Err(PhotoError::TooLarge(max_bytes));
    }

    let bytes = BASE64.decode(cleaned).map_err(|_| PhotoError::NotBase64)?;
    if bytes.is_empty() {
        return Err(PhotoError::Missing);
    }
    if bytes.len() > max_bytes {
        return Err(PhotoError::TooLarge(max_bytes));
    }
    Ok(bytes)
}
