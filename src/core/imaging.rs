use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageOutputFormat};

use crate::error::{AppError, Result};

/// JPEG quality for the re-encoded copy of the input image returned to the
/// caller.
const JPEG_QUALITY: u8 = 90;

/// Decode an in-memory byte buffer into an image.
///
/// The result is always 3-channel RGB, whatever the source color mode
/// (grayscale, RGBA, palette), so every downstream stage sees one layout.
///
/// # Errors
///
/// Returns an image error if the bytes are not a supported image format.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    let image = image::load_from_memory(bytes)?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Fetch an image over HTTP and decode it.
///
/// The request timeout is carried by `client`. A non-success status is a
/// fetch error; an undecodable body is an image error.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<DynamicImage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Fetch(format!("failed to fetch {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Fetch(format!(
            "fetching {} returned status {}",
            url, status
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AppError::Fetch(format!("failed to read body of {}: {}", url, e)))?;

    decode_image(&bytes)
}

/// Re-encode a decoded image as JPEG and return it base64-encoded.
///
/// The caller gets back exactly what was processed, color normalization
/// included.
pub fn to_jpeg_base64(image: &DynamicImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(BASE64.encode(buffer.into_inner()))
}
