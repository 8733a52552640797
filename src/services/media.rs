// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Preparation of uploaded photos and video for the generative model.
//!
//! Uploads arrive as base64, optionally wrapped in a `data:<mime>;base64,`
//! URL. JPEG, PNG and WebP images in RGB or grayscale are forwarded as-is;
//! anything else is decoded, converted to RGB and re-encoded as PNG.

use crate::services::oracle::Part;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

pub const VIDEO_MIME_TYPE: &str = "video/mp4";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Unreadable image: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
}

/// Strip a data-URL header, keeping only the base64 payload.
pub fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>, MediaError> {
    Ok(STANDARD.decode(strip_data_url(payload).trim())?)
}

/// Decode one uploaded image into a model part.
pub fn prepare_image(payload: &str) -> Result<Part, MediaError> {
    let bytes = decode_base64(payload)?;
    let reader = ImageReader::new(Cursor::new(&bytes)).with_guessed_format()?;
    let format = reader.format();
    let image = reader.decode()?;

    let passthrough = matches!(
        format,
        Some(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP)
    ) && matches!(image.color(), ColorType::Rgb8 | ColorType::L8);

    if let Some(format) = format.filter(|_| passthrough) {
        return Ok(Part::InlineData {
            mime_type: format.to_mime_type().to_string(),
            data: bytes,
        });
    }

    tracing::debug!(
        format = ?format,
        color = ?image.color(),
        width = image.width(),
        height = image.height(),
        "Converting image to RGB PNG"
    );

    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(Part::InlineData {
        mime_type: "image/png".to_string(),
        data: png,
    })
}

/// Decode an uploaded video clip into a model part.
pub fn prepare_video(payload: &str) -> Result<Part, MediaError> {
    Ok(Part::InlineData {
        mime_type: VIDEO_MIME_TYPE.to_string(),
        data: decode_base64(payload)?,
    })
}

/// Prepare every decodable image; failures are logged and skipped.
pub fn prepare_images(payloads: &[String]) -> Vec<Part> {
    payloads
        .iter()
        .enumerate()
        .filter_map(|(index, payload)| match prepare_image(payload) {
            Ok(part) => Some(part),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping unreadable image");
                None
            }
        })
        .collect()
}
