// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec helpers: source images in, PNG attachments out.

use std::io::Cursor;
use std::path::Path;

use docscan_core::Frame;
use docscan_core::error::{Result, ScanError};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};

/// Encode an output image as PNG.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| ScanError::ImageError(format!("PNG encoding failed: {err}")))?;
    debug!(bytes = buffer.len(), "PNG encoded");
    Ok(buffer)
}

/// Decode image bytes (PNG, JPEG, ...) into a frame.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode_frame(data: &[u8]) -> Result<Frame> {
    let image = image::load_from_memory(data)
        .map_err(|err| ScanError::ImageError(format!("failed to decode image: {err}")))?;
    Ok(Frame::new(image.to_rgba8()))
}

/// Read and decode an image file into a frame.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_frame(path: impl AsRef<Path>) -> Result<Frame> {
    let image = image::open(path.as_ref()).map_err(|err| {
        ScanError::ImageError(format!(
            "failed to open image {}: {err}",
            path.as_ref().display()
        ))
    })?;
    debug!(width = image.width(), height = image.height(), "Image loaded");
    Ok(Frame::new(image.to_rgba8()))
}
