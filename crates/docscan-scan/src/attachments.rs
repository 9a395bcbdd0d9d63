// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Captured images and the uploadable files they become.

use chrono::{DateTime, Utc};
use docscan_core::CaptureKind;
use docscan_core::error::Result;
use docscan_vision::image::encode_png;
use image::DynamicImage;

pub const PNG_MIME: &str = "image/png";

/// A finished capture waiting in the session's collection.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub image: DynamicImage,
    pub kind: CaptureKind,
    /// Whether perspective correction was applied.
    pub rectified: bool,
    pub captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn new(image: DynamicImage, kind: CaptureKind, rectified: bool) -> Self {
        Self {
            image,
            kind,
            rectified,
            captured_at: Utc::now(),
        }
    }
}

/// A PNG file ready to hand to an uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Encode the capture at position `index` of its collection.
    pub fn from_captured(index: usize, captured: &CapturedImage) -> Result<Self> {
        Ok(Self {
            file_name: format!("captured_{}_{index}.png", captured.kind.file_label()),
            mime_type: PNG_MIME.to_owned(),
            bytes: encode_png(&captured.image)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn attachment_is_named_by_kind_and_position() {
        let scan = CapturedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(4, 4)), CaptureKind::DocumentScan, true);
        let photo = CapturedImage::new(DynamicImage::ImageRgba8(RgbaImage::new(4, 4)), CaptureKind::PlainPhoto, false);

        let a = Attachment::from_captured(0, &scan).expect("encode");
        let b = Attachment::from_captured(1, &photo).expect("encode");
        assert_eq!(a.file_name, "captured_scan_0.png");
        assert_eq!(b.file_name, "captured_photo_1.png");
        assert_eq!(a.mime_type, "image/png");
        assert!(a.bytes.starts_with(b"\x89PNG"));
    }
}
