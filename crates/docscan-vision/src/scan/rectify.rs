// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification and legibility enhancement of a document region.

use docscan_core::error::{Result, ScanError};
use docscan_core::{EnhancementLevel, Frame, PixelPoint};
use image::DynamicImage;
use tracing::{debug, info, instrument};

use crate::backend::VisionBackend;
use crate::coords::sort_corners;

/// Straightens a document quadrilateral into an upright raster.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectificationEngine;

impl RectificationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Warp the region bounded by `corners` onto the full frame and enhance it.
    ///
    /// Corners may arrive in any order; they are sorted before solving. The
    /// output has the source frame's dimensions. A quadrilateral with no
    /// solvable transform fails with `RectificationFailed`.
    #[instrument(skip_all, fields(
        backend = backend.name(),
        width = frame.width(),
        height = frame.height(),
        level = level.level(),
    ))]
    pub fn rectify(
        &self,
        backend: &dyn VisionBackend,
        frame: &Frame,
        corners: [PixelPoint; 4],
        level: EnhancementLevel,
    ) -> Result<DynamicImage> {
        if frame.is_empty() {
            return Err(ScanError::RectificationFailed("source frame is empty".into()));
        }

        let (width, height) = (frame.width(), frame.height());
        let sorted = sort_corners(corners);
        let src = sorted.map(PixelPoint::as_tuple);
        let (w, h) = (width as f32, height as f32);
        let dest = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let warped = {
            let projection = backend.perspective_transform(src, dest)?;
            backend.warp_perspective(frame.as_rgba(), &projection, width, height)?
        };
        debug!(corners = ?sorted, "Perspective correction applied");

        let output = match level {
            EnhancementLevel::None => DynamicImage::ImageRgba8(warped.into_inner()),
            EnhancementLevel::Binarized => {
                let gray = backend.to_grayscale(&warped)?;
                let binary = backend.adaptive_threshold(&gray, 11, 2.0)?;
                DynamicImage::ImageLuma8(binary.into_inner())
            }
            EnhancementLevel::DenoisedBinarized => {
                let gray = backend.to_grayscale(&warped)?;
                let denoised = backend.median_blur(&gray, 5)?;
                let binary = backend.adaptive_threshold(&denoised, 15, 5.0)?;
                DynamicImage::ImageLuma8(binary.into_inner())
            }
        };

        info!(width, height, "Document rectified");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ImageprocBackend;
    use crate::testing::document_frame;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn page_corners() -> [PixelPoint; 4] {
        // Deliberately out of order.
        [
            PixelPoint::new(260.0, 200.0),
            PixelPoint::new(40.0, 30.0),
            PixelPoint::new(50.0, 190.0),
            PixelPoint::new(270.0, 40.0),
        ]
    }

    #[test]
    fn output_matches_source_dimensions() {
        let backend = ImageprocBackend::new();
        let frame = document_frame(320, 240, [(40.0, 30.0), (270.0, 40.0), (260.0, 200.0), (50.0, 190.0)]);
        for level in [EnhancementLevel::None, EnhancementLevel::Binarized, EnhancementLevel::DenoisedBinarized] {
            let out = RectificationEngine::new()
                .rectify(&backend, &frame, page_corners(), level)
                .expect("rectify");
            assert_eq!(out.dimensions(), (320, 240), "level {level:?}");
        }
        assert_eq!(backend.ledger().live(), 0);
    }

    #[test]
    fn no_enhancement_keeps_colour() {
        let backend = ImageprocBackend::new();
        let frame = Frame::new(RgbaImage::from_pixel(64, 48, Rgba([200, 40, 40, 255])));
        let corners = [
            PixelPoint::new(0.0, 0.0),
            PixelPoint::new(64.0, 0.0),
            PixelPoint::new(64.0, 48.0),
            PixelPoint::new(0.0, 48.0),
        ];
        let out = RectificationEngine::new()
            .rectify(&backend, &frame, corners, EnhancementLevel::None)
            .expect("rectify");
        let centre = out.get_pixel(32, 24);
        assert_eq!(centre, Rgba([200, 40, 40, 255]));
    }

    #[test]
    fn enhanced_output_is_two_tone() {
        let backend = ImageprocBackend::new();
        let frame = document_frame(320, 240, [(40.0, 30.0), (270.0, 40.0), (260.0, 200.0), (50.0, 190.0)]);
        for level in [EnhancementLevel::Binarized, EnhancementLevel::DenoisedBinarized] {
            let out = RectificationEngine::new()
                .rectify(&backend, &frame, page_corners(), level)
                .expect("rectify");
            let luma = out.as_luma8().expect("enhanced output is grayscale");
            assert!(luma.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255), "level {level:?}");
        }
    }

    #[test]
    fn collapsed_quad_is_a_rectification_failure() {
        let backend = ImageprocBackend::new();
        let frame = document_frame(100, 100, [(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)]);
        let line = [PixelPoint::new(5.0, 5.0); 4];
        let err = RectificationEngine::new()
            .rectify(&backend, &frame, line, EnhancementLevel::None)
            .unwrap_err();
        assert!(matches!(err, ScanError::RectificationFailed(_)));
        assert_eq!(backend.ledger().live(), 0);
    }
}
