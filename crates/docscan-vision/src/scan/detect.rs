// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection: finds the best-fit quadrilateral in a frame.

use docscan_core::error::Result;
use docscan_core::{DetectionResult, EdgeSensitivity, Frame, PixelPoint};
use tracing::{debug, instrument, trace};

use crate::backend::VisionBackend;
use crate::coords::sort_corners;

/// Side of the pre-threshold Gaussian blur kernel.
const BLUR_KERNEL: u32 = 5;
/// Adaptive threshold neighbourhood and offset.
const THRESHOLD_BLOCK: u32 = 11;
const THRESHOLD_C: f32 = 2.0;
/// Side of the square structuring element used to close edge gaps.
const MORPH_KERNEL: u32 = 3;
/// Contours enclosing less than this share of the frame are ignored.
const MIN_AREA_RATIO: f64 = 0.20;
/// Polygon approximation tolerance as a share of the contour perimeter.
const APPROX_RATIO: f64 = 0.02;

/// Finds a four-cornered document outline in camera frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentDetector {
    sensitivity: EdgeSensitivity,
}

impl DocumentDetector {
    pub fn new(sensitivity: EdgeSensitivity) -> Self {
        Self { sensitivity }
    }

    pub fn sensitivity(&self) -> EdgeSensitivity {
        self.sensitivity
    }

    pub fn set_sensitivity(&mut self, sensitivity: EdgeSensitivity) {
        self.sensitivity = sensitivity;
    }

    /// Run one detection pass over `frame`.
    ///
    /// Every buffer the backend allocates is dropped before this returns,
    /// whether detection succeeds, finds nothing, or fails part way.
    #[instrument(skip_all, fields(
        backend = backend.name(),
        width = frame.width(),
        height = frame.height(),
        sensitivity = self.sensitivity.value(),
    ))]
    pub fn detect(&self, backend: &dyn VisionBackend, frame: &Frame) -> Result<DetectionResult> {
        if frame.is_empty() {
            debug!("Empty frame; nothing to detect");
            return Ok(DetectionResult::NotFound);
        }

        let closed = {
            let gray = backend.to_grayscale(frame.as_rgba())?;
            let blurred = backend.gaussian_blur(&gray, BLUR_KERNEL)?;
            let binary = backend.adaptive_threshold(&blurred, THRESHOLD_BLOCK, THRESHOLD_C)?;
            let (low, high) = self.sensitivity.thresholds();
            let edges = backend.canny(&binary, low, high)?;
            let dilated = backend.dilate(&edges, MORPH_KERNEL)?;
            backend.erode(&dilated, MORPH_KERNEL)?
        };

        let contours = backend.external_contours(&closed)?;
        let min_area = frame.area() * MIN_AREA_RATIO;
        trace!(contours = contours.len(), min_area, "Contours extracted");

        let mut best: Option<([PixelPoint; 4], f64)> = None;
        for contour in contours.iter() {
            let area = backend.contour_area(contour);
            if area < min_area {
                continue;
            }

            let perimeter = backend.arc_length(contour, true);
            let polygon = backend.approx_polygon(contour, perimeter * APPROX_RATIO)?;
            if polygon.len() != 4 {
                trace!(vertices = polygon.len(), area, "Large contour is not a quadrilateral");
                continue;
            }

            let larger = match best {
                Some((_, best_area)) => area > best_area,
                None => true,
            };
            if larger {
                let corners = [
                    PixelPoint::new(polygon[0].x as f32, polygon[0].y as f32),
                    PixelPoint::new(polygon[1].x as f32, polygon[1].y as f32),
                    PixelPoint::new(polygon[2].x as f32, polygon[2].y as f32),
                    PixelPoint::new(polygon[3].x as f32, polygon[3].y as f32),
                ];
                best = Some((corners, area));
            }
        }

        match best {
            Some((corners, area)) => {
                let corners = sort_corners(corners);
                debug!(area, ?corners, "Document detected");
                Ok(DetectionResult::Found { corners, area })
            }
            None => {
                debug!("No document quadrilateral in frame");
                Ok(DetectionResult::NotFound)
            }
        }
    }
}
