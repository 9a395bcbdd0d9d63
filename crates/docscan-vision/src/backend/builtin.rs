// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in vision backend on top of the `image` and `imageproc` crates.

use docscan_core::error::{Result, ScanError};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use imageproc::morphology::{dilate, erode};
use imageproc::point::Point;

use super::{Buffer, BufferLedger, Contour, VisionBackend};

/// Pure-Rust backend, always available once the crate is linked.
#[derive(Debug, Default)]
pub struct ImageprocBackend {
    ledger: BufferLedger,
}

impl ImageprocBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VisionBackend for ImageprocBackend {
    fn name(&self) -> &str {
        "imageproc"
    }

    fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }

    fn to_grayscale(&self, src: &RgbaImage) -> Result<Buffer<GrayImage>> {
        Ok(self.ledger.track(image::imageops::grayscale(src)))
    }

    fn gaussian_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        let kernel = odd_kernel(kernel)?;
        Ok(self.ledger.track(gaussian_blur_f32(src, sigma_for_kernel(kernel))))
    }

    fn adaptive_threshold(&self, src: &GrayImage, block_size: u32, c: f32) -> Result<Buffer<GrayImage>> {
        let block_size = odd_kernel(block_size)?;
        if block_size < 3 {
            return Err(ScanError::Backend(format!(
                "adaptive threshold block size must be at least 3 (got {block_size})"
            )));
        }

        // Local Gaussian-weighted mean, same sigma rule as the blur.
        let local_mean = gaussian_blur_f32(src, sigma_for_kernel(block_size));
        let mut output = GrayImage::new(src.width(), src.height());
        for (x, y, pixel) in src.enumerate_pixels() {
            let threshold = local_mean.get_pixel(x, y).0[0] as f32 - c;
            let binary = if pixel.0[0] as f32 > threshold { 255u8 } else { 0u8 };
            output.put_pixel(x, y, Luma([binary]));
        }
        Ok(self.ledger.track(output))
    }

    fn canny(&self, src: &GrayImage, low: f32, high: f32) -> Result<Buffer<GrayImage>> {
        if !(low > 0.0 && high >= low) {
            return Err(ScanError::Backend(format!(
                "invalid edge thresholds (low {low}, high {high})"
            )));
        }
        Ok(self.ledger.track(canny(src, low, high)))
    }

    fn dilate(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        let radius = structuring_radius(kernel)?;
        Ok(self.ledger.track(dilate(src, Norm::LInf, radius)))
    }

    fn erode(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        let radius = structuring_radius(kernel)?;
        Ok(self.ledger.track(erode(src, Norm::LInf, radius)))
    }

    fn external_contours(&self, src: &GrayImage) -> Result<Buffer<Vec<Contour>>> {
        let contours = find_contours::<i32>(src)
            .into_iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .map(|contour| contour.points)
            .collect();
        Ok(self.ledger.track(contours))
    }

    fn contour_area(&self, contour: &[Point<i32>]) -> f64 {
        contour_area(contour)
    }

    fn arc_length(&self, contour: &[Point<i32>], closed: bool) -> f64 {
        arc_length(contour, closed)
    }

    fn approx_polygon(&self, contour: &[Point<i32>], epsilon: f64) -> Result<Buffer<Vec<Point<i32>>>> {
        if !(epsilon >= 0.0) {
            return Err(ScanError::Backend(format!("invalid approximation epsilon {epsilon}")));
        }
        // imageproc panics on an empty curve or a zero tolerance.
        let polygon = if contour.len() < 3 || epsilon == 0.0 {
            contour.to_vec()
        } else {
            approximate_polygon_dp(contour, epsilon, true)
        };
        Ok(self.ledger.track(polygon))
    }

    fn perspective_transform(&self, from: [(f32, f32); 4], to: [(f32, f32); 4]) -> Result<Buffer<Projection>> {
        if quad_area(&from) < 1.0 || quad_area(&to) < 1.0 {
            return Err(ScanError::RectificationFailed("corners enclose no area".into()));
        }
        let projection = Projection::from_control_points(from, to).ok_or_else(|| {
            ScanError::RectificationFailed("corners do not form a solvable quadrilateral".into())
        })?;
        Ok(self.ledger.track(projection))
    }

    fn warp_perspective(
        &self,
        src: &RgbaImage,
        transform: &Projection,
        width: u32,
        height: u32,
    ) -> Result<Buffer<RgbaImage>> {
        if width == 0 || height == 0 {
            return Err(ScanError::RectificationFailed(format!(
                "cannot warp into a {width}x{height} raster"
            )));
        }
        let mut output = RgbaImage::new(width, height);
        let background = Rgba([255u8, 255, 255, 255]);
        warp_into(src, transform, Interpolation::Bilinear, background, &mut output);
        Ok(self.ledger.track(output))
    }

    fn median_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        let kernel = odd_kernel(kernel)?;
        let radius = kernel / 2;
        Ok(self.ledger.track(median_filter(src, radius, radius)))
    }
}

// -- Helpers ------------------------------------------------------------------

fn odd_kernel(kernel: u32) -> Result<u32> {
    if kernel == 0 || kernel % 2 == 0 {
        return Err(ScanError::Backend(format!(
            "kernel size must be a positive odd number (got {kernel})"
        )));
    }
    Ok(kernel)
}

fn structuring_radius(kernel: u32) -> Result<u8> {
    let kernel = odd_kernel(kernel)?;
    u8::try_from(kernel / 2)
        .map_err(|_| ScanError::Backend(format!("structuring element {kernel} is too large")))
}

/// Sigma a Gaussian kernel of side `kernel` implies when no sigma is given:
/// `0.3 * ((k - 1) / 2 - 1) + 0.8`.
fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn quad_area(quad: &[(f32, f32); 4]) -> f64 {
    contour_area(&quad.map(|(x, y)| Point::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Border pixels of an axis-aligned rectangle, traced clockwise.
    fn rectangle_outline(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        let mut points = Vec::new();
        for x in x0..x1 {
            points.push(Point::new(x, y0));
        }
        for y in y0..y1 {
            points.push(Point::new(x1, y));
        }
        for x in (x0 + 1..=x1).rev() {
            points.push(Point::new(x, y1));
        }
        for y in (y0 + 1..=y1).rev() {
            points.push(Point::new(x0, y));
        }
        points
    }

    #[test]
    fn rectangle_outline_simplifies_to_four_corners() {
        let backend = ImageprocBackend::new();
        let outline = rectangle_outline(10, 20, 110, 80);
        let perimeter = backend.arc_length(&outline, true);
        let polygon = backend.approx_polygon(&outline, perimeter * 0.02).expect("approx");

        assert_eq!(polygon.len(), 4, "got {:?}", *polygon);
        for corner in [(10, 20), (110, 20), (110, 80), (10, 80)] {
            assert!(
                polygon.iter().any(|p| (p.x, p.y) == corner),
                "missing corner {corner:?} in {:?}",
                *polygon
            );
        }
    }

    #[test]
    fn short_contours_and_zero_tolerance_are_returned_unchanged() {
        let backend = ImageprocBackend::new();
        assert!(backend.approx_polygon(&[], 2.0).expect("empty").is_empty());

        let pair = [Point::new(0, 0), Point::new(5, 5)];
        assert_eq!(*backend.approx_polygon(&pair, 2.0).expect("pair"), pair.to_vec());

        let outline = rectangle_outline(0, 0, 20, 10);
        assert_eq!(backend.approx_polygon(&outline, 0.0).expect("zero").len(), outline.len());
        assert!(backend.approx_polygon(&outline, f64::NAN).is_err());
    }

    #[test]
    fn area_and_perimeter_of_rectangle() {
        let backend = ImageprocBackend::new();
        let square = vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 5),
            Point::new(0, 5),
        ];
        assert!((backend.contour_area(&square) - 50.0).abs() < 1e-9);
        assert!((backend.arc_length(&square, true) - 30.0).abs() < 1e-9);
        assert!((backend.arc_length(&square, false) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn adaptive_threshold_is_binary_and_keeps_flat_regions_white() {
        let backend = ImageprocBackend::new();
        let mut gray = GrayImage::from_pixel(40, 40, Luma([120u8]));
        for y in 10..30 {
            for x in 10..30 {
                gray.put_pixel(x, y, Luma([20u8]));
            }
        }
        let binary = backend.adaptive_threshold(&gray, 11, 2.0).expect("threshold");
        assert!(binary.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        // Far from any edge the pixel equals its local mean, which is above mean - c.
        assert_eq!(binary.get_pixel(0, 0).0[0], 255);
        assert_eq!(binary.get_pixel(20, 20).0[0], 255);
        // Dark side of the square's border falls below its local mean.
        assert_eq!(binary.get_pixel(10, 20).0[0], 0);
    }

    #[test]
    fn external_contours_skip_nested_shapes() {
        let backend = ImageprocBackend::new();
        let mut img = GrayImage::new(60, 60);
        // Hollow square ring with a filled square inside its hole.
        for y in 5..55 {
            for x in 5..55 {
                let on_ring = !(10..45).contains(&x) || !(10..45).contains(&y);
                if on_ring {
                    img.put_pixel(x, y, Luma([255u8]));
                }
            }
        }
        for y in 20..35 {
            for x in 20..35 {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
        let contours = backend.external_contours(&img).expect("contours");
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn degenerate_corners_cannot_be_solved() {
        let backend = ImageprocBackend::new();
        let collinear = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)];
        let target = [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)];
        let err = backend.perspective_transform(collinear, target).unwrap_err();
        assert!(matches!(err, ScanError::RectificationFailed(_)));
    }

    #[test]
    fn even_kernels_are_rejected() {
        let backend = ImageprocBackend::new();
        let gray = GrayImage::new(4, 4);
        assert!(backend.gaussian_blur(&gray, 4).is_err());
        assert!(backend.median_blur(&gray, 0).is_err());
    }

    #[test]
    fn every_buffer_is_released() {
        let backend = ImageprocBackend::new();
        {
            let rgba = RgbaImage::from_pixel(16, 16, Rgba([200, 10, 10, 255]));
            let gray = backend.to_grayscale(&rgba).expect("gray");
            let _blurred = backend.gaussian_blur(&gray, 5).expect("blur");
            assert_eq!(backend.ledger().live(), 2);
        }
        assert_eq!(backend.ledger().live(), 0);
        assert_eq!(backend.ledger().allocated(), 2);
    }
}
