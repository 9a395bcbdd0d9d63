// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vision backend capability interface.
//
// The detector and the rectification engine only orchestrate these
// primitives. Every raster or point list a backend hands out is wrapped in a
// `Buffer`, which holds a lease on the backend's `BufferLedger` until it is
// dropped, so leaked intermediates show up as a non-zero live count.

pub mod builtin;

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use docscan_core::error::Result;
use image::{GrayImage, RgbaImage};
use imageproc::geometric_transformations::Projection;
use imageproc::point::Point;

pub use builtin::ImageprocBackend;

/// An external contour as traced on the edge map, in pixel coordinates.
pub type Contour = Vec<Point<i32>>;

/// Counts buffers handed out by a backend that have not been dropped yet.
#[derive(Debug, Clone, Default)]
pub struct BufferLedger {
    live: Arc<AtomicUsize>,
    allocated: Arc<AtomicUsize>,
}

impl BufferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a freshly allocated value so its release is tracked.
    pub fn track<T>(&self, value: T) -> Buffer<T> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.allocated.fetch_add(1, Ordering::SeqCst);
        Buffer {
            value,
            _lease: Lease {
                live: Arc::clone(&self.live),
            },
        }
    }

    /// Buffers currently alive.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Buffers handed out since the ledger was created.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }
}

struct Lease {
    live: Arc<AtomicUsize>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A backend-allocated value. Released when dropped, on every exit path.
pub struct Buffer<T> {
    value: T,
    _lease: Lease,
}

impl<T> Buffer<T> {
    /// Take the value out, releasing the lease.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Buffer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Buffer").field(&self.value).finish()
    }
}

/// Deterministic, synchronous vision primitives over in-memory rasters.
///
/// Kernel and block sizes are given as odd side lengths, matching the way the
/// detection policy is stated (5×5 blur, 3×3 structuring element, block 11).
pub trait VisionBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Ledger tracking buffers this backend has handed out.
    fn ledger(&self) -> &BufferLedger;

    fn to_grayscale(&self, src: &RgbaImage) -> Result<Buffer<GrayImage>>;

    fn gaussian_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>>;

    /// Gaussian-weighted adaptive threshold: a pixel becomes 255 when it is
    /// brighter than its local weighted mean minus `c`, otherwise 0.
    fn adaptive_threshold(&self, src: &GrayImage, block_size: u32, c: f32) -> Result<Buffer<GrayImage>>;

    fn canny(&self, src: &GrayImage, low: f32, high: f32) -> Result<Buffer<GrayImage>>;

    /// Dilate with a square structuring element of side `kernel`.
    fn dilate(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>>;

    /// Erode with a square structuring element of side `kernel`.
    fn erode(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>>;

    /// Outermost contours only; holes and nested borders are dropped.
    fn external_contours(&self, src: &GrayImage) -> Result<Buffer<Vec<Contour>>>;

    /// Enclosed area of a closed contour.
    fn contour_area(&self, contour: &[Point<i32>]) -> f64;

    /// Perimeter of a contour, including the closing segment when `closed`.
    fn arc_length(&self, contour: &[Point<i32>], closed: bool) -> f64;

    /// Simplify a closed contour so no dropped point lies farther than
    /// `epsilon` from the result.
    fn approx_polygon(&self, contour: &[Point<i32>], epsilon: f64) -> Result<Buffer<Vec<Point<i32>>>>;

    /// Solve the projective transform mapping `from[i]` onto `to[i]`.
    fn perspective_transform(&self, from: [(f32, f32); 4], to: [(f32, f32); 4]) -> Result<Buffer<Projection>>;

    /// Warp `src` through `transform` into a `width`×`height` raster.
    fn warp_perspective(
        &self,
        src: &RgbaImage,
        transform: &Projection,
        width: u32,
        height: u32,
    ) -> Result<Buffer<RgbaImage>>;

    fn median_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_buffer_releases_its_lease() {
        let ledger = BufferLedger::new();
        let a = ledger.track(vec![1u8, 2, 3]);
        let b = ledger.track(GrayImage::new(2, 2));
        assert_eq!(ledger.live(), 2);
        assert_eq!(a.len(), 3);

        drop(a);
        assert_eq!(ledger.live(), 1);

        let image = b.into_inner();
        assert_eq!(image.width(), 2);
        assert_eq!(ledger.live(), 0);
        assert_eq!(ledger.allocated(), 2);
    }

    #[test]
    fn clones_share_counts() {
        let ledger = BufferLedger::new();
        let view = ledger.clone();
        let _held = ledger.track(0u32);
        assert_eq!(view.live(), 1);
    }
}
