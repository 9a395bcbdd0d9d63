// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Test doubles and synthetic frames shared by this crate's tests and, behind
// the `test-support` feature, by downstream crates.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use docscan_core::Frame;
use docscan_core::error::{Result, ScanError};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometric_transformations::Projection;
use imageproc::point::Point;

use crate::backend::{Buffer, BufferLedger, Contour, ImageprocBackend, VisionBackend};

/// Background shade of synthetic frames.
pub const DESK: Rgba<u8> = Rgba([40, 40, 40, 255]);
/// Page shade of synthetic frames.
pub const PAPER: Rgba<u8> = Rgba([235, 235, 230, 255]);

/// A uniform desk with nothing on it.
pub fn blank_frame(width: u32, height: u32) -> Frame {
    Frame::new(RgbaImage::from_pixel(width, height, DESK))
}

/// A bright page with corners `quad` (any order around the outline) on a dark desk.
pub fn document_frame(width: u32, height: u32, quad: [(f32, f32); 4]) -> Frame {
    let mut image = RgbaImage::from_pixel(width, height, DESK);
    let points: Vec<Point<i32>> = quad
        .iter()
        .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();
    draw_polygon_mut(&mut image, &points, PAPER);
    Frame::new(image)
}

/// Border pixels of the axis-aligned rectangle `(x0, y0)`–`(x1, y1)`, traced
/// the way a contour follower would report them.
pub fn rect_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
    let mut points = Vec::new();
    points.extend((x0..x1).map(|x| Point::new(x, y0)));
    points.extend((y0..y1).map(|y| Point::new(x1, y)));
    points.extend((x0 + 1..=x1).rev().map(|x| Point::new(x, y1)));
    points.extend((y0 + 1..=y1).rev().map(|y| Point::new(x0, y)));
    points
}

/// Backend operations, for call accounting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Grayscale,
    Blur,
    Threshold,
    Canny,
    Dilate,
    Erode,
    Contours,
    Approximate,
    Perspective,
    Warp,
    Median,
}

/// Real raster operations with a scripted contour list and optional failure.
///
/// Lets detection policy be tested against exact contours instead of
/// whatever the edge pipeline makes of a synthetic image.
pub struct ScriptedBackend {
    inner: ImageprocBackend,
    contours: Vec<Contour>,
    fail_on: Option<Op>,
}

impl ScriptedBackend {
    pub fn with_contours(contours: Vec<Contour>) -> Self {
        Self {
            inner: ImageprocBackend::new(),
            contours,
            fail_on: None,
        }
    }

    /// Make `op` fail with a backend error.
    pub fn failing_on(mut self, op: Op) -> Self {
        self.fail_on = Some(op);
        self
    }

    fn check(&self, op: Op) -> Result<()> {
        if self.fail_on == Some(op) {
            return Err(ScanError::Backend(format!("scripted failure in {op:?}")));
        }
        Ok(())
    }
}

impl VisionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn ledger(&self) -> &BufferLedger {
        self.inner.ledger()
    }

    fn to_grayscale(&self, src: &RgbaImage) -> Result<Buffer<GrayImage>> {
        self.check(Op::Grayscale)?;
        self.inner.to_grayscale(src)
    }

    fn gaussian_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.check(Op::Blur)?;
        self.inner.gaussian_blur(src, kernel)
    }

    fn adaptive_threshold(&self, src: &GrayImage, block_size: u32, c: f32) -> Result<Buffer<GrayImage>> {
        self.check(Op::Threshold)?;
        self.inner.adaptive_threshold(src, block_size, c)
    }

    fn canny(&self, src: &GrayImage, low: f32, high: f32) -> Result<Buffer<GrayImage>> {
        self.check(Op::Canny)?;
        self.inner.canny(src, low, high)
    }

    fn dilate(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.check(Op::Dilate)?;
        self.inner.dilate(src, kernel)
    }

    fn erode(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.check(Op::Erode)?;
        self.inner.erode(src, kernel)
    }

    fn external_contours(&self, _src: &GrayImage) -> Result<Buffer<Vec<Contour>>> {
        self.check(Op::Contours)?;
        Ok(self.inner.ledger().track(self.contours.clone()))
    }

    fn contour_area(&self, contour: &[Point<i32>]) -> f64 {
        self.inner.contour_area(contour)
    }

    fn arc_length(&self, contour: &[Point<i32>], closed: bool) -> f64 {
        self.inner.arc_length(contour, closed)
    }

    fn approx_polygon(&self, contour: &[Point<i32>], epsilon: f64) -> Result<Buffer<Vec<Point<i32>>>> {
        self.check(Op::Approximate)?;
        self.inner.approx_polygon(contour, epsilon)
    }

    fn perspective_transform(&self, from: [(f32, f32); 4], to: [(f32, f32); 4]) -> Result<Buffer<Projection>> {
        self.check(Op::Perspective)?;
        self.inner.perspective_transform(from, to)
    }

    fn warp_perspective(
        &self,
        src: &RgbaImage,
        transform: &Projection,
        width: u32,
        height: u32,
    ) -> Result<Buffer<RgbaImage>> {
        self.check(Op::Warp)?;
        self.inner.warp_perspective(src, transform, width, height)
    }

    fn median_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.check(Op::Median)?;
        self.inner.median_blur(src, kernel)
    }
}

/// Wraps a backend and counts every call made through it.
pub struct CountingBackend<B> {
    inner: B,
    calls: Arc<AtomicUsize>,
}

impl<B: VisionBackend> CountingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle on the call count, readable after the backend is moved.
    pub fn counter(&self) -> CallCounter {
        CallCounter(Arc::clone(&self.calls))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Read side of a [`CountingBackend`]'s call count.
#[derive(Debug, Clone)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn calls(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<B: VisionBackend> VisionBackend for CountingBackend<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn ledger(&self) -> &BufferLedger {
        self.inner.ledger()
    }

    fn to_grayscale(&self, src: &RgbaImage) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.to_grayscale(src)
    }

    fn gaussian_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.gaussian_blur(src, kernel)
    }

    fn adaptive_threshold(&self, src: &GrayImage, block_size: u32, c: f32) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.adaptive_threshold(src, block_size, c)
    }

    fn canny(&self, src: &GrayImage, low: f32, high: f32) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.canny(src, low, high)
    }

    fn dilate(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.dilate(src, kernel)
    }

    fn erode(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.erode(src, kernel)
    }

    fn external_contours(&self, src: &GrayImage) -> Result<Buffer<Vec<Contour>>> {
        self.hit();
        self.inner.external_contours(src)
    }

    fn contour_area(&self, contour: &[Point<i32>]) -> f64 {
        self.hit();
        self.inner.contour_area(contour)
    }

    fn arc_length(&self, contour: &[Point<i32>], closed: bool) -> f64 {
        self.hit();
        self.inner.arc_length(contour, closed)
    }

    fn approx_polygon(&self, contour: &[Point<i32>], epsilon: f64) -> Result<Buffer<Vec<Point<i32>>>> {
        self.hit();
        self.inner.approx_polygon(contour, epsilon)
    }

    fn perspective_transform(&self, from: [(f32, f32); 4], to: [(f32, f32); 4]) -> Result<Buffer<Projection>> {
        self.hit();
        self.inner.perspective_transform(from, to)
    }

    fn warp_perspective(
        &self,
        src: &RgbaImage,
        transform: &Projection,
        width: u32,
        height: u32,
    ) -> Result<Buffer<RgbaImage>> {
        self.hit();
        self.inner.warp_perspective(src, transform, width, height)
    }

    fn median_blur(&self, src: &GrayImage, kernel: u32) -> Result<Buffer<GrayImage>> {
        self.hit();
        self.inner.median_blur(src, kernel)
    }
}
