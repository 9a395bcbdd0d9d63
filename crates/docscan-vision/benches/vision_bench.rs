// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-tick detection pass and the capture-time
// rectification on a synthetic 640x480 frame.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use docscan_core::{EnhancementLevel, Frame, PixelPoint};
use docscan_vision::{DocumentDetector, ImageprocBackend, RectificationEngine};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const QUAD: [(i32, i32); 4] = [(80, 60), (560, 80), (540, 420), (100, 400)];

/// Light page on a dark desk, slightly skewed.
fn page_frame() -> Frame {
    let mut image = RgbaImage::from_pixel(640, 480, Rgba([40, 40, 40, 255]));
    let outline: Vec<Point<i32>> = QUAD.iter().map(|&(x, y)| Point::new(x, y)).collect();
    draw_polygon_mut(&mut image, &outline, Rgba([235, 235, 230, 255]));
    Frame::new(image)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let backend = ImageprocBackend::new();
    let detector = DocumentDetector::default();
    let frame = page_frame();

    c.bench_function("detect (640x480)", |b| {
        b.iter(|| {
            let result = detector.detect(&backend, black_box(&frame));
            black_box(result.ok());
        });
    });
}

fn bench_rectification(c: &mut Criterion) {
    let backend = ImageprocBackend::new();
    let engine = RectificationEngine::new();
    let frame = page_frame();
    let corners = QUAD.map(|(x, y)| PixelPoint::new(x as f32, y as f32));

    for level in [EnhancementLevel::None, EnhancementLevel::Binarized, EnhancementLevel::DenoisedBinarized] {
        c.bench_function(&format!("rectify level {} (640x480)", level.level()), |b| {
            b.iter(|| {
                let result = engine.rectify(&backend, black_box(&frame), corners, level);
                black_box(result.ok());
            });
        });
    }
}

criterion_group!(benches, bench_detection, bench_rectification);
criterion_main!(benches);
