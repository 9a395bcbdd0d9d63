// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between the displayed preview (percentage space) and
// camera frames (pixel space), plus canonical corner ordering.

use docscan_core::{PercentPoint, PixelPoint};
use serde::{Deserialize, Serialize};

/// Map a percentage-space point onto a `width`×`height` frame.
pub fn to_pixel_space(point: PercentPoint, width: u32, height: u32) -> PixelPoint {
    PixelPoint::new(
        point.x / 100.0 * width as f32,
        point.y / 100.0 * height as f32,
    )
}

/// Inverse of [`to_pixel_space`]. A zero dimension maps to 0%.
pub fn to_percent_space(point: PixelPoint, width: u32, height: u32) -> PercentPoint {
    let ratio = |value: f32, extent: u32| {
        if extent == 0 { 0.0 } else { value / extent as f32 * 100.0 }
    };
    PercentPoint::new(ratio(point.x, width), ratio(point.y, height))
}

/// On-screen rectangle the preview is drawn into, in display units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

/// Convert a pointer position over the preview into percentage space,
/// clamped to the preview bounds.
pub fn percent_from_display(click_x: f32, click_y: f32, rect: DisplayRect) -> PercentPoint {
    let ratio = |offset: f32, extent: f32| {
        if extent > 0.0 { offset / extent * 100.0 } else { 0.0 }
    };
    PercentPoint::new(
        ratio(click_x - rect.left, rect.width),
        ratio(click_y - rect.top, rect.height),
    )
    .clamped()
}

/// Order four points as top-left, top-right, bottom-right, bottom-left.
///
/// Points strictly above the centroid form the upper pair (left to right);
/// everything else, including points level with the centroid, forms the lower
/// pair (right to left).
pub fn sort_corners(points: [PixelPoint; 4]) -> [PixelPoint; 4] {
    let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let (mut upper, mut lower): (Vec<PixelPoint>, Vec<PixelPoint>) =
        points.iter().copied().partition(|p| p.y < cy);
    upper.sort_by(|a, b| a.x.total_cmp(&b.x));
    lower.sort_by(|a, b| b.x.total_cmp(&a.x));

    let mut ordered = points;
    for (slot, point) in ordered.iter_mut().zip(upper.into_iter().chain(lower)) {
        *slot = point;
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> [PixelPoint; 4] {
        [
            PixelPoint::new(12.0, 8.0),
            PixelPoint::new(190.0, 14.0),
            PixelPoint::new(182.0, 150.0),
            PixelPoint::new(6.0, 141.0),
        ]
    }

    fn permutations(items: [PixelPoint; 4]) -> Vec<[PixelPoint; 4]> {
        let mut out = Vec::new();
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        idx.iter().for_each(|&i| seen[i] = true);
                        if seen.iter().all(|&s| s) {
                            out.push([items[a], items[b], items[c], items[d]]);
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn sorted_order_is_tl_tr_br_bl() {
        let [tl, tr, br, bl] = sort_corners([quad()[2], quad()[0], quad()[3], quad()[1]]);
        assert_eq!(tl, PixelPoint::new(12.0, 8.0));
        assert_eq!(tr, PixelPoint::new(190.0, 14.0));
        assert_eq!(br, PixelPoint::new(182.0, 150.0));
        assert_eq!(bl, PixelPoint::new(6.0, 141.0));
    }

    #[test]
    fn sorting_is_idempotent() {
        let once = sort_corners(quad());
        assert_eq!(sort_corners(once), once);
    }

    #[test]
    fn every_input_order_gives_the_same_result() {
        let expected = sort_corners(quad());
        let all = permutations(quad());
        assert_eq!(all.len(), 24);
        for input in all {
            assert_eq!(sort_corners(input), expected, "input {input:?}");
        }
    }

    #[test]
    fn points_level_with_centroid_count_as_lower() {
        // Centroid y is 10; the two y=10 points join the single y=20 point below.
        let points = [
            PixelPoint::new(0.0, 0.0),
            PixelPoint::new(5.0, 10.0),
            PixelPoint::new(15.0, 10.0),
            PixelPoint::new(10.0, 20.0),
        ];
        let sorted = sort_corners(points);
        assert_eq!(sorted[0], PixelPoint::new(0.0, 0.0));
        assert_eq!(sorted[1], PixelPoint::new(15.0, 10.0));
        assert_eq!(sorted[2], PixelPoint::new(10.0, 20.0));
        assert_eq!(sorted[3], PixelPoint::new(5.0, 10.0));
    }

    #[test]
    fn percent_round_trip() {
        let (w, h) = (1920, 1080);
        for (x, y) in [(10.0, 10.0), (90.0, 12.0), (88.0, 90.0), (8.0, 88.0), (33.3, 66.6)] {
            let p = PercentPoint::new(x, y);
            let back = to_percent_space(to_pixel_space(p, w, h), w, h);
            assert!((back.x - x).abs() < 1e-3 && (back.y - y).abs() < 1e-3, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn pixel_mapping_scales_by_frame_size() {
        let px = to_pixel_space(PercentPoint::new(50.0, 25.0), 640, 480);
        assert_eq!(px, PixelPoint::new(320.0, 120.0));
        assert_eq!(to_percent_space(px, 0, 0), PercentPoint::new(0.0, 0.0));
    }

    #[test]
    fn display_clicks_are_offset_and_clamped() {
        let rect = DisplayRect::new(100.0, 50.0, 400.0, 200.0);
        assert_eq!(percent_from_display(300.0, 150.0, rect), PercentPoint::new(50.0, 50.0));
        assert_eq!(percent_from_display(0.0, 400.0, rect), PercentPoint::new(0.0, 100.0));
    }
}
