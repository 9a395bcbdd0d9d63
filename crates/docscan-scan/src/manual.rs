// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manual corner placement: up to four points in percentage space, with
// tap-to-select replacement.

use docscan_core::{PercentPoint, PixelPoint};
use docscan_vision::to_pixel_space;

/// Corners needed for a rectification quad.
pub const CORNER_COUNT: usize = 4;

/// What a placement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Added as the corner at this index.
    Appended(usize),
    /// Overwrote the selected corner at this index.
    Replaced(usize),
    /// All four corners are set and none is selected.
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualCorners {
    corners: Vec<PercentPoint>,
    pending_selection: Option<usize>,
}

impl ManualCorners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a point. With a corner selected, the point replaces it and the
    /// selection clears; otherwise it is appended while fewer than four exist.
    pub fn place(&mut self, point: PercentPoint) -> Placement {
        let point = point.clamped();
        if let Some(index) = self.pending_selection.take() {
            if let Some(slot) = self.corners.get_mut(index) {
                *slot = point;
                return Placement::Replaced(index);
            }
        }
        if self.corners.len() < CORNER_COUNT {
            self.corners.push(point);
            Placement::Appended(self.corners.len() - 1)
        } else {
            Placement::Rejected
        }
    }

    /// Select an existing corner for replacement. Out-of-range indices are
    /// ignored and return false.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.corners.len() {
            self.pending_selection = Some(index);
            true
        } else {
            false
        }
    }

    /// Drop a pending selection, keeping the corners.
    pub fn clear_selection(&mut self) {
        self.pending_selection = None;
    }

    pub fn reset(&mut self) {
        self.corners.clear();
        self.pending_selection = None;
    }

    pub fn corners(&self) -> &[PercentPoint] {
        &self.corners
    }

    pub fn pending_selection(&self) -> Option<usize> {
        self.pending_selection
    }

    pub fn len(&self) -> usize {
        self.corners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.corners.len() == CORNER_COUNT
    }

    pub fn remaining(&self) -> usize {
        CORNER_COUNT - self.corners.len()
    }

    /// Placement prompt shown under the preview.
    pub fn prompt(&self) -> String {
        match self.remaining() {
            0 => "All corners selected".to_owned(),
            n => format!("Select {n} more corner(s)"),
        }
    }

    /// Corners in placement order, mapped onto a `width`×`height` frame.
    pub fn to_pixel_space(&self, width: u32, height: u32) -> Vec<PixelPoint> {
        self.corners
            .iter()
            .map(|&p| to_pixel_space(p, width, height))
            .collect()
    }

    /// The rectification quad, only once all four corners are set.
    pub fn pixel_quad(&self, width: u32, height: u32) -> Option<[PixelPoint; 4]> {
        match self.corners.as_slice() {
            &[a, b, c, d] => Some([a, b, c, d].map(|p| to_pixel_space(p, width, height))),
            _ => None,
        }
    }
}
