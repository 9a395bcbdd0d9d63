// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preview surface: the live video binding and the overlay drawn over it.

use docscan_bridge::StreamSettings;
use docscan_core::PixelPoint;
use serde::Serialize;

/// What the UI draws over the live preview.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,
    /// Auto-detect found a document; corners TL, TR, BR, BL.
    Detected { corners: [PixelPoint; 4] },
    /// Auto-detect ran and found nothing.
    NotDetected,
    /// Auto-detect failed in the backend.
    DetectionError,
    /// Manually placed corners in placement order, in frame pixels.
    Manual {
        corners: Vec<PixelPoint>,
        selected: Option<usize>,
    },
}

impl Overlay {
    /// Status text drawn with the overlay, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::NotDetected => Some("No document detected. Adjust position or sensitivity."),
            Self::DetectionError => Some("Error detecting document. Try again."),
            _ => None,
        }
    }
}

/// The surface a live stream is bound to.
#[derive(Debug, Default)]
pub struct PreviewSurface {
    stream: Option<StreamSettings>,
    overlay: Overlay,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, settings: StreamSettings) {
        self.stream = Some(settings);
        self.overlay = Overlay::None;
    }

    pub(crate) fn detach(&mut self) {
        self.stream = None;
        self.overlay = Overlay::None;
    }

    pub fn is_attached(&self) -> bool {
        self.stream.is_some()
    }

    /// Pixel size of the bound stream.
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.stream.map(|s| (s.width, s.height))
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = overlay;
    }
}
