// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic camera capability traits.
//
// The scanning core never talks to camera hardware directly. An embedding
// shell (browser, mobile app, desktop) implements these traits; the stub and
// still-image implementations in this crate cover CI and desktop use.

use docscan_core::error::Result;
use docscan_core::{CaptureKind, Facing, Frame, ScanConfig};

/// Constraints passed when requesting a video stream.
///
/// Resolution and frame rate are ideals; the platform may hand back a less
/// capable stream and report what it actually delivers in `StreamSettings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub ideal_frame_rate: u32,
}

impl StreamConstraints {
    /// Constraints for a capture kind, using the kind's preferred camera.
    pub fn for_kind(kind: CaptureKind, config: &ScanConfig) -> Self {
        Self::with_facing(kind.preferred_facing(), config)
    }

    /// Constraints for an explicit camera facing.
    pub fn with_facing(facing: Facing, config: &ScanConfig) -> Self {
        Self {
            facing,
            ideal_width: config.ideal_width,
            ideal_height: config.ideal_height,
            ideal_frame_rate: config.ideal_frame_rate,
        }
    }
}

/// What an open stream actually delivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f32,
    pub facing: Option<Facing>,
}

/// Request video streams from the device camera.
pub trait NativeCamera: Send {
    /// Human-readable camera name (e.g. "FaceTime HD", "Still image").
    fn camera_name(&self) -> &str;

    /// Acquire a stream matching `constraints` as closely as possible.
    ///
    /// Permission denial or a missing device is reported as
    /// `ScanError::CameraUnavailable`.
    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>>;
}

/// An open, exclusively owned video stream bound to the live preview.
pub trait CameraStream: Send {
    /// Current stream settings. Width and height are 0 until the first frame
    /// metadata arrives.
    fn settings(&self) -> StreamSettings;

    /// Copy the current preview frame into a raster.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Whether the video track reports a torch capability.
    fn torch_supported(&self) -> bool;

    /// Switch the torch. Only called when `torch_supported` is true.
    fn apply_torch(&mut self, on: bool) -> Result<()>;

    /// Stop every track of the stream. Must be safe to call repeatedly.
    fn stop_all_tracks(&mut self);

    /// Whether any track is still running.
    fn is_live(&self) -> bool;
}
