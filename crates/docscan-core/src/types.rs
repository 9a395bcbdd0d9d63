// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the scanning pipeline.

use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScanError;

/// Unique identifier for a scanning session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Coordinate spaces
// ---------------------------------------------------------------------------

/// A point in percentage space: 0–100 on each axis of the displayed preview,
/// independent of camera resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f32,
    pub y: f32,
}

impl PercentPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp both coordinates into `0..=100`.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
        }
    }
}

/// A point in pixel space of a specific frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn as_tuple(self) -> (f32, f32) {
        (self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

/// Which physical camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    /// Front camera.
    User,
    /// Back camera.
    Environment,
}

/// What the user is capturing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureKind {
    /// Ordinary photo, stored as taken.
    PlainPhoto,
    /// Document scan, rectified and enhanced when corners are known.
    DocumentScan,
}

impl CaptureKind {
    /// Scans prefer the back camera, photos the front one.
    pub fn preferred_facing(self) -> Facing {
        match self {
            Self::PlainPhoto => Facing::User,
            Self::DocumentScan => Facing::Environment,
        }
    }

    /// Label used in attachment file names.
    pub fn file_label(self) -> &'static str {
        match self {
            Self::PlainPhoto => "photo",
            Self::DocumentScan => "scan",
        }
    }
}

/// How document corners are obtained in scan mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CornerMode {
    /// Corners come from the detector on every tick.
    AutoDetect,
    /// Corners are placed by the user on the preview.
    ManualSelect,
}

/// Post-warp enhancement applied to a rectified scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EnhancementLevel {
    /// Keep the warped color image.
    None = 1,
    /// Grayscale + adaptive threshold.
    Binarized = 2,
    /// Grayscale + median blur + stronger adaptive threshold.
    DenoisedBinarized = 3,
}

impl EnhancementLevel {
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl Default for EnhancementLevel {
    fn default() -> Self {
        Self::Binarized
    }
}

impl TryFrom<u8> for EnhancementLevel {
    type Error = ScanError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::None),
            2 => Ok(Self::Binarized),
            3 => Ok(Self::DenoisedBinarized),
            other => Err(ScanError::InvalidConfig(format!(
                "enhancement level must be 1, 2 or 3 (got {other})"
            ))),
        }
    }
}

impl From<EnhancementLevel> for u8 {
    fn from(level: EnhancementLevel) -> Self {
        level.level()
    }
}

/// Edge-detector sensitivity: the low hysteresis threshold, with the high
/// threshold at three times this value. Always within `30..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct EdgeSensitivity(u32);

impl EdgeSensitivity {
    pub const MIN: u32 = 30;
    pub const MAX: u32 = 100;

    /// Build a sensitivity, clamping into the supported range.
    pub fn new(value: u32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Canny `(low, high)` thresholds.
    pub fn thresholds(self) -> (f32, f32) {
        let low = self.0 as f32;
        (low, low * 3.0)
    }
}

impl Default for EdgeSensitivity {
    fn default() -> Self {
        Self(50)
    }
}

/// Strict conversion for configured values; out-of-range is an error
/// rather than clamped.
impl TryFrom<u32> for EdgeSensitivity {
    type Error = ScanError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScanError::InvalidConfig(format!(
                "edge sensitivity must be between {} and {} (got {value})",
                Self::MIN,
                Self::MAX
            )))
        }
    }
}

impl From<EdgeSensitivity> for u32 {
    fn from(sensitivity: EdgeSensitivity) -> Self {
        sensitivity.0
    }
}

// ---------------------------------------------------------------------------
// Frames and detection
// ---------------------------------------------------------------------------

/// A raster snapshot taken from the live video source.
///
/// Frames are immutable once grabbed; the pipeline only ever borrows the
/// pixels or consumes the frame whole.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Frame area in pixels.
    pub fn area(&self) -> f64 {
        self.image.width() as f64 * self.image.height() as f64
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

/// Outcome of one detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionResult {
    /// A document quadrilateral, corners ordered TL, TR, BR, BL.
    Found {
        corners: [PixelPoint; 4],
        /// Enclosed contour area in square pixels.
        area: f64,
    },
    NotFound,
}

impl DetectionResult {
    pub fn corners(&self) -> Option<[PixelPoint; 4]> {
        match self {
            Self::Found { corners, .. } => Some(*corners),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitivity_is_clamped() {
        assert_eq!(EdgeSensitivity::new(5).value(), 30);
        assert_eq!(EdgeSensitivity::new(250).value(), 100);
        assert_eq!(EdgeSensitivity::new(64).thresholds(), (64.0, 192.0));
        assert!(matches!(EdgeSensitivity::try_from(29), Err(ScanError::InvalidConfig(_))));
        assert_eq!(EdgeSensitivity::try_from(100).map(EdgeSensitivity::value).ok(), Some(100));
    }

    #[test]
    fn enhancement_level_round_trips_through_u8() {
        for raw in 1u8..=3 {
            let level = EnhancementLevel::try_from(raw).expect("valid level");
            assert_eq!(u8::from(level), raw);
        }
        assert!(EnhancementLevel::try_from(0).is_err());
        assert!(EnhancementLevel::try_from(4).is_err());
    }

    #[test]
    fn scan_prefers_back_camera() {
        assert_eq!(CaptureKind::DocumentScan.preferred_facing(), Facing::Environment);
        assert_eq!(CaptureKind::PlainPhoto.preferred_facing(), Facing::User);
    }

    #[test]
    fn percent_point_clamps() {
        let p = PercentPoint::new(-4.0, 130.0).clamped();
        assert_eq!(p, PercentPoint::new(0.0, 100.0));
    }

    #[test]
    fn detection_result_serializes_with_status_tag() {
        let json = serde_json::to_string(&DetectionResult::NotFound).expect("serialize");
        assert_eq!(json, r#"{"status":"not_found"}"#);
    }
}
