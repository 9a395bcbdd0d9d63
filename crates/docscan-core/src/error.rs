// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docscan.

use thiserror::Error;

/// Top-level error type for all scanning operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Camera --
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("camera feed not ready")]
    CameraNotReady,

    // -- Vision pipeline --
    #[error("vision backend unavailable")]
    VisionBackendUnavailable,

    #[error("no document detected in the frame")]
    DetectionNotFound,

    #[error("rectification failed: {0}")]
    RectificationFailed(String),

    #[error("vision backend operation failed: {0}")]
    Backend(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Interaction --
    #[error("manual capture needs 4 corners, {placed} placed")]
    IncompleteManualCorners { placed: usize },

    #[error("invalid scan state: {0}")]
    InvalidState(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
