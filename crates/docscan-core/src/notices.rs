// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language notices shown to the user when scanning degrades or fails.
//
// Each technical error maps to a short message plus a suggestion. Severity
// drives how the UI presents it: a banner that fades, a prompt that waits for
// the user, or a dialog that ends the scanning surface.

use serde::Serialize;

use crate::error::ScanError;

/// How a notice interrupts the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The action went through with a lesser result (e.g. an unrectified image).
    Degraded,
    /// The action was refused; the user must do something first.
    ActionRequired,
    /// The scanning surface cannot continue.
    Fatal,
}

/// A user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNotice {
    /// One-line summary.
    pub message: String,
    /// What the user can try.
    pub suggestion: String,
    /// Whether trying the same thing again can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl UserNotice {
    /// Notices that do not block the flow are shown as a single transient banner.
    pub fn is_blocking(&self) -> bool {
        self.severity != Severity::Degraded
    }
}

/// Map a `ScanError` to the notice the UI should show.
pub fn notice_for(err: &ScanError) -> UserNotice {
    match err {
        ScanError::CameraUnavailable(_) => UserNotice {
            message: "Could not access camera.".into(),
            suggestion: "Please check camera permissions, then try again.".into(),
            retriable: true,
            severity: Severity::Fatal,
        },

        ScanError::CameraNotReady => UserNotice {
            message: "Camera feed not ready.".into(),
            suggestion: "Wait a moment for the preview to appear, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanError::VisionBackendUnavailable => UserNotice {
            message: "Document processing is unavailable.".into(),
            suggestion: "The photo was saved as taken. Automatic detection is off; you can still place corners by hand.".into(),
            retriable: false,
            severity: Severity::Degraded,
        },

        ScanError::DetectionNotFound => UserNotice {
            message: "No document detected.".into(),
            suggestion: "The photo was saved as taken. Adjust position or sensitivity, or place the corners by hand.".into(),
            retriable: true,
            severity: Severity::Degraded,
        },

        ScanError::RectificationFailed(_) | ScanError::Backend(_) => UserNotice {
            message: "Failed to process document.".into(),
            suggestion: "Capturing as normal photo. The result may not be straightened.".into(),
            retriable: true,
            severity: Severity::Degraded,
        },

        ScanError::IncompleteManualCorners { placed } => UserNotice {
            message: format!("Select {} more corner(s).", 4usize.saturating_sub(*placed)),
            suggestion: "Tap each corner of the document on the preview.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanError::ImageError(_) => UserNotice {
            message: "There's a problem with this image.".into(),
            suggestion: "Try capturing the page again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanError::InvalidState(_) => UserNotice {
            message: "That isn't possible right now.".into(),
            suggestion: "Close the camera and open it again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::InvalidConfig(detail) => UserNotice {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Check the settings file. ({detail})"),
            retriable: false,
            severity: Severity::Fatal,
        },

        ScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                UserNotice {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                UserNotice {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::ActionRequired,
                }
            }
        }

        ScanError::Serialization(_) => UserNotice {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanError::PlatformUnavailable => UserNotice {
            message: "The camera isn't available on this device.".into(),
            suggestion: "Attach a file instead.".into(),
            retriable: false,
            severity: Severity::Fatal,
        },
    }
}
