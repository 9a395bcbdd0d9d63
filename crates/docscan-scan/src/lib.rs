// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-scan: Capture session lifecycle and the scan interaction state machine.
//
// Ties a camera stream, the detection ticker, manual corner placement and the
// rectification engine together into one owned `ScanController` per session.

pub mod attachments;
pub mod controller;
pub mod manual;
pub mod preview;
pub mod session;
pub mod ticker;

pub use attachments::{Attachment, CapturedImage};
pub use controller::{CaptureOutcome, Controls, ScanController, ScanState};
pub use manual::{ManualCorners, Placement};
pub use preview::{Overlay, PreviewSurface};
pub use session::CaptureSession;
pub use ticker::{DetectionTicker, TickOutcome, Tickable};
