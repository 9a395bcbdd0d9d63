// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-vision: Vision primitives, document detection and rectification.
//
// Provides the `VisionBackend` capability interface with a built-in
// implementation on `imageproc`, the coordinate mapper, the document
// detector, the rectification engine, backend readiness tracking and PNG
// encoding of results.

pub mod backend;
pub mod coords;
pub mod image;
pub mod readiness;
pub mod scan;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use backend::{Buffer, BufferLedger, Contour, ImageprocBackend, VisionBackend};
pub use coords::{DisplayRect, percent_from_display, sort_corners, to_percent_space, to_pixel_space};
pub use readiness::{LoadEvent, ReadinessState, VisionRuntime};
pub use scan::{DocumentDetector, RectificationEngine};
