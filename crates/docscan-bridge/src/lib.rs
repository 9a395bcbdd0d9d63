// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan: Camera capability bridge.
//
// Defines the camera traits the scanning core consumes, plus two
// implementations that need no hardware: a stub that always refuses, and a
// still-image camera for desktop and CI.

pub mod still;
pub mod stub;
pub mod traits;

pub use still::{CameraMonitor, StillCamera};
pub use stub::StubCamera;
pub use traits::{CameraStream, NativeCamera, StreamConstraints, StreamSettings};

/// The camera for the current build.
///
/// Native camera bindings are supplied by the embedding shell, so on its own
/// this crate returns the stub, which reports `PlatformUnavailable`.
pub fn platform_camera() -> Box<dyn NativeCamera> {
    Box::new(stub::StubCamera)
}
