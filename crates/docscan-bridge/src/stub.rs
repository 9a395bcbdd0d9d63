// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub camera for builds where no native camera binding is linked.
//
// Opening a stream always fails with `PlatformUnavailable`; the embedding
// shell is expected to supply a real `NativeCamera`.

use docscan_core::error::{Result, ScanError};

use crate::traits::{CameraStream, NativeCamera, StreamConstraints};

/// No-op camera returned when no platform camera is linked.
pub struct StubCamera;

impl NativeCamera for StubCamera {
    fn camera_name(&self) -> &str {
        "Unavailable (stub)"
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>> {
        tracing::warn!(facing = ?constraints.facing, "NativeCamera::open_stream called on stub camera");
        Err(ScanError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::{CaptureKind, ScanConfig};

    #[test]
    fn stub_refuses_to_open() {
        let mut camera = StubCamera;
        let constraints = StreamConstraints::for_kind(CaptureKind::DocumentScan, &ScanConfig::default());
        let err = camera.open_stream(&constraints).err().expect("stub must fail");
        assert!(matches!(err, ScanError::PlatformUnavailable));
    }
}
