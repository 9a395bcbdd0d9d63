// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Still-image camera: serves one fixed raster as a live stream.
//
// Used on desktop and in CI, where a picked image file stands in for the
// camera feed. Track lifecycle is observable through `CameraMonitor` so
// callers can verify that every stream they opened was stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use docscan_core::error::{Result, ScanError};
use docscan_core::{Facing, Frame};
use image::RgbaImage;
use tracing::{debug, info};

use crate::traits::{CameraStream, NativeCamera, StreamConstraints, StreamSettings};

#[derive(Debug, Default)]
struct TrackCounters {
    opened: AtomicUsize,
    live: AtomicUsize,
    frames_read: AtomicUsize,
    torch_on: AtomicBool,
}

/// Read-only view of the tracks a `StillCamera` has handed out.
#[derive(Debug, Clone)]
pub struct CameraMonitor {
    counters: Arc<TrackCounters>,
}

impl CameraMonitor {
    /// Streams opened so far.
    pub fn opened_streams(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Streams whose tracks are still running.
    pub fn live_tracks(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Frames copied out of any stream.
    pub fn frames_read(&self) -> usize {
        self.counters.frames_read.load(Ordering::SeqCst)
    }

    pub fn torch_on(&self) -> bool {
        self.counters.torch_on.load(Ordering::SeqCst)
    }
}

/// A camera whose every frame is the same image.
pub struct StillCamera {
    image: RgbaImage,
    torch: bool,
    denied: bool,
    counters: Arc<TrackCounters>,
}

impl StillCamera {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            torch: false,
            denied: false,
            counters: Arc::new(TrackCounters::default()),
        }
    }

    /// Report a torch capability on opened tracks.
    pub fn with_torch(mut self, torch: bool) -> Self {
        self.torch = torch;
        self
    }

    /// Behave like a camera whose permission prompt was declined.
    pub fn denied(mut self) -> Self {
        self.denied = true;
        self
    }

    pub fn monitor(&self) -> CameraMonitor {
        CameraMonitor {
            counters: Arc::clone(&self.counters),
        }
    }
}

impl NativeCamera for StillCamera {
    fn camera_name(&self) -> &str {
        "Still image"
    }

    fn open_stream(&mut self, constraints: &StreamConstraints) -> Result<Box<dyn CameraStream>> {
        if self.denied {
            return Err(ScanError::CameraUnavailable("permission denied".into()));
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        info!(
            width = self.image.width(),
            height = self.image.height(),
            facing = ?constraints.facing,
            "Still-image stream opened"
        );

        Ok(Box::new(StillStream {
            image: self.image.clone(),
            facing: constraints.facing,
            torch: self.torch,
            live: true,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct StillStream {
    image: RgbaImage,
    facing: Facing,
    torch: bool,
    live: bool,
    counters: Arc<TrackCounters>,
}

impl CameraStream for StillStream {
    fn settings(&self) -> StreamSettings {
        StreamSettings {
            width: self.image.width(),
            height: self.image.height(),
            frame_rate: 30.0,
            facing: Some(self.facing),
        }
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if !self.live {
            return Err(ScanError::CameraNotReady);
        }
        self.counters.frames_read.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::new(self.image.clone()))
    }

    fn torch_supported(&self) -> bool {
        self.torch
    }

    fn apply_torch(&mut self, on: bool) -> Result<()> {
        if !self.torch {
            return Err(ScanError::PlatformUnavailable);
        }
        self.counters.torch_on.store(on, Ordering::SeqCst);
        Ok(())
    }

    fn stop_all_tracks(&mut self) {
        if self.live {
            self.live = false;
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
            self.counters.torch_on.store(false, Ordering::SeqCst);
            debug!("Still-image stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::{CaptureKind, ScanConfig};
    use image::Rgba;

    fn constraints() -> StreamConstraints {
        StreamConstraints::for_kind(CaptureKind::DocumentScan, &ScanConfig::default())
    }

    #[test]
    fn stream_reports_image_size_not_ideal_size() {
        let mut camera = StillCamera::new(RgbaImage::from_pixel(64, 48, Rgba([1, 2, 3, 255])));
        let stream = camera.open_stream(&constraints()).expect("open");
        let settings = stream.settings();
        assert_eq!((settings.width, settings.height), (64, 48));
        assert_eq!(settings.facing, Some(Facing::Environment));
    }

    #[test]
    fn stopping_is_idempotent_and_tracked() {
        let mut camera = StillCamera::new(RgbaImage::new(8, 8));
        let monitor = camera.monitor();
        let mut stream = camera.open_stream(&constraints()).expect("open");
        assert_eq!(monitor.live_tracks(), 1);

        stream.stop_all_tracks();
        stream.stop_all_tracks();
        assert_eq!(monitor.live_tracks(), 0);
        assert!(!stream.is_live());
        assert!(stream.read_frame().is_err());
    }

    #[test]
    fn dropping_a_stream_stops_it() {
        let mut camera = StillCamera::new(RgbaImage::new(8, 8));
        let monitor = camera.monitor();
        let stream = camera.open_stream(&constraints()).expect("open");
        drop(stream);
        assert_eq!(monitor.opened_streams(), 1);
        assert_eq!(monitor.live_tracks(), 0);
    }

    #[test]
    fn denied_camera_reports_unavailable() {
        let mut camera = StillCamera::new(RgbaImage::new(8, 8)).denied();
        let err = camera.open_stream(&constraints()).err().expect("must fail");
        assert!(matches!(err, ScanError::CameraUnavailable(_)));
    }

    #[test]
    fn torch_only_with_capability() {
        let mut camera = StillCamera::new(RgbaImage::new(8, 8)).with_torch(true);
        let monitor = camera.monitor();
        let mut stream = camera.open_stream(&constraints()).expect("open");
        stream.apply_torch(true).expect("torch");
        assert!(monitor.torch_on());
        stream.stop_all_tracks();
        assert!(!monitor.torch_on());
    }
}
