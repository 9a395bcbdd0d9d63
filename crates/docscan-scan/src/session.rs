// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session: owns the camera stream from acquisition to release.
//
// The stream is a scoped resource: `close()` stops every track and is safe to
// call any number of times, and dropping the session closes it.

use docscan_bridge::{CameraStream, NativeCamera, StreamConstraints, StreamSettings};
use docscan_core::error::{Result, ScanError};
use docscan_core::{Facing, Frame, ScanConfig};
use tracing::{debug, info, instrument, warn};

use crate::preview::PreviewSurface;

pub struct CaptureSession {
    camera: Box<dyn NativeCamera>,
    config: ScanConfig,
    stream: Option<Box<dyn CameraStream>>,
    preview: PreviewSurface,
}

impl CaptureSession {
    pub fn new(camera: Box<dyn NativeCamera>, config: ScanConfig) -> Self {
        Self {
            camera,
            config,
            stream: None,
            preview: PreviewSurface::new(),
        }
    }

    /// Acquire a stream from the camera facing `facing` and bind it to the
    /// preview. Any stream already open is released first.
    ///
    /// Every acquisition failure is reported as `CameraUnavailable`.
    #[instrument(skip(self), fields(camera = self.camera.camera_name()))]
    pub fn open(&mut self, facing: Facing) -> Result<StreamSettings> {
        self.close();

        let constraints = StreamConstraints::with_facing(facing, &self.config);
        let stream = self.camera.open_stream(&constraints).map_err(|err| match err {
            ScanError::CameraUnavailable(reason) => ScanError::CameraUnavailable(reason),
            other => ScanError::CameraUnavailable(other.to_string()),
        })?;

        let settings = stream.settings();
        info!(
            width = settings.width,
            height = settings.height,
            frame_rate = settings.frame_rate,
            "Camera stream opened"
        );
        self.preview.attach(settings);
        self.stream = Some(stream);
        Ok(settings)
    }

    /// Stop all tracks and unbind the preview. No-op when nothing is open.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_all_tracks();
            info!("Camera stream closed");
        }
        self.preview.detach();
    }

    /// Switch the torch if the track supports it. Returns whether it was applied.
    pub fn set_torch(&mut self, on: bool) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };
        if !stream.torch_supported() {
            debug!("Torch requested but track has no torch capability");
            return false;
        }
        match stream.apply_torch(on) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Failed to switch torch");
                false
            }
        }
    }

    /// Copy the current preview frame.
    ///
    /// Fails with `CameraNotReady` when no stream is open or the stream has
    /// not reported a video size yet.
    pub fn grab_frame(&mut self) -> Result<Frame> {
        let stream = self.stream.as_mut().ok_or(ScanError::CameraNotReady)?;
        let settings = stream.settings();
        if settings.width == 0 || settings.height == 0 {
            debug!("Stream has no video size yet");
            return Err(ScanError::CameraNotReady);
        }
        stream.read_frame()
    }

    pub fn is_live(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    pub fn torch_supported(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.torch_supported())
    }

    pub fn settings(&self) -> Option<StreamSettings> {
        self.stream.as_ref().map(|s| s.settings())
    }

    pub fn preview(&self) -> &PreviewSurface {
        &self.preview
    }

    pub fn preview_mut(&mut self) -> &mut PreviewSurface {
        &mut self.preview
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
