// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan controller: the interaction state machine of one scanning session.
//
// Owns the capture session, detector and rectification engine plus the
// collection of captured images. One controller per opened camera surface;
// nothing is shared between sessions.

use std::sync::Arc;

use docscan_bridge::{NativeCamera, StreamSettings};
use docscan_core::error::{Result, ScanError};
use docscan_core::{
    CaptureKind, CornerMode, DetectionResult, EdgeSensitivity, EnhancementLevel, Frame,
    PercentPoint, PixelPoint, ScanConfig, SessionId, UserNotice, notice_for,
};
use docscan_vision::{
    DisplayRect, DocumentDetector, ReadinessState, RectificationEngine, VisionBackend, VisionRuntime,
    percent_from_display,
};
use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::attachments::{Attachment, CapturedImage};
use crate::manual::{ManualCorners, Placement};
use crate::preview::Overlay;
use crate::session::CaptureSession;
use crate::ticker::{TickOutcome, Tickable};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "corner_mode", rename_all = "snake_case")]
pub enum ScanState {
    /// Created, no stream open yet.
    Idle,
    PlainPhoto,
    DocumentScan(CornerMode),
    /// Session ended; every resource released.
    Closed,
}

/// Which controls the UI should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Controls {
    pub corner_mode_toggle: bool,
    pub sensitivity: bool,
    pub enhancement: bool,
    pub torch: bool,
    pub manual_placement: bool,
    pub capture: bool,
}

/// Result of a successful capture.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    /// Position of the new image in the collection.
    pub index: usize,
    pub rectified: bool,
    /// Set when the image was kept unrectified.
    pub notice: Option<UserNotice>,
}

pub struct ScanController {
    id: SessionId,
    config: ScanConfig,
    session: CaptureSession,
    runtime: Arc<VisionRuntime>,
    detector: DocumentDetector,
    engine: RectificationEngine,
    enhancement: EnhancementLevel,
    state: ScanState,
    corner_mode: CornerMode,
    manual: ManualCorners,
    last_detection: Option<DetectionResult>,
    captured: Vec<CapturedImage>,
}

impl ScanController {
    pub fn new(camera: Box<dyn NativeCamera>, runtime: Arc<VisionRuntime>, config: ScanConfig) -> Self {
        let corner_mode = if config.auto_detect {
            CornerMode::AutoDetect
        } else {
            CornerMode::ManualSelect
        };
        Self {
            id: SessionId::new(),
            detector: DocumentDetector::new(config.edge_sensitivity),
            enhancement: config.enhancement_level,
            session: CaptureSession::new(camera, config.clone()),
            config,
            runtime,
            engine: RectificationEngine::new(),
            state: ScanState::Idle,
            corner_mode,
            manual: ManualCorners::new(),
            last_detection: None,
            captured: Vec::new(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn kind(&self) -> Option<CaptureKind> {
        match self.state {
            ScanState::PlainPhoto => Some(CaptureKind::PlainPhoto),
            ScanState::DocumentScan(_) => Some(CaptureKind::DocumentScan),
            ScanState::Idle | ScanState::Closed => None,
        }
    }

    pub fn readiness(&self) -> ReadinessState {
        self.runtime.status()
    }

    pub fn sensitivity(&self) -> EdgeSensitivity {
        self.detector.sensitivity()
    }

    pub fn enhancement(&self) -> EnhancementLevel {
        self.enhancement
    }

    pub fn manual_corners(&self) -> &ManualCorners {
        &self.manual
    }

    pub fn last_detection(&self) -> Option<&DetectionResult> {
        self.last_detection.as_ref()
    }

    pub fn captured(&self) -> &[CapturedImage] {
        &self.captured
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn overlay(&self) -> &Overlay {
        self.session.preview().overlay()
    }

    // -- Mode changes ---------------------------------------------------------

    /// Open the camera for `kind`, or switch an open session to it.
    ///
    /// Switching releases the current stream and acquires one with the new
    /// kind's preferred facing; captured images are kept. A camera failure
    /// leaves the controller idle with no stream.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn open(&mut self, kind: CaptureKind) -> Result<StreamSettings> {
        if self.state == ScanState::Closed {
            return Err(ScanError::InvalidState("session is closed".into()));
        }

        let settings = match self.session.open(kind.preferred_facing()) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "Camera could not be opened");
                self.state = ScanState::Idle;
                self.refresh_overlay();
                return Err(err);
            }
        };

        if self.config.use_torch {
            self.session.set_torch(true);
        }

        self.state = match kind {
            CaptureKind::PlainPhoto => ScanState::PlainPhoto,
            CaptureKind::DocumentScan => {
                if self.corner_mode == CornerMode::AutoDetect && self.runtime.status() == ReadinessState::Error {
                    info!("Vision backend unavailable; scanning with manual corners");
                    self.corner_mode = CornerMode::ManualSelect;
                }
                ScanState::DocumentScan(self.corner_mode)
            }
        };
        self.last_detection = None;
        self.refresh_overlay();
        info!(state = ?self.state, "Capture surface opened");
        Ok(settings)
    }

    /// Switch an open session between plain photo and document scan.
    pub fn switch_kind(&mut self, kind: CaptureKind) -> Result<StreamSettings> {
        match self.state {
            ScanState::Idle => Err(ScanError::InvalidState("no capture surface is open".into())),
            ScanState::Closed => Err(ScanError::InvalidState("session is closed".into())),
            _ if self.kind() == Some(kind) => self
                .session
                .settings()
                .ok_or(ScanError::CameraNotReady),
            _ => self.open(kind),
        }
    }

    /// Choose between detector-driven and hand-placed corners.
    ///
    /// The last detection and any pending corner selection are dropped; placed
    /// corners are kept. Auto-detect is refused once the backend has failed.
    pub fn set_corner_mode(&mut self, mode: CornerMode) -> Result<()> {
        if self.state == ScanState::Closed {
            return Err(ScanError::InvalidState("session is closed".into()));
        }
        if mode == CornerMode::AutoDetect && self.runtime.status() == ReadinessState::Error {
            return Err(ScanError::VisionBackendUnavailable);
        }

        self.corner_mode = mode;
        if let ScanState::DocumentScan(_) = self.state {
            self.state = ScanState::DocumentScan(mode);
        }
        self.last_detection = None;
        self.manual.clear_selection();
        self.refresh_overlay();
        debug!(?mode, "Corner mode changed");
        Ok(())
    }

    pub fn set_sensitivity(&mut self, value: u32) -> EdgeSensitivity {
        let sensitivity = EdgeSensitivity::new(value);
        self.detector.set_sensitivity(sensitivity);
        sensitivity
    }

    pub fn set_enhancement(&mut self, level: EnhancementLevel) {
        self.enhancement = level;
    }

    /// Best-effort torch switch; false when the track has no torch.
    pub fn set_torch(&mut self, on: bool) -> bool {
        self.session.set_torch(on)
    }

    // -- Manual corners -------------------------------------------------------

    pub fn place_corner(&mut self, point: PercentPoint) -> Result<Placement> {
        self.require_manual()?;
        let placement = self.manual.place(point);
        if placement == Placement::Rejected {
            debug!("Four corners already placed; select one to replace it");
        }
        self.refresh_overlay();
        Ok(placement)
    }

    /// Place a corner from a pointer position over the displayed preview.
    pub fn place_corner_at_display(&mut self, x: f32, y: f32, rect: DisplayRect) -> Result<Placement> {
        self.place_corner(percent_from_display(x, y, rect))
    }

    pub fn select_corner(&mut self, index: usize) -> Result<bool> {
        self.require_manual()?;
        let selected = self.manual.select(index);
        self.refresh_overlay();
        Ok(selected)
    }

    pub fn reset_corners(&mut self) -> Result<()> {
        self.require_manual()?;
        self.manual.reset();
        self.refresh_overlay();
        Ok(())
    }

    /// Placement prompt, while corners are placed by hand.
    pub fn corner_prompt(&self) -> Option<String> {
        match self.state {
            ScanState::DocumentScan(CornerMode::ManualSelect) => Some(self.manual.prompt()),
            _ => None,
        }
    }

    // -- Detection ------------------------------------------------------------

    /// One detection pass over the current preview frame.
    ///
    /// Only runs in auto-detect scan mode with a ready backend. Failures are
    /// logged and shown on the overlay, never returned.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state == ScanState::Closed {
            return TickOutcome::Stop;
        }
        if self.state != ScanState::DocumentScan(CornerMode::AutoDetect) {
            return TickOutcome::Idle;
        }
        let Some(backend) = self.runtime.backend() else {
            return TickOutcome::Idle;
        };

        let frame = match self.session.grab_frame() {
            Ok(frame) => frame,
            Err(err) => {
                debug!(error = %err, "Skipping tick");
                return TickOutcome::Idle;
            }
        };

        let overlay = match self.detector.detect(backend.as_ref(), &frame) {
            Ok(result) => {
                let overlay = match result.corners() {
                    Some(corners) => Overlay::Detected { corners },
                    None => Overlay::NotDetected,
                };
                self.last_detection = Some(result);
                overlay
            }
            Err(err) => {
                warn!(error = %err, "Document detection failed");
                self.last_detection = Some(DetectionResult::NotFound);
                Overlay::DetectionError
            }
        };
        self.session.preview_mut().set_overlay(overlay);
        TickOutcome::Continue
    }

    // -- Capture --------------------------------------------------------------

    /// Capture the current frame into the collection.
    ///
    /// Scans are rectified and enhanced when corners are available. If they
    /// are not, or processing fails, the raw frame is kept and a notice is
    /// returned. Manual mode with fewer than four corners is refused and
    /// changes nothing.
    #[instrument(skip(self), fields(session = %self.id, state = ?self.state))]
    pub fn capture(&mut self) -> Result<CaptureOutcome> {
        let (kind, mode) = match self.state {
            ScanState::PlainPhoto => (CaptureKind::PlainPhoto, None),
            ScanState::DocumentScan(mode) => (CaptureKind::DocumentScan, Some(mode)),
            ScanState::Idle => return Err(ScanError::InvalidState("no capture surface is open".into())),
            ScanState::Closed => return Err(ScanError::InvalidState("session is closed".into())),
        };

        if mode == Some(CornerMode::ManualSelect) && !self.manual.is_complete() {
            return Err(ScanError::IncompleteManualCorners {
                placed: self.manual.len(),
            });
        }

        let frame = self.session.grab_frame()?;

        let (image, rectified, notice) = match mode {
            None => (raw_image(frame), false, None),
            Some(mode) => {
                let processed = self
                    .runtime
                    .backend()
                    .ok_or(ScanError::VisionBackendUnavailable)
                    .and_then(|backend| {
                        let corners = self.capture_corners(mode, backend.as_ref(), &frame)?;
                        self.engine.rectify(backend.as_ref(), &frame, corners, self.enhancement)
                    });
                match processed {
                    Ok(image) => (image, true, None),
                    Err(err) => {
                        warn!(error = %err, "Keeping unrectified image");
                        (raw_image(frame), false, Some(notice_for(&err)))
                    }
                }
            }
        };

        self.captured.push(CapturedImage::new(image, kind, rectified));
        let index = self.captured.len() - 1;
        info!(index, rectified, "Image captured");
        Ok(CaptureOutcome {
            index,
            rectified,
            notice,
        })
    }

    fn capture_corners(
        &self,
        mode: CornerMode,
        backend: &dyn VisionBackend,
        frame: &Frame,
    ) -> Result<[PixelPoint; 4]> {
        match mode {
            CornerMode::ManualSelect => self
                .manual
                .pixel_quad(frame.width(), frame.height())
                .ok_or(ScanError::IncompleteManualCorners {
                    placed: self.manual.len(),
                }),
            CornerMode::AutoDetect => {
                let detection = match &self.last_detection {
                    Some(result) => result.clone(),
                    None => self.detector.detect(backend, frame)?,
                };
                detection.corners().ok_or(ScanError::DetectionNotFound)
            }
        }
    }

    /// Remove one captured image.
    pub fn discard(&mut self, index: usize) -> Result<CapturedImage> {
        if index >= self.captured.len() {
            return Err(ScanError::InvalidState(format!(
                "no captured image at position {index}"
            )));
        }
        Ok(self.captured.remove(index))
    }

    // -- Ending the session ---------------------------------------------------

    /// Close the camera and hand over the collection as PNG attachments.
    ///
    /// Every image is encoded before anything is released. If one fails to
    /// encode the session stays open with its collection intact.
    #[instrument(skip(self), fields(session = %self.id))]
    pub fn finalize(&mut self) -> Result<Vec<Attachment>> {
        if self.state == ScanState::Closed {
            return Err(ScanError::InvalidState("session is closed".into()));
        }

        let attachments = self
            .captured
            .iter()
            .enumerate()
            .map(|(index, image)| Attachment::from_captured(index, image))
            .collect::<Result<Vec<_>>>()?;

        self.captured.clear();
        self.close();
        info!(count = attachments.len(), "Session finalized");
        Ok(attachments)
    }

    /// Close the camera and throw the collection away. Idempotent.
    pub fn cancel(&mut self) {
        let discarded = self.captured.len();
        self.captured.clear();
        self.close();
        debug!(discarded, "Session cancelled");
    }

    fn close(&mut self) {
        self.session.close();
        self.last_detection = None;
        self.manual.clear_selection();
        self.state = ScanState::Closed;
    }

    // -- Controls -------------------------------------------------------------

    pub fn controls(&self) -> Controls {
        let ready = self.runtime.status().is_ready();
        let scanning = matches!(self.state, ScanState::DocumentScan(_));
        let manual = self.state == ScanState::DocumentScan(CornerMode::ManualSelect);
        let auto = self.state == ScanState::DocumentScan(CornerMode::AutoDetect);

        Controls {
            corner_mode_toggle: scanning && ready,
            sensitivity: auto && ready,
            enhancement: scanning && ready,
            torch: self.session.torch_supported(),
            manual_placement: manual,
            capture: self.session.is_live() && (!manual || self.manual.is_complete()),
        }
    }

    // -- Internals ------------------------------------------------------------

    fn require_manual(&self) -> Result<()> {
        match self.state {
            ScanState::DocumentScan(CornerMode::ManualSelect) => Ok(()),
            _ => Err(ScanError::InvalidState("corners can only be placed in manual scan mode".into())),
        }
    }

    fn refresh_overlay(&mut self) {
        let overlay = match self.state {
            ScanState::DocumentScan(CornerMode::ManualSelect) => match self.session.preview().frame_size() {
                Some((width, height)) => Overlay::Manual {
                    corners: self.manual.to_pixel_space(width, height),
                    selected: self.manual.pending_selection(),
                },
                None => Overlay::None,
            },
            _ => Overlay::None,
        };
        self.session.preview_mut().set_overlay(overlay);
    }
}

impl Tickable for ScanController {
    fn tick(&mut self) -> TickOutcome {
        ScanController::tick(self)
    }
}

fn raw_image(frame: Frame) -> DynamicImage {
    DynamicImage::ImageRgba8(frame.into_rgba())
}
