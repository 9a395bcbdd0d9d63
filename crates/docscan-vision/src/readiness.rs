// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vision backend readiness: load state machine and the runtime that owns
// the backend handle.
//
// The state moves on exactly one external event at a time and is published
// on a `watch` channel, so the UI has a single place to observe it.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use docscan_core::error::Result;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backend::VisionBackend;

/// Where the vision backend is in its load sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessState {
    Loading,
    LoadingFallback,
    Ready,
    Error,
}

/// External events that move the load sequence forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    PrimaryLoaded,
    PrimaryFailed,
    FallbackLoaded,
    FallbackFailed,
    TimedOut,
}

impl ReadinessState {
    /// The state after `event`. Events that do not apply leave it unchanged;
    /// `Ready` and `Error` accept nothing.
    pub fn on_event(self, event: LoadEvent) -> Self {
        use LoadEvent::*;
        use ReadinessState::*;

        match (self, event) {
            (Loading, PrimaryLoaded) => Ready,
            (Loading, PrimaryFailed) => LoadingFallback,
            (Loading, TimedOut) => Error,
            (LoadingFallback, FallbackLoaded) => Ready,
            (LoadingFallback, FallbackFailed | TimedOut) => Error,
            (state, _) => state,
        }
    }

    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

/// Owns the backend handle and its published readiness.
pub struct VisionRuntime {
    status: watch::Sender<ReadinessState>,
    backend: RwLock<Option<Arc<dyn VisionBackend>>>,
}

impl VisionRuntime {
    /// A runtime still waiting for its backend.
    pub fn new() -> Self {
        let (status, _) = watch::channel(ReadinessState::Loading);
        Self {
            status,
            backend: RwLock::new(None),
        }
    }

    /// A runtime whose backend is available immediately.
    pub fn ready(backend: Arc<dyn VisionBackend>) -> Self {
        info!(backend = backend.name(), "Vision backend ready");
        let (status, _) = watch::channel(ReadinessState::Ready);
        Self {
            status,
            backend: RwLock::new(Some(backend)),
        }
    }

    pub fn status(&self) -> ReadinessState {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.status.subscribe()
    }

    /// Feed one load event through the state machine and publish the result.
    pub fn apply(&self, event: LoadEvent) -> ReadinessState {
        let mut next = ReadinessState::Loading;
        self.status.send_if_modified(|state| {
            let before = *state;
            *state = before.on_event(event);
            next = *state;
            if before == next {
                warn!(?event, state = ?before, "Load event ignored in current state");
            }
            before != next
        });
        next
    }

    /// The backend, only while readiness is `Ready`.
    pub fn backend(&self) -> Option<Arc<dyn VisionBackend>> {
        if !self.status().is_ready() {
            return None;
        }
        self.backend
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Load the primary backend, falling back to a second source when it fails.
    ///
    /// The fallback is only started after the primary has failed and is given
    /// `timeout` to finish. A runtime that is already `Ready` or `Error`
    /// keeps its state and neither loader runs.
    pub async fn load<P, F, Fut>(&self, primary: P, fallback: F, timeout: Duration) -> ReadinessState
    where
        P: Future<Output = Result<Arc<dyn VisionBackend>>>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn VisionBackend>>>,
    {
        let current = self.status();
        if current.is_terminal() {
            debug!(state = ?current, "Vision backend already settled; load skipped");
            return current;
        }

        match primary.await {
            Ok(backend) => return self.install(backend, LoadEvent::PrimaryLoaded),
            Err(err) => {
                warn!(error = %err, "Primary vision backend failed to load; trying fallback");
                self.apply(LoadEvent::PrimaryFailed);
            }
        }

        match tokio::time::timeout(timeout, fallback()).await {
            Ok(Ok(backend)) => self.install(backend, LoadEvent::FallbackLoaded),
            Ok(Err(err)) => {
                warn!(error = %err, "Fallback vision backend failed to load");
                self.apply(LoadEvent::FallbackFailed)
            }
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "Fallback vision backend timed out");
                self.apply(LoadEvent::TimedOut)
            }
        }
    }

    fn install(&self, backend: Arc<dyn VisionBackend>, event: LoadEvent) -> ReadinessState {
        let name = backend.name().to_owned();
        *self
            .backend
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(backend);
        let state = self.apply(event);
        info!(backend = %name, ?state, "Vision backend installed");
        state
    }
}

impl Default for VisionRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VisionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionRuntime")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ImageprocBackend;
    use docscan_core::ScanError;

    fn builtin() -> Arc<dyn VisionBackend> {
        Arc::new(ImageprocBackend::new())
    }

    async fn loads() -> Result<Arc<dyn VisionBackend>> {
        Ok(builtin())
    }

    async fn fails(source: &'static str) -> Result<Arc<dyn VisionBackend>> {
        Err(ScanError::Backend(format!("{source} unavailable")))
    }

    async fn hangs() -> Result<Arc<dyn VisionBackend>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(builtin())
    }

    #[test]
    fn transitions_follow_one_event_each() {
        use LoadEvent::*;
        use ReadinessState::*;

        assert_eq!(Loading.on_event(PrimaryLoaded), Ready);
        assert_eq!(Loading.on_event(PrimaryFailed), LoadingFallback);
        assert_eq!(Loading.on_event(TimedOut), Error);
        assert_eq!(LoadingFallback.on_event(FallbackLoaded), Ready);
        assert_eq!(LoadingFallback.on_event(FallbackFailed), Error);
        assert_eq!(LoadingFallback.on_event(TimedOut), Error);
        assert_eq!(Loading.on_event(FallbackLoaded), Loading);
        assert!(!Loading.is_terminal() && !LoadingFallback.is_terminal());
        assert!(Ready.is_terminal() && Error.is_terminal());
        for event in [PrimaryLoaded, PrimaryFailed, FallbackLoaded, FallbackFailed, TimedOut] {
            assert_eq!(Ready.on_event(event), Ready);
            assert_eq!(Error.on_event(event), Error);
        }
    }

    #[test]
    fn backend_is_hidden_until_ready() {
        let runtime = VisionRuntime::new();
        assert_eq!(runtime.status(), ReadinessState::Loading);
        assert!(runtime.backend().is_none());

        assert!(VisionRuntime::ready(builtin()).backend().is_some());
    }

    #[tokio::test]
    async fn primary_success_is_ready() {
        let runtime = VisionRuntime::new();
        let state = runtime
            .load(loads(), loads, Duration::from_secs(10))
            .await;
        assert_eq!(state, ReadinessState::Ready);
        assert_eq!(runtime.backend().map(|b| b.name().to_owned()).as_deref(), Some("imageproc"));
    }

    #[tokio::test]
    async fn fallback_used_after_primary_failure() {
        let runtime = VisionRuntime::new();
        let mut rx = runtime.subscribe();
        let state = runtime
            .load(fails("primary"), loads, Duration::from_secs(10))
            .await;
        assert_eq!(state, ReadinessState::Ready);
        assert!(rx.has_changed().expect("sender alive"));
        assert_eq!(*rx.borrow_and_update(), ReadinessState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fallback_times_out_into_error() {
        let runtime = VisionRuntime::new();
        let state = runtime
            .load(fails("primary"), hangs, Duration::from_secs(10))
            .await;
        assert_eq!(state, ReadinessState::Error);
        assert!(runtime.backend().is_none());
    }

    #[tokio::test]
    async fn settled_runtime_is_not_reloaded() {
        let ready = VisionRuntime::ready(builtin());
        let state = ready
            .load(fails("primary"), || fails("fallback"), Duration::from_secs(10))
            .await;
        assert_eq!(state, ReadinessState::Ready);
        assert!(ready.backend().is_some());

        let failed = VisionRuntime::new();
        failed.apply(LoadEvent::TimedOut);
        let state = failed.load(loads(), loads, Duration::from_secs(10)).await;
        assert_eq!(state, ReadinessState::Error);
        assert!(failed.backend().is_none());
    }

    #[tokio::test]
    async fn both_sources_failing_is_error() {
        let runtime = VisionRuntime::new();
        let state = runtime
            .load(fails("primary"), || fails("fallback"), Duration::from_secs(10))
            .await;
        assert_eq!(state, ReadinessState::Error);
    }
}
