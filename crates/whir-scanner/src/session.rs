// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session manager.
//
// Sole owner of the camera backend. Every hardware call runs on a serial
// session worker (one `spawn_blocking` job at a time, in submission order),
// so a `stop` queued behind a `start` always runs after it. Outcomes come
// back as `SessionEvent`s on an unbounded channel; no hardware error is ever
// returned to the caller directly.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use whir_bridge::traits::{
    CaptureBackend, FrameSink, NativeCameraAuthorization, NativeCaptureSession, NativePreview,
    NativeSettings, NativeTorch,
};
use whir_core::config::ScannerConfig;
use whir_core::error::WhirError;
use whir_core::types::{
    CameraPermission, CaptureDevicePosition, DecodedSymbol, Symbology, TorchMode, VideoOrientation,
};

/// Outcome of a session operation, or a frame of decoded codes.
#[derive(Debug)]
pub enum SessionEvent {
    /// Configuration finished (or was skipped because there is no camera).
    Ready,
    /// The session cannot be used: permission denied or restricted.
    Failed(WhirError),
    /// One video frame's worth of decoded codes.
    Symbols(Vec<DecodedSymbol>),
    /// A recoverable device problem. The session carries on.
    DeviceError(WhirError),
    /// The input now comes from the camera at this position.
    DeviceChanged(CaptureDevicePosition),
    TorchChanged(TorchMode),
    Started,
    Stopped,
}

/// Which capture controls the preview should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayState {
    pub focus_visible: bool,
    pub torch_control_visible: bool,
    pub camera_switch_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct Shared {
    phase: Phase,
    position: CaptureDevicePosition,
    torch: TorchMode,
    overlay: OverlayState,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Owns the capture backend and serialises every operation on it.
pub struct CaptureSessionManager {
    backend: Arc<dyn CaptureBackend>,
    events: mpsc::UnboundedSender<SessionEvent>,
    jobs: mpsc::UnboundedSender<Job>,
    shared: Arc<Mutex<Shared>>,
    symbologies: Vec<Symbology>,
    shows_camera_button: bool,
}

impl CaptureSessionManager {
    /// Create a manager and its session worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        config: &ScannerConfig,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(job) = queue.recv().await {
                if let Err(e) = tokio::task::spawn_blocking(job).await {
                    warn!(error = %e, "capture session job aborted");
                }
            }
            debug!("capture session worker finished");
        });

        Self {
            backend,
            events,
            jobs,
            shared: Arc::new(Mutex::new(Shared {
                phase: Phase::Stopped,
                position: config.initial_position,
                torch: TorchMode::Off,
                overlay: OverlayState::default(),
            })),
            symbologies: config.symbologies.clone(),
            shows_camera_button: config.shows_camera_button,
        }
    }

    /// Resolve camera permission, then wire input and metadata output.
    #[instrument(skip(self))]
    pub fn configure(&self) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let shared = Arc::clone(&self.shared);
        let symbologies = self.symbologies.clone();
        self.submit(move || {
            for event in configure_session(backend.as_ref(), &shared, &symbologies, &events) {
                let _ = events.send(event);
            }
        });
    }

    /// Start delivering frames. Idempotent.
    #[instrument(skip(self))]
    pub fn start(&self) {
        if !self.backend.camera_available() {
            debug!("no camera available, start ignored");
            return;
        }
        {
            let mut shared = lock(&self.shared);
            if matches!(shared.phase, Phase::Starting | Phase::Running) {
                debug!(phase = ?shared.phase, "capture already started");
                return;
            }
            shared.phase = Phase::Starting;
            shared.overlay = OverlayState {
                focus_visible: true,
                torch_control_visible: shared.position != CaptureDevicePosition::Front,
                camera_switch_visible: self.shows_camera_button,
            };
        }

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let shared = Arc::clone(&self.shared);
        self.submit(move || {
            if apply_torch(backend.as_ref(), &shared, TorchMode::Off) {
                let _ = events.send(SessionEvent::TorchChanged(TorchMode::Off));
            }
            let event = match backend.start_running() {
                Ok(()) => {
                    let mut shared = lock(&shared);
                    if shared.phase == Phase::Starting {
                        shared.phase = Phase::Running;
                    }
                    info!("capture session running");
                    SessionEvent::Started
                }
                Err(e) => {
                    let mut shared = lock(&shared);
                    if shared.phase == Phase::Starting {
                        shared.phase = Phase::Stopped;
                    }
                    shared.overlay = OverlayState::default();
                    warn!(error = %e, "capture session failed to start");
                    failure_event(e)
                }
            };
            let _ = events.send(event);
        });
    }

    /// Stop delivering frames. Idempotent; the torch is always switched off.
    #[instrument(skip(self))]
    pub fn stop(&self) {
        let running = {
            let mut shared = lock(&self.shared);
            shared.overlay = OverlayState::default();
            let running = matches!(shared.phase, Phase::Starting | Phase::Running);
            if running {
                shared.phase = Phase::Stopping;
            }
            running
        };

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let shared = Arc::clone(&self.shared);
        self.submit(move || {
            if apply_torch(backend.as_ref(), &shared, TorchMode::Off) {
                let _ = events.send(SessionEvent::TorchChanged(TorchMode::Off));
            }
            if !running {
                return;
            }
            backend.stop_running();
            {
                let mut shared = lock(&shared);
                if shared.phase == Phase::Stopping {
                    shared.phase = Phase::Stopped;
                }
            }
            info!("capture session stopped");
            let _ = events.send(SessionEvent::Stopped);
        });
    }

    /// Feed the session from the camera at `position`.
    ///
    /// A missing camera is ignored. If the new camera cannot be added, the
    /// previous input is put back in the same transaction.
    #[instrument(skip(self))]
    pub fn set_device(&self, position: CaptureDevicePosition) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let shared = Arc::clone(&self.shared);
        self.submit(move || {
            if let Some(event) = switch_input(backend.as_ref(), &shared, position) {
                let _ = events.send(event);
            }
        });
    }

    /// Switch between the front and back cameras.
    pub fn swap_device(&self) {
        let target = lock(&self.shared).position.toggled();
        self.set_device(target);
    }

    /// Set the torch of the active camera, if it has one.
    #[instrument(skip(self))]
    pub fn set_torch(&self, mode: TorchMode) {
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let shared = Arc::clone(&self.shared);
        self.submit(move || {
            if apply_torch(backend.as_ref(), &shared, mode) {
                let _ = events.send(SessionEvent::TorchChanged(mode));
            }
        });
    }

    pub fn toggle_torch(&self) {
        let next = lock(&self.shared).torch.next();
        self.set_torch(next);
    }

    /// Rotate the preview to follow the interface.
    pub fn set_orientation(&self, orientation: VideoOrientation) {
        let backend = Arc::clone(&self.backend);
        self.submit(move || {
            if let Err(e) = backend.set_video_orientation(orientation) {
                debug!(error = %e, ?orientation, "preview orientation not applied");
            }
        });
    }

    /// Open the system settings page for camera access.
    pub fn open_settings(&self) {
        let backend = Arc::clone(&self.backend);
        self.submit(move || {
            if let Err(e) = backend.open_settings() {
                warn!(error = %e, "could not open system settings");
            }
        });
    }

    pub fn overlay(&self) -> OverlayState {
        lock(&self.shared).overlay
    }

    pub fn position(&self) -> CaptureDevicePosition {
        lock(&self.shared).position
    }

    pub fn torch(&self) -> TorchMode {
        lock(&self.shared).torch
    }

    /// Whether the hardware session is (or is about to be) running.
    pub fn is_capturing(&self) -> bool {
        matches!(lock(&self.shared).phase, Phase::Starting | Phase::Running)
    }

    /// Whether frames are flowing.
    pub fn is_running(&self) -> bool {
        lock(&self.shared).phase == Phase::Running
    }

    pub fn platform_name(&self) -> &str {
        self.backend.platform_name()
    }

    fn submit(&self, job: impl FnOnce() + Send + 'static) {
        if self.jobs.send(Box::new(job)).is_err() {
            warn!("capture session worker is gone, job dropped");
        }
    }
}

impl Drop for CaptureSessionManager {
    fn drop(&mut self) {
        if self.is_capturing() {
            self.stop();
        }
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Permission errors end the session; anything else is recoverable.
fn failure_event(e: WhirError) -> SessionEvent {
    if e.is_permission() {
        SessionEvent::Failed(e)
    } else {
        SessionEvent::DeviceError(e)
    }
}

fn configure_session(
    backend: &dyn CaptureBackend,
    shared: &Mutex<Shared>,
    symbologies: &[Symbology],
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> Vec<SessionEvent> {
    if !backend.camera_available() {
        info!(platform = backend.platform_name(), "no camera available, scanning disabled");
        return vec![SessionEvent::Ready];
    }

    let mut permission = backend.check_permission();
    if permission == CameraPermission::NotDetermined {
        info!("asking for camera access");
        backend.request_access();
        permission = backend.check_permission();
    }
    match permission {
        CameraPermission::Granted => {}
        CameraPermission::Restricted => return vec![SessionEvent::Failed(WhirError::CameraRestricted)],
        CameraPermission::Denied | CameraPermission::NotDetermined => {
            return vec![SessionEvent::Failed(WhirError::CameraAccessDenied)];
        }
    }

    let wanted = lock(shared).position;
    let device = backend
        .device(wanted)
        .or_else(|| backend.device(wanted.toggled()));

    let sink: FrameSink = {
        let events = events.clone();
        Arc::new(move |symbols: Vec<DecodedSymbol>| {
            let _ = events.send(SessionEvent::Symbols(symbols));
        })
    };

    backend.begin_configuration();
    backend.remove_input();
    let input = match &device {
        Some(device) => backend.add_input(device),
        None => Err(WhirError::CameraUnavailable),
    };
    let output = backend.attach_metadata_output(symbologies, sink);
    backend.commit_configuration();

    let mut out = Vec::new();
    match input {
        Ok(()) => {
            if let Some(device) = &device {
                lock(shared).position = device.position;
                info!(position = %device.position, id = %device.id, "capture input configured");
            }
        }
        Err(e) if e.is_permission() => return vec![SessionEvent::Failed(e)],
        Err(e) => {
            warn!(error = %e, "capture input could not be added");
            out.push(SessionEvent::DeviceError(e));
        }
    }
    if let Err(e) = output {
        warn!(error = %e, "metadata output could not be attached");
        out.push(SessionEvent::DeviceError(e));
    }
    out.push(SessionEvent::Ready);
    out
}

fn switch_input(
    backend: &dyn CaptureBackend,
    shared: &Mutex<Shared>,
    position: CaptureDevicePosition,
) -> Option<SessionEvent> {
    let Some(device) = backend.device(position) else {
        debug!(%position, "no camera at requested position, keeping current input");
        return None;
    };
    let previous = backend.active_input();
    if previous.as_ref() == Some(&device) {
        return None;
    }

    backend.begin_configuration();
    backend.remove_input();
    let added = backend.add_input(&device);
    if added.is_err() {
        if let Some(previous) = &previous {
            if let Err(e) = backend.add_input(previous) {
                warn!(error = %e, "previous input could not be restored");
            }
        }
    }
    backend.commit_configuration();

    match added {
        Ok(()) => {
            let mut shared = lock(shared);
            shared.position = position;
            // A new device starts with its torch off.
            shared.torch = TorchMode::Off;
            if shared.overlay.focus_visible {
                shared.overlay.torch_control_visible = position != CaptureDevicePosition::Front;
            }
            info!(%position, "capture input switched");
            Some(SessionEvent::DeviceChanged(position))
        }
        Err(e) => {
            warn!(error = %e, %position, "camera switch failed, previous input kept");
            Some(SessionEvent::DeviceError(e))
        }
    }
}

/// Returns whether the torch mode changed.
fn apply_torch(backend: &dyn CaptureBackend, shared: &Mutex<Shared>, mode: TorchMode) -> bool {
    let Some(device) = backend.active_input() else {
        return false;
    };
    if !device.supports_torch(mode) {
        debug!(?mode, position = %device.position, "torch mode not supported");
        return false;
    }
    if let Err(e) = backend.set_torch_mode(&device, mode) {
        debug!(error = %e, ?mode, "torch change failed");
        return false;
    }
    let mut shared = lock(shared);
    let changed = shared.torch != mode;
    shared.torch = mode;
    changed
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use whir_bridge::SimulatedCamera;

    use super::*;

    fn manager(
        camera: &Arc<SimulatedCamera>,
        config: &ScannerConfig,
    ) -> (CaptureSessionManager, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend: Arc<dyn CaptureBackend> = camera.clone();
        (CaptureSessionManager::new(backend, config, tx), rx)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("session event in time")
            .expect("event channel open")
    }

    #[tokio::test]
    async fn configure_wires_session_in_one_transaction() {
        let camera = Arc::new(SimulatedCamera::new());
        let config = ScannerConfig::isbn();
        let (session, mut rx) = manager(&camera, &config);

        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        assert_eq!(camera.transactions(), 1);
        assert_eq!(camera.unbracketed_changes(), 0);
        assert_eq!(camera.configured_symbologies(), vec![Symbology::Ean13]);
        assert_eq!(
            camera.active_input().map(|d| d.position),
            Some(CaptureDevicePosition::Back)
        );
    }

    #[tokio::test]
    async fn undetermined_permission_prompts_once() {
        let camera = Arc::new(
            SimulatedCamera::new()
                .with_permission(CameraPermission::NotDetermined)
                .answering_prompt_with(CameraPermission::Granted),
        );
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());

        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));
        assert_eq!(camera.prompts(), 1);
    }

    #[tokio::test]
    async fn denied_and_restricted_permission_fail() {
        let camera = Arc::new(SimulatedCamera::new().with_permission(CameraPermission::Denied));
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::Failed(WhirError::CameraAccessDenied)
        ));
        assert_eq!(camera.prompts(), 0);

        let camera = Arc::new(SimulatedCamera::new().with_permission(CameraPermission::Restricted));
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::Failed(WhirError::CameraRestricted)
        ));
    }

    #[tokio::test]
    async fn missing_camera_is_not_fatal() {
        let camera = Arc::new(SimulatedCamera::without_camera());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());

        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        session.start();
        assert!(!session.is_capturing());
        assert_eq!(camera.permission_queries(), 0);
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let camera = Arc::new(SimulatedCamera::new());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        session.start();
        session.start();
        assert!(matches!(next(&mut rx).await, SessionEvent::Started));
        assert!(camera.is_running());
        assert!(session.overlay().focus_visible);
        assert!(session.overlay().torch_control_visible);

        session.stop();
        session.stop();
        assert!(matches!(next(&mut rx).await, SessionEvent::Stopped));
        assert!(!camera.is_running());
        assert_eq!(session.overlay(), OverlayState::default());

        // Only one Started/Stopped pair was produced.
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));
    }

    #[tokio::test]
    async fn stop_turns_torch_off() {
        let camera = Arc::new(SimulatedCamera::new());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));
        session.start();
        assert!(matches!(next(&mut rx).await, SessionEvent::Started));

        session.toggle_torch();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::TorchChanged(TorchMode::On)
        ));
        session.stop();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::TorchChanged(TorchMode::Off)
        ));
        assert!(matches!(next(&mut rx).await, SessionEvent::Stopped));
        assert_eq!(camera.torch_mode(), TorchMode::Off);
        assert_eq!(session.torch(), TorchMode::Off);
    }

    #[tokio::test]
    async fn start_failure_is_reported_not_raised() {
        let camera = Arc::new(SimulatedCamera::new());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        camera.fail_next_start("interrupted by a phone call");
        session.start();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::DeviceError(WhirError::SessionStart(_))
        ));
        assert!(!session.is_capturing());
    }

    #[tokio::test]
    async fn missing_front_camera_keeps_back_input() {
        let camera = Arc::new(SimulatedCamera::back_only());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        session.set_device(CaptureDevicePosition::Front);
        // The switch produces no event; the next one is the configure below.
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));
        assert_eq!(
            camera.active_input().map(|d| d.position),
            Some(CaptureDevicePosition::Back)
        );
        assert_eq!(session.position(), CaptureDevicePosition::Back);
    }

    #[tokio::test]
    async fn failed_switch_restores_previous_input() {
        let camera = Arc::new(SimulatedCamera::new());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        camera.set_busy(CaptureDevicePosition::Front, true);
        session.swap_device();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::DeviceError(WhirError::DeviceConfiguration(_))
        ));
        assert_eq!(
            camera.active_input().map(|d| d.position),
            Some(CaptureDevicePosition::Back)
        );
        assert_eq!(camera.unbracketed_changes(), 0);

        camera.set_busy(CaptureDevicePosition::Front, false);
        session.swap_device();
        assert!(matches!(
            next(&mut rx).await,
            SessionEvent::DeviceChanged(CaptureDevicePosition::Front)
        ));
        assert_eq!(session.position(), CaptureDevicePosition::Front);
    }

    #[tokio::test]
    async fn frames_arrive_as_symbol_events() {
        let camera = Arc::new(SimulatedCamera::new());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));
        session.start();
        assert!(matches!(next(&mut rx).await, SessionEvent::Started));

        assert!(camera.emit(vec![DecodedSymbol::new(Symbology::Qr, "hello")]));
        match next(&mut rx).await {
            SessionEvent::Symbols(symbols) => assert_eq!(symbols[0].payload, "hello"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn orientation_follows_interface() {
        let camera = Arc::new(SimulatedCamera::new());
        let (session, mut rx) = manager(&camera, &ScannerConfig::default());
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));

        session.set_orientation(VideoOrientation::LandscapeLeft);
        session.configure();
        assert!(matches!(next(&mut rx).await, SessionEvent::Ready));
        assert_eq!(camera.orientation(), VideoOrientation::LandscapeLeft);
    }
}
