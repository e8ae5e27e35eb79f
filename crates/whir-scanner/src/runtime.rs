// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner control task.
//
// One tokio task per scanner owns the filter, the controller and the capture
// session manager, and is the only place their state changes. Session events
// (frames, completions) are drained before consumer commands, so a frame that
// arrived before a command is always judged under the old state.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use whir_bridge::traits::CaptureBackend;
use whir_core::config::ScannerConfig;
use whir_core::error::{Result, WhirError};
use whir_core::human_errors::{classify_error, humanize_error};
use whir_core::types::{
    CaptureDevicePosition, ScanSessionId, ScanState, TorchMode, VideoOrientation,
};

use crate::controller::ScannerStateController;
use crate::delegate::{NoView, ScannerDelegate, ScannerView};
use crate::filter::ScanDeliveryFilter;
use crate::session::{CaptureSessionManager, OverlayState, SessionEvent};
use crate::transition::Effect;

#[derive(Debug)]
enum Command {
    Reset { animated: bool },
    ResetWithError(Option<String>),
    SetVisible(bool),
    Dismiss,
    SetCamera(Option<CaptureDevicePosition>),
    SetTorch(Option<TorchMode>),
    Rotate(VideoOrientation),
    EnterForeground,
    OpenSettings,
    RecoveryElapsed(u64),
    Shutdown,
}

/// Observable scanner state, republished after every processed message.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerSnapshot {
    pub state: ScanState,
    pub message: String,
    pub generation: u64,
    pub delivery_locked: bool,
    pub visible: bool,
    /// Frames are flowing from the camera.
    pub capturing: bool,
    pub position: CaptureDevicePosition,
    pub torch: TorchMode,
    pub overlay: OverlayState,
    /// Decoded frames received from the camera so far.
    pub frames: u64,
    /// Codes handed to the delegate so far.
    pub deliveries: u64,
}

/// Cloneable remote control for a running scanner.
#[derive(Clone)]
pub struct ScannerHandle {
    id: ScanSessionId,
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<ScannerSnapshot>,
}

impl ScannerHandle {
    pub fn id(&self) -> ScanSessionId {
        self.id
    }

    /// Resume scanning after a successful lookup.
    pub fn reset(&self, animated: bool) -> Result<()> {
        self.send(Command::Reset { animated })
    }

    /// Show `message` (or the default "not found" text), then resume
    /// scanning automatically.
    pub fn reset_with_error(&self, message: Option<String>) -> Result<()> {
        self.send(Command::ResetWithError(message))
    }

    /// Frames are ignored while the scanner is not on screen. Showing it
    /// again re-checks missing camera access.
    pub fn set_visible(&self, visible: bool) -> Result<()> {
        self.send(Command::SetVisible(visible))
    }

    /// Forward a user close request to the delegate.
    pub fn request_dismiss(&self) -> Result<()> {
        self.send(Command::Dismiss)
    }

    pub fn swap_camera(&self) -> Result<()> {
        self.send(Command::SetCamera(None))
    }

    pub fn set_camera(&self, position: CaptureDevicePosition) -> Result<()> {
        self.send(Command::SetCamera(Some(position)))
    }

    pub fn toggle_torch(&self) -> Result<()> {
        self.send(Command::SetTorch(None))
    }

    pub fn set_torch(&self, mode: TorchMode) -> Result<()> {
        self.send(Command::SetTorch(Some(mode)))
    }

    /// The interface rotated.
    pub fn rotate(&self, orientation: VideoOrientation) -> Result<()> {
        self.send(Command::Rotate(orientation))
    }

    /// The app came back to the foreground. The torch is switched off and
    /// missing camera access is checked again.
    pub fn enter_foreground(&self) -> Result<()> {
        self.send(Command::EnterForeground)
    }

    /// Open the system settings page for camera access.
    pub fn open_settings(&self) -> Result<()> {
        self.send(Command::OpenSettings)
    }

    /// Stop capture and end the control task.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ScannerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&ScannerSnapshot) -> bool,
    ) -> Result<ScannerSnapshot> {
        let mut rx = self.snapshot.clone();
        loop {
            {
                let current = rx.borrow_and_update();
                if predicate(&current) {
                    return Ok(current.clone());
                }
            }
            rx.changed().await.map_err(|_| WhirError::ChannelClosed)?;
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| WhirError::ChannelClosed)
    }
}

/// Builder for a scanner control task.
pub struct Scanner {
    config: ScannerConfig,
    backend: Arc<dyn CaptureBackend>,
    view: Box<dyn ScannerView>,
}

impl Scanner {
    pub fn new(config: ScannerConfig, backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            config,
            backend,
            view: Box::new(NoView),
        }
    }

    pub fn with_view(self, view: impl ScannerView + 'static) -> Self {
        Self {
            view: Box::new(view),
            ..self
        }
    }

    /// Validate the configuration and start the control task.
    ///
    /// Must be called from within a tokio runtime. The session is configured
    /// straight away; the scanner starts visible.
    pub fn spawn(
        self,
        delegate: impl ScannerDelegate + 'static,
    ) -> Result<(ScannerHandle, JoinHandle<()>)> {
        self.config.validate()?;

        let id = ScanSessionId::new();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let session = CaptureSessionManager::new(self.backend, &self.config, session_tx);
        let controller = ScannerStateController::new(&self.config);
        let filter = ScanDeliveryFilter::new(&self.config);

        let initial = ScannerSnapshot {
            state: controller.state(),
            message: controller.message().to_string(),
            generation: controller.generation(),
            delivery_locked: filter.is_locked(),
            visible: filter.is_visible(),
            capturing: false,
            position: session.position(),
            torch: session.torch(),
            overlay: session.overlay(),
            frames: 0,
            deliveries: 0,
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);

        let handle = ScannerHandle {
            id,
            commands: command_tx,
            snapshot: snapshot_rx,
        };

        info!(
            %id,
            platform = session.platform_name(),
            symbologies = self.config.symbologies.len(),
            one_shot = self.config.is_one_shot(),
            "scanner starting"
        );

        let control = ControlLoop {
            controller,
            filter,
            session,
            delegate: Box::new(delegate),
            view: self.view,
            handle: handle.clone(),
            commands: command_rx,
            events: session_rx,
            snapshot: snapshot_tx,
            timer: None,
            overlay: OverlayState::default(),
            frames: 0,
            deliveries: 0,
        };
        let task = tokio::spawn(control.run().instrument(info_span!("scanner", %id)));
        Ok((handle, task))
    }
}

struct ControlLoop {
    controller: ScannerStateController,
    filter: ScanDeliveryFilter,
    session: CaptureSessionManager,
    delegate: Box<dyn ScannerDelegate>,
    view: Box<dyn ScannerView>,
    handle: ScannerHandle,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    snapshot: watch::Sender<ScannerSnapshot>,
    timer: Option<JoinHandle<()>>,
    overlay: OverlayState,
    frames: u64,
    deliveries: u64,
}

impl ControlLoop {
    async fn run(mut self) {
        self.session.configure();

        loop {
            tokio::select! {
                biased;
                Some(event) = self.events.recv() => self.on_session_event(event),
                Some(command) = self.commands.recv() => {
                    if matches!(command, Command::Shutdown) {
                        break;
                    }
                    self.on_command(command);
                }
                else => break,
            }
            self.publish();
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.session.stop();
        info!("scanner stopped");
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Ready => {
                let effects = self.controller.on_session_ready();
                self.apply(effects);
            }
            SessionEvent::Failed(error) => {
                warn!(error = %error, hint = %humanize_error(&error).message, "camera unavailable");
                self.delegate.on_camera_error(&error);
                let can_open_settings = !matches!(error, WhirError::CameraRestricted);
                let effects = self.controller.on_session_failed(can_open_settings);
                self.apply(effects);
            }
            SessionEvent::DeviceError(error) => {
                warn!(error = %error, class = ?classify_error(&error), "camera device error");
                self.delegate.on_camera_error(&error);
            }
            SessionEvent::Symbols(batch) => {
                self.frames += 1;
                if !self.controller.accepts_codes() {
                    trace!(state = ?self.controller.state(), "frame ignored");
                    return;
                }
                if let Some(delivery) = self.filter.accept(&batch) {
                    self.deliveries += 1;
                    let effects = self.controller.on_code_delivered(delivery);
                    self.apply(effects);
                }
            }
            SessionEvent::DeviceChanged(position) => debug!(%position, "camera changed"),
            SessionEvent::TorchChanged(mode) => debug!(?mode, "torch changed"),
            SessionEvent::Started => debug!("capture started"),
            SessionEvent::Stopped => debug!("capture stopped"),
        }
    }

    fn on_command(&mut self, command: Command) {
        debug!(?command, "scanner command");
        match command {
            Command::Reset { animated } => {
                let effects = self.controller.reset(animated);
                self.apply(effects);
            }
            Command::ResetWithError(message) => {
                let effects = self.controller.reset_with_error(message);
                self.apply(effects);
            }
            Command::RecoveryElapsed(generation) => {
                let effects = self.controller.on_recovery_elapsed(generation);
                self.apply(effects);
            }
            Command::SetVisible(visible) => {
                self.filter.set_visible(visible);
                if visible {
                    let effects = self.controller.on_appear();
                    self.apply(effects);
                }
            }
            Command::Dismiss => self.delegate.on_dismiss(),
            Command::SetCamera(Some(position)) => self.session.set_device(position),
            Command::SetCamera(None) => self.session.swap_device(),
            Command::SetTorch(Some(mode)) => self.session.set_torch(mode),
            Command::SetTorch(None) => self.session.toggle_torch(),
            Command::EnterForeground => {
                self.session.set_torch(TorchMode::Off);
                let effects = self.controller.on_appear();
                self.apply(effects);
            }
            Command::Rotate(orientation) => self.session.set_orientation(orientation),
            Command::OpenSettings => self.session.open_settings(),
            Command::Shutdown => {}
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LockDelivery => self.filter.lock(),
                Effect::ArmDelivery => self.filter.rearm(),
                Effect::StartCapture => self.session.start(),
                Effect::StopCapture => self.session.stop(),
                Effect::ShowStatus {
                    status,
                    layout,
                    duration,
                } => {
                    let message = self.controller.message_for(&status);
                    self.view.show_status(&status, message, layout, duration);
                }
                Effect::Flash => self.view.flash(),
                Effect::AnimateLoading => self.view.animate_loading(),
                Effect::ShowPermissionPrompt { can_open_settings } => {
                    self.view.show_permission_prompt(can_open_settings)
                }
                Effect::NotifyCodeCaptured(delivery) => {
                    self.delegate
                        .on_code_captured(&delivery.code, delivery.symbology, &self.handle)
                }
                Effect::ScheduleRecovery { generation, after } => {
                    if let Some(previous) = self.timer.take() {
                        previous.abort();
                    }
                    let commands = self.handle.commands.clone();
                    self.timer = Some(tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let _ = commands.send(Command::RecoveryElapsed(generation));
                    }));
                }
                Effect::CheckPermission => self.session.configure(),
            }
        }

        if self.controller.state() != ScanState::NotFound {
            if let Some(timer) = self.timer.take() {
                timer.abort();
            }
        }
    }

    fn publish(&mut self) {
        let overlay = self.session.overlay();
        if overlay != self.overlay {
            self.overlay = overlay;
            self.view.overlay_changed(overlay);
        }

        self.snapshot.send_replace(ScannerSnapshot {
            state: self.controller.state(),
            message: self.controller.message().to_string(),
            generation: self.controller.generation(),
            delivery_locked: self.filter.is_locked(),
            visible: self.filter.is_visible(),
            capturing: self.session.is_running(),
            position: self.session.position(),
            torch: self.session.torch(),
            overlay,
            frames: self.frames,
            deliveries: self.deliveries,
        });
    }
}
