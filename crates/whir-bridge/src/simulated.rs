// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scriptable in-memory camera.
//
// Behaves like a platform capture session: inputs staged inside a
// configuration transaction only become visible on commit, frames are only
// delivered while running and outside a transaction, and the decoder only
// reports the symbologies the output was configured with. Tests and the
// headless `whir-scan` binary drive it by pushing frames with `emit`.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use whir_core::error::{Result, WhirError};
use whir_core::types::{
    CameraPermission, CaptureDevicePosition, DecodedSymbol, Symbology, TorchMode, VideoOrientation,
};

use crate::traits::*;

#[derive(Default)]
struct SimState {
    permission: Option<CameraPermission>,
    /// Answer given when the user is prompted.
    prompt_answer: Option<CameraPermission>,
    devices: Vec<CaptureDeviceInfo>,
    /// Input visible to the running session.
    committed_input: Option<CaptureDeviceInfo>,
    /// Input being edited inside a transaction.
    staged_input: Option<CaptureDeviceInfo>,
    config_depth: u32,
    transactions: u32,
    unbracketed_changes: u32,
    sink: Option<FrameSink>,
    symbologies: Vec<Symbology>,
    running: bool,
    torch: TorchMode,
    orientation: VideoOrientation,
    busy: HashSet<CaptureDevicePosition>,
    fail_next_start: Option<String>,
    permission_queries: u32,
    prompts: u32,
    settings_opened: u32,
}

/// In-memory `CaptureBackend` for tests and demos.
pub struct SimulatedCamera {
    state: Mutex<SimState>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    /// A phone with a torch-equipped back camera and a plain front camera,
    /// camera access already granted.
    pub fn new() -> Self {
        Self::with_devices(vec![
            CaptureDeviceInfo::new("sim-back", CaptureDevicePosition::Back).with_torch(),
            CaptureDeviceInfo::new("sim-front", CaptureDevicePosition::Front),
        ])
    }

    /// A device with only a back camera.
    pub fn back_only() -> Self {
        Self::with_devices(vec![
            CaptureDeviceInfo::new("sim-back", CaptureDevicePosition::Back).with_torch(),
        ])
    }

    /// A device with no camera at all.
    pub fn without_camera() -> Self {
        Self::with_devices(Vec::new())
    }

    pub fn with_devices(devices: Vec<CaptureDeviceInfo>) -> Self {
        Self {
            state: Mutex::new(SimState {
                permission: Some(CameraPermission::Granted),
                devices,
                ..SimState::default()
            }),
        }
    }

    /// Start from a given permission status.
    pub fn with_permission(self, permission: CameraPermission) -> Self {
        self.state().permission = Some(permission);
        self
    }

    /// What the user answers when prompted for access.
    pub fn answering_prompt_with(self, answer: CameraPermission) -> Self {
        self.state().prompt_answer = Some(answer);
        self
    }

    /// Change the system permission out-of-band.
    pub fn set_permission(&self, permission: CameraPermission) {
        self.state().permission = Some(permission);
    }

    /// Make the camera at `position` refuse to be added as an input.
    pub fn set_busy(&self, position: CaptureDevicePosition, busy: bool) {
        let mut state = self.state();
        if busy {
            state.busy.insert(position);
        } else {
            state.busy.remove(&position);
        }
    }

    /// Make the next `start_running` fail with `reason`.
    pub fn fail_next_start(&self, reason: impl Into<String>) {
        self.state().fail_next_start = Some(reason.into());
    }

    /// Push one decoded frame through the metadata output.
    ///
    /// Returns `false` when the frame was not delivered (session stopped,
    /// mid-configuration, or no output attached). Symbols of types the
    /// output was not configured for are removed, as a platform decoder would.
    pub fn emit(&self, symbols: Vec<DecodedSymbol>) -> bool {
        let (sink, symbols) = {
            let state = self.state();
            if !state.running || state.config_depth > 0 {
                return false;
            }
            let Some(sink) = state.sink.clone() else {
                return false;
            };
            let symbols: Vec<DecodedSymbol> = symbols
                .into_iter()
                .filter(|s| state.symbologies.contains(&s.symbology))
                .collect();
            (sink, symbols)
        };
        // The lock is released before calling out so the sink may query us.
        sink(symbols);
        true
    }

    pub fn torch_mode(&self) -> TorchMode {
        self.state().torch
    }

    pub fn is_configuring(&self) -> bool {
        self.state().config_depth > 0
    }

    pub fn orientation(&self) -> VideoOrientation {
        self.state().orientation
    }

    /// Number of committed configuration transactions.
    pub fn transactions(&self) -> u32 {
        self.state().transactions
    }

    /// Input/output changes made outside a transaction.
    pub fn unbracketed_changes(&self) -> u32 {
        self.state().unbracketed_changes
    }

    pub fn permission_queries(&self) -> u32 {
        self.state().permission_queries
    }

    pub fn prompts(&self) -> u32 {
        self.state().prompts
    }

    pub fn settings_opened(&self) -> u32 {
        self.state().settings_opened
    }

    pub fn configured_symbologies(&self) -> Vec<Symbology> {
        self.state().symbologies.clone()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CaptureBackend for SimulatedCamera {
    fn platform_name(&self) -> &str {
        "Simulated camera"
    }
}

impl NativeCameraAuthorization for SimulatedCamera {
    fn check_permission(&self) -> CameraPermission {
        let mut state = self.state();
        state.permission_queries += 1;
        state.permission.unwrap_or(CameraPermission::NotDetermined)
    }

    fn request_access(&self) -> CameraPermission {
        let mut state = self.state();
        state.prompts += 1;
        if state.permission == Some(CameraPermission::NotDetermined) {
            let answer = state.prompt_answer.unwrap_or(CameraPermission::Granted);
            state.permission = Some(answer);
        }
        state.permission.unwrap_or(CameraPermission::NotDetermined)
    }
}

impl NativeCaptureSession for SimulatedCamera {
    fn camera_available(&self) -> bool {
        !self.state().devices.is_empty()
    }

    fn device(&self, position: CaptureDevicePosition) -> Option<CaptureDeviceInfo> {
        self.state()
            .devices
            .iter()
            .find(|d| d.position == position)
            .cloned()
    }

    fn active_input(&self) -> Option<CaptureDeviceInfo> {
        self.state().committed_input.clone()
    }

    fn begin_configuration(&self) {
        let mut state = self.state();
        if state.config_depth == 0 {
            state.staged_input = state.committed_input.clone();
        }
        state.config_depth += 1;
    }

    fn commit_configuration(&self) {
        let mut state = self.state();
        if state.config_depth == 0 {
            return;
        }
        state.config_depth -= 1;
        if state.config_depth == 0 {
            state.committed_input = state.staged_input.clone();
            state.transactions += 1;
            debug!(input = ?state.committed_input.as_ref().map(|d| d.position), "simulated session committed");
        }
    }

    fn remove_input(&self) {
        let mut state = self.state();
        if state.config_depth == 0 {
            state.unbracketed_changes += 1;
            state.committed_input = None;
        }
        state.staged_input = None;
    }

    fn add_input(&self, device: &CaptureDeviceInfo) -> Result<()> {
        let mut state = self.state();
        if state.busy.contains(&device.position) {
            return Err(WhirError::DeviceConfiguration(format!(
                "{} camera is in use by another client",
                device.position
            )));
        }
        if !state.devices.contains(device) {
            return Err(WhirError::DeviceUnavailable(device.position));
        }
        if state.config_depth == 0 {
            state.unbracketed_changes += 1;
            state.committed_input = Some(device.clone());
        }
        state.staged_input = Some(device.clone());
        Ok(())
    }

    fn attach_metadata_output(&self, symbologies: &[Symbology], sink: FrameSink) -> Result<()> {
        let mut state = self.state();
        if state.config_depth == 0 {
            state.unbracketed_changes += 1;
        }
        state.symbologies = symbologies.to_vec();
        state.sink = Some(sink);
        Ok(())
    }

    fn start_running(&self) -> Result<()> {
        let mut state = self.state();
        if let Some(reason) = state.fail_next_start.take() {
            return Err(WhirError::SessionStart(reason));
        }
        if !state.running {
            state.running = true;
            info!("simulated session running");
        }
        Ok(())
    }

    fn stop_running(&self) {
        let mut state = self.state();
        if state.running {
            state.running = false;
            info!("simulated session stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.state().running
    }
}

impl NativeTorch for SimulatedCamera {
    fn set_torch_mode(&self, device: &CaptureDeviceInfo, mode: TorchMode) -> Result<()> {
        if !device.supports_torch(mode) {
            return Err(WhirError::Torch(format!("{} camera has no torch", device.position)));
        }
        self.state().torch = mode;
        Ok(())
    }
}

impl NativePreview for SimulatedCamera {
    fn set_video_orientation(&self, orientation: VideoOrientation) -> Result<()> {
        let mut state = self.state();
        if state.committed_input.is_none() {
            return Err(WhirError::Bridge("preview has no video connection".into()));
        }
        state.orientation = orientation;
        Ok(())
    }
}

impl NativeSettings for SimulatedCamera {
    fn open_settings(&self) -> Result<()> {
        self.state().settings_opened += 1;
        Ok(())
    }
}
