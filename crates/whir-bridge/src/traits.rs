// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the camera capture session.
//
// Every method may block on hardware; callers run them off the control task.
// Input and output changes must happen between `begin_configuration` and
// `commit_configuration` so the running session never sees half an update.

use std::sync::Arc;

use whir_core::error::Result;
use whir_core::types::{
    CameraPermission, CaptureDevicePosition, DecodedSymbol, Symbology, TorchMode, VideoOrientation,
};

/// Callback the platform decoder invokes with every frame's codes.
///
/// Called on the backend's own worker thread.
pub type FrameSink = Arc<dyn Fn(Vec<DecodedSymbol>) + Send + Sync>;

/// Unified backend that groups all capture capabilities.
pub trait CaptureBackend:
    NativeCameraAuthorization
    + NativeCaptureSession
    + NativeTorch
    + NativePreview
    + NativeSettings
    + Send
    + Sync
{
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;
}

/// System-wide camera permission.
///
/// The answer can change out-of-band (the user flips it in Settings), so
/// callers query it every time instead of caching it.
pub trait NativeCameraAuthorization {
    /// Current authorisation status.
    fn check_permission(&self) -> CameraPermission;

    /// Prompt the user for access. Blocks until they answer.
    fn request_access(&self) -> CameraPermission;
}

/// The hardware capture session: one video input plus a metadata output.
pub trait NativeCaptureSession {
    /// Whether the device has any camera at all.
    fn camera_available(&self) -> bool;

    /// The physical camera at `position`, if present.
    fn device(&self, position: CaptureDevicePosition) -> Option<CaptureDeviceInfo>;

    /// The input currently feeding the running session.
    fn active_input(&self) -> Option<CaptureDeviceInfo>;

    /// Open a configuration transaction.
    fn begin_configuration(&self);

    /// Apply every change made since `begin_configuration` atomically.
    fn commit_configuration(&self);

    /// Remove the current input, if any.
    fn remove_input(&self);

    /// Add `device` as the session input.
    fn add_input(&self, device: &CaptureDeviceInfo) -> Result<()>;

    /// Attach the barcode metadata output, reporting codes of `symbologies`
    /// to `sink`.
    fn attach_metadata_output(&self, symbologies: &[Symbology], sink: FrameSink) -> Result<()>;

    /// Start delivering frames. Blocks until the hardware is running.
    fn start_running(&self) -> Result<()>;

    /// Stop delivering frames. Blocks until the hardware has stopped.
    fn stop_running(&self);

    fn is_running(&self) -> bool;
}

/// The camera-adjacent light.
pub trait NativeTorch {
    /// Switch the torch of `device`. Callers check capability first.
    fn set_torch_mode(&self, device: &CaptureDeviceInfo, mode: TorchMode) -> Result<()>;
}

/// The live preview layer.
pub trait NativePreview {
    /// Rotate the preview connection. Not every connection supports it.
    fn set_video_orientation(&self, orientation: VideoOrientation) -> Result<()>;
}

/// Jump to the system settings page where camera access can be granted.
pub trait NativeSettings {
    fn open_settings(&self) -> Result<()>;
}

/// A physical camera as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDeviceInfo {
    pub id: String,
    pub position: CaptureDevicePosition,
    pub has_torch: bool,
    pub torch_modes: Vec<TorchMode>,
}

impl CaptureDeviceInfo {
    /// A camera without a torch.
    pub fn new(id: impl Into<String>, position: CaptureDevicePosition) -> Self {
        Self {
            id: id.into(),
            position,
            has_torch: false,
            torch_modes: Vec::new(),
        }
    }

    /// Give the camera a torch supporting both modes.
    pub fn with_torch(self) -> Self {
        Self {
            has_torch: true,
            torch_modes: vec![TorchMode::On, TorchMode::Off],
            ..self
        }
    }

    /// Whether `mode` can be applied to this camera.
    pub fn supports_torch(&self, mode: TorchMode) -> bool {
        self.has_torch && self.torch_modes.contains(&mode)
    }
}
