// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub backend for desktop/CI builds where no camera exists.
//
// Reports no camera, so the session manager treats every start as a no-op.
// Hardware methods return `PlatformUnavailable` if reached anyway.

use whir_core::error::{Result, WhirError};
use whir_core::types::{
    CameraPermission, CaptureDevicePosition, Symbology, TorchMode, VideoOrientation,
};

use crate::traits::*;

/// No-op backend returned on platforms without a native bridge.
pub struct StubBackend;

impl CaptureBackend for StubBackend {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }
}

impl NativeCameraAuthorization for StubBackend {
    fn check_permission(&self) -> CameraPermission {
        CameraPermission::NotDetermined
    }

    fn request_access(&self) -> CameraPermission {
        tracing::warn!("NativeCameraAuthorization::request_access called on stub backend");
        CameraPermission::NotDetermined
    }
}

impl NativeCaptureSession for StubBackend {
    fn camera_available(&self) -> bool {
        false
    }

    fn device(&self, _position: CaptureDevicePosition) -> Option<CaptureDeviceInfo> {
        None
    }

    fn active_input(&self) -> Option<CaptureDeviceInfo> {
        None
    }

    fn begin_configuration(&self) {}

    fn commit_configuration(&self) {}

    fn remove_input(&self) {}

    fn add_input(&self, _device: &CaptureDeviceInfo) -> Result<()> {
        tracing::warn!("NativeCaptureSession::add_input called on stub backend");
        Err(WhirError::PlatformUnavailable)
    }

    fn attach_metadata_output(&self, _symbologies: &[Symbology], _sink: FrameSink) -> Result<()> {
        tracing::warn!("NativeCaptureSession::attach_metadata_output called on stub backend");
        Err(WhirError::PlatformUnavailable)
    }

    fn start_running(&self) -> Result<()> {
        tracing::warn!("NativeCaptureSession::start_running called on stub backend");
        Err(WhirError::PlatformUnavailable)
    }

    fn stop_running(&self) {}

    fn is_running(&self) -> bool {
        false
    }
}

impl NativeTorch for StubBackend {
    fn set_torch_mode(&self, _device: &CaptureDeviceInfo, _mode: TorchMode) -> Result<()> {
        Err(WhirError::PlatformUnavailable)
    }
}

impl NativePreview for StubBackend {
    fn set_video_orientation(&self, _orientation: VideoOrientation) -> Result<()> {
        Err(WhirError::PlatformUnavailable)
    }
}

impl NativeSettings for StubBackend {
    fn open_settings(&self) -> Result<()> {
        tracing::warn!("NativeSettings::open_settings called on stub backend");
        Err(WhirError::PlatformUnavailable)
    }
}
