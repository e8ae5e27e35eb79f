// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for WHIR.

use thiserror::Error;

use crate::types::CaptureDevicePosition;

/// Top-level error type for all WHIR scanner operations.
#[derive(Debug, Error)]
pub enum WhirError {
    // -- Camera permission / availability --
    #[error("camera access denied")]
    CameraAccessDenied,

    #[error("camera access restricted by device policy")]
    CameraRestricted,

    #[error("no camera available on this device")]
    CameraUnavailable,

    // -- Device configuration --
    #[error("{0} camera is not available")]
    DeviceUnavailable(CaptureDevicePosition),

    #[error("capture device configuration failed: {0}")]
    DeviceConfiguration(String),

    #[error("torch configuration failed: {0}")]
    Torch(String),

    #[error("capture session failed to start: {0}")]
    SessionStart(String),

    // -- Codes and lookups --
    #[error("not a valid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("no record found: {0}")]
    NotFound(String),

    #[error("lookup failed: {0}")]
    Lookup(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("scanner control channel closed")]
    ChannelClosed,

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl WhirError {
    /// Whether this error means the camera can never be used until the user
    /// changes the system permission.
    pub fn is_permission(&self) -> bool {
        matches!(self, Self::CameraAccessDenied | Self::CameraRestricted)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WhirError>;
