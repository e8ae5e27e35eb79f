// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the WHIR capture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one scanner instance (used to correlate log output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanSessionId(pub Uuid);

impl ScanSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScanSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanSessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which physical camera feeds the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureDevicePosition {
    Front,
    Back,
}

impl CaptureDevicePosition {
    /// The opposite camera.
    pub fn toggled(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
        }
    }
}

impl std::fmt::Display for CaptureDevicePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Front => f.write_str("front"),
            Self::Back => f.write_str("back"),
        }
    }
}

/// Torch (camera light) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorchMode {
    On,
    #[default]
    Off,
}

impl TorchMode {
    /// The mode a single tap on the torch control switches to.
    pub fn next(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

/// Orientation of the video preview connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Barcode symbologies the platform decoder can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Ean8,
    Ean13,
    UpcA,
    UpcE,
    Code39,
    Code93,
    Code128,
    Itf14,
    Interleaved2of5,
    Qr,
    Pdf417,
    Aztec,
    DataMatrix,
}

impl Symbology {
    /// Every symbology, in the order the decoder is configured with by default.
    pub const ALL: [Symbology; 13] = [
        Self::Ean8,
        Self::Ean13,
        Self::UpcA,
        Self::UpcE,
        Self::Code39,
        Self::Code93,
        Self::Code128,
        Self::Itf14,
        Self::Interleaved2of5,
        Self::Qr,
        Self::Pdf417,
        Self::Aztec,
        Self::DataMatrix,
    ];

    /// Platform metadata type identifier reported to the delegate.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Ean8 => "org.gs1.EAN-8",
            Self::Ean13 => "org.gs1.EAN-13",
            Self::UpcA => "org.gs1.UPC-A",
            Self::UpcE => "org.gs1.UPC-E",
            Self::Code39 => "org.iso.Code39",
            Self::Code93 => "org.iso.Code93",
            Self::Code128 => "org.iso.Code128",
            Self::Itf14 => "org.gs1.ITF14",
            Self::Interleaved2of5 => "org.ansi.Interleaved2of5",
            Self::Qr => "org.iso.QRCode",
            Self::Pdf417 => "org.iso.PDF417",
            Self::Aztec => "org.iso.Aztec",
            Self::DataMatrix => "org.iso.DataMatrix",
        }
    }

    /// Parse a platform identifier or a short name (`ean13`, `qr`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(sym) = Self::ALL.iter().find(|s| s.identifier() == name) {
            return Some(*sym);
        }
        match name.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "ean8" => Some(Self::Ean8),
            "ean13" => Some(Self::Ean13),
            "upca" => Some(Self::UpcA),
            "upce" => Some(Self::UpcE),
            "code39" => Some(Self::Code39),
            "code93" => Some(Self::Code93),
            "code128" => Some(Self::Code128),
            "itf14" => Some(Self::Itf14),
            "interleaved2of5" | "i2of5" => Some(Self::Interleaved2of5),
            "qr" | "qrcode" => Some(Self::Qr),
            "pdf417" => Some(Self::Pdf417),
            "aztec" => Some(Self::Aztec),
            "datamatrix" => Some(Self::DataMatrix),
            _ => None,
        }
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A point in preview-layer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One machine-readable code found in a video frame by the platform decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    pub payload: String,
    pub symbology: Symbology,
    /// Corners of the code in the frame, in decoder order.
    pub corners: Vec<Point>,
}

impl DecodedSymbol {
    pub fn new(symbology: Symbology, payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            symbology,
            corners: Vec::new(),
        }
    }
}

/// A normalised, validated code ready to be handed to the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub code: String,
    pub symbology: Symbology,
    pub captured_at: DateTime<Utc>,
}

/// System-wide camera authorisation, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraPermission {
    Granted,
    Denied,
    /// Blocked by parental controls or device management.
    Restricted,
    /// The user has not been asked yet.
    NotDetermined,
}

/// Classification of errors for recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Device busy or a configuration hiccup. The session carries on.
    Transient,
    /// User must take action (grant camera access in system settings).
    UserAction,
    /// Permanent failure such as a missing camera or an unsupported platform.
    Permanent,
}

/// Visible states of the scanner screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    /// Camera running, waiting for a code.
    Scanning,
    /// A code was delivered; waiting for the consumer to finish its lookup.
    Processing,
    /// Camera permission missing.
    Unauthorized,
    /// The consumer reported that the code could not be resolved.
    NotFound,
}

/// The current state plus presentation options.
///
/// A status is never modified; every transition builds a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanStatus {
    state: ScanState,
    animated: bool,
    override_text: Option<String>,
}

impl ScanStatus {
    /// A status for `state`, animated, with the default message.
    pub fn new(state: ScanState) -> Self {
        Self {
            state,
            animated: true,
            override_text: None,
        }
    }

    pub fn with_animated(self, animated: bool) -> Self {
        Self { animated, ..self }
    }

    pub fn with_text(self, text: Option<String>) -> Self {
        Self {
            override_text: text,
            ..self
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn animated(&self) -> bool {
        self.animated
    }

    /// Text that replaces the per-state default message.
    pub fn override_text(&self) -> Option<&str> {
        self.override_text.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbology_parses_identifiers_and_short_names() {
        assert_eq!(Symbology::from_name("org.gs1.EAN-13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::from_name("EAN-13"), Some(Symbology::Ean13));
        assert_eq!(Symbology::from_name("upc_a"), Some(Symbology::UpcA));
        assert_eq!(Symbology::from_name("QR"), Some(Symbology::Qr));
        assert_eq!(Symbology::from_name("morse"), None);
    }

    #[test]
    fn torch_mode_cycles() {
        assert_eq!(TorchMode::Off.next(), TorchMode::On);
        assert_eq!(TorchMode::On.next(), TorchMode::Off);
    }

    #[test]
    fn status_builders_replace_whole_value() {
        let status = ScanStatus::new(ScanState::NotFound).with_text(Some("gone".into()));
        assert_eq!(status.state(), ScanState::NotFound);
        assert!(status.animated());
        assert_eq!(status.override_text(), Some("gone"));

        let quiet = ScanStatus::new(ScanState::Scanning).with_animated(false);
        assert!(!quiet.animated());
        assert_eq!(quiet.override_text(), None);
    }
}
