// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WhirError};
use crate::types::{CaptureDevicePosition, ScanState, Symbology};

/// How many codes a scanner hands out before it must be reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Deliver one code, then wait for `reset()`.
    OneShot,
    /// Deliver every accepted code.
    Continuous,
}

/// Which payloads the delivery filter lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadPolicy {
    /// Any decoded code (product lookup flow).
    AnyCode,
    /// Only payloads that pass ISBN validation (book scanner flow).
    Isbn,
}

/// Default text shown under the camera for each state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMessages {
    pub scanning: String,
    pub processing: String,
    pub unauthorized: String,
    pub not_found: String,
}

impl Default for StateMessages {
    fn default() -> Self {
        Self {
            scanning: "Place the barcode within the window to scan. The search will start automatically.".into(),
            processing: "Looking for your book...".into(),
            unauthorized: "In order to scan barcodes you have to allow camera under your settings.".into(),
            not_found: "No book found".into(),
        }
    }
}

impl StateMessages {
    /// Message for `state`.
    pub fn text_for(&self, state: ScanState) -> &str {
        match state {
            ScanState::Scanning => &self.scanning,
            ScanState::Processing => &self.processing,
            ScanState::Unauthorized => &self.unauthorized,
            ScanState::NotFound => &self.not_found,
        }
    }
}

/// Settings for one scanner screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Symbologies the decoder is asked to recognise.
    pub symbologies: Vec<Symbology>,
    /// One-shot or continuous delivery.
    pub delivery: DeliveryMode,
    /// Payload validation applied before delivery.
    pub policy: PayloadPolicy,
    /// Camera used when the session is first configured.
    pub initial_position: CaptureDevicePosition,
    /// Whether the front/back switch control is shown.
    pub shows_camera_button: bool,
    /// Per-state messages.
    pub messages: StateMessages,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::product_lookup()
    }
}

impl ScannerConfig {
    /// Generic barcode scanning: any recognised code, one at a time.
    pub fn product_lookup() -> Self {
        Self {
            symbologies: Symbology::ALL.to_vec(),
            delivery: DeliveryMode::OneShot,
            policy: PayloadPolicy::AnyCode,
            initial_position: CaptureDevicePosition::Back,
            shows_camera_button: false,
            messages: StateMessages::default(),
        }
    }

    /// Dedicated book scanner: EAN-13 only, ISBN-validated, one at a time.
    pub fn isbn() -> Self {
        Self {
            symbologies: vec![Symbology::Ean13],
            policy: PayloadPolicy::Isbn,
            ..Self::product_lookup()
        }
    }

    pub fn is_one_shot(&self) -> bool {
        self.delivery == DeliveryMode::OneShot
    }

    /// Reject configurations the scanner cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.symbologies.is_empty() {
            return Err(WhirError::Config("no symbologies configured".into()));
        }
        if self.policy == PayloadPolicy::Isbn && !self.symbologies.contains(&Symbology::Ean13) {
            return Err(WhirError::Config(
                "ISBN scanning requires the EAN-13 symbology".into(),
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_only_in_filtering() {
        let isbn = ScannerConfig::isbn();
        let product = ScannerConfig::product_lookup();
        assert_eq!(isbn.policy, PayloadPolicy::Isbn);
        assert_eq!(product.policy, PayloadPolicy::AnyCode);
        assert_eq!(isbn.symbologies, vec![Symbology::Ean13]);
        assert!(isbn.is_one_shot() && product.is_one_shot());
        assert!(isbn.validate().is_ok());
        assert!(product.validate().is_ok());
    }

    #[test]
    fn isbn_policy_needs_ean13() {
        let config = ScannerConfig {
            symbologies: vec![Symbology::Qr],
            ..ScannerConfig::isbn()
        };
        assert!(matches!(config.validate(), Err(WhirError::Config(_))));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ScannerConfig =
            serde_json::from_str(r#"{"delivery": "continuous", "initial_position": "front"}"#)
                .expect("parse");
        assert_eq!(config.delivery, DeliveryMode::Continuous);
        assert_eq!(config.initial_position, CaptureDevicePosition::Front);
        assert_eq!(config.symbologies, Symbology::ALL.to_vec());
        assert_eq!(config.messages, StateMessages::default());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scanner.json");
        let mut config = ScannerConfig::isbn();
        config.messages.not_found = "Nothing here".into();
        config.save(&path).expect("save");

        let loaded = ScannerConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
        assert_eq!(loaded.messages.text_for(ScanState::NotFound), "Nothing here");
    }

    #[test]
    fn load_rejects_invalid_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scanner.json");
        std::fs::write(&path, r#"{"symbologies": []}"#).expect("write");
        assert!(matches!(ScannerConfig::load(&path), Err(WhirError::Config(_))));
    }
}
