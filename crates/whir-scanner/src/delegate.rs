// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Consumer-facing callbacks.

use std::time::Duration;

use whir_core::error::WhirError;
use whir_core::types::{ScanStatus, Symbology};

use crate::runtime::ScannerHandle;
use crate::session::OverlayState;
use crate::transition::MessageLayout;

/// Receives captured codes and scanner errors.
///
/// Called from the scanner's control task, one call at a time. Use the
/// `ScannerHandle` passed to `on_code_captured` to `reset` or
/// `reset_with_error` once the lookup finishes.
pub trait ScannerDelegate: Send {
    fn on_code_captured(&mut self, code: &str, symbology: Symbology, scanner: &ScannerHandle);

    /// The camera could not be set up or hit a device error.
    fn on_camera_error(&mut self, error: &WhirError) {
        let _ = error;
    }

    /// The user asked to close the scanner.
    fn on_dismiss(&mut self) {}
}

/// Presentation sink for the scanner screen. Every method defaults to a no-op.
pub trait ScannerView: Send {
    /// The message panel should show `message` for `status`, resizing to
    /// `layout` (if given) over `duration`.
    fn show_status(
        &mut self,
        status: &ScanStatus,
        message: &str,
        layout: Option<MessageLayout>,
        duration: Duration,
    ) {
        let _ = (status, message, layout, duration);
    }

    /// Brief white flash over the preview.
    fn flash(&mut self) {}

    fn animate_loading(&mut self) {}

    /// Ask the user to grant camera access. The settings button is hidden
    /// when access is restricted by policy.
    fn show_permission_prompt(&mut self, can_open_settings: bool) {
        let _ = can_open_settings;
    }

    fn overlay_changed(&mut self, overlay: OverlayState) {
        let _ = overlay;
    }
}

/// A view that ignores everything.
pub struct NoView;

impl ScannerView for NoView {}
