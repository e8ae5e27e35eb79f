// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error classification and plain-language messages for the scanner screen.
//
// Classification drives recovery: permission problems wait for the user,
// device hiccups are reported and the session carries on, everything else is
// permanent for this scanner instance.

use crate::error::WhirError;
use crate::types::ErrorClass;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Camera hiccup. Scanning continues on its own.
    Transient,
    /// User must do something (grant camera access, scan another code).
    ActionRequired,
    /// Cannot be fixed on this device.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether scanning resumes without user action.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Classify a `WhirError` for recovery decisions.
pub fn classify_error(err: &WhirError) -> ErrorClass {
    match err {
        WhirError::CameraAccessDenied | WhirError::CameraRestricted => ErrorClass::UserAction,
        WhirError::NotFound(_) | WhirError::InvalidIsbn(_) => ErrorClass::UserAction,

        WhirError::DeviceConfiguration(_)
        | WhirError::Torch(_)
        | WhirError::SessionStart(_)
        | WhirError::Lookup(_) => ErrorClass::Transient,

        WhirError::DeviceUnavailable(_)
        | WhirError::CameraUnavailable
        | WhirError::PlatformUnavailable
        | WhirError::Bridge(_)
        | WhirError::ChannelClosed
        | WhirError::Config(_)
        | WhirError::Serialization(_) => ErrorClass::Permanent,

        WhirError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::Interrupted | std::io::ErrorKind::TimedOut => ErrorClass::Transient,
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                ErrorClass::UserAction
            }
            _ => ErrorClass::Permanent,
        },
    }
}

/// Convert a `WhirError` into a `HumanError` for display.
pub fn humanize_error(err: &WhirError) -> HumanError {
    match err {
        // -- Camera permission --
        WhirError::CameraRestricted => HumanError {
            message: "Camera access has been restricted on this device by a parent or MDM administrator.".into(),
            suggestion: "Ask the person who manages this device to allow camera access.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        WhirError::CameraAccessDenied => HumanError {
            message: "You have denied WHIR access to your device's camera.".into(),
            suggestion: "Open Settings and allow camera access to scan barcodes.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        WhirError::CameraUnavailable => HumanError {
            message: "This device doesn't have a camera we can use.".into(),
            suggestion: "You can still add books by typing the ISBN.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Device configuration --
        WhirError::DeviceUnavailable(position) => HumanError {
            message: format!("The {position} camera isn't available."),
            suggestion: "Keep scanning with the current camera.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        WhirError::DeviceConfiguration(_) | WhirError::SessionStart(_) => HumanError {
            message: "The camera is busy.".into(),
            suggestion: "Close other apps that use the camera. Scanning will carry on with the current camera.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        WhirError::Torch(_) => HumanError {
            message: "The light couldn't be switched.".into(),
            suggestion: "Try scanning in a brighter room.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Codes and lookups --
        WhirError::InvalidIsbn(code) => HumanError {
            message: "That barcode isn't a book.".into(),
            suggestion: format!("Scan the barcode on the back cover that starts with 978 or 979. (Scanned: {code})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        WhirError::NotFound(_) => HumanError {
            message: "No book found".into(),
            suggestion: "Try another barcode, or add the book by hand.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        WhirError::Lookup(_) => HumanError {
            message: "We couldn't look up this book right now.".into(),
            suggestion: "Check your internet connection and scan again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Configuration / persistence --
        WhirError::Config(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Reset the scanner settings. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        WhirError::Io(_) | WhirError::Serialization(_) => HumanError {
            message: "The app had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Platform --
        WhirError::Bridge(_) | WhirError::ChannelClosed => HumanError {
            message: "The scanner stopped unexpectedly.".into(),
            suggestion: "Close the scanner and open it again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        WhirError::PlatformUnavailable => HumanError {
            message: "Barcode scanning isn't available on your device.".into(),
            suggestion: "You can still add books by typing the ISBN.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CaptureDevicePosition;

    #[test]
    fn permission_errors_wait_for_user() {
        assert_eq!(classify_error(&WhirError::CameraAccessDenied), ErrorClass::UserAction);
        assert_eq!(classify_error(&WhirError::CameraRestricted), ErrorClass::UserAction);
        let human = humanize_error(&WhirError::CameraRestricted);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn device_busy_is_transient() {
        let err = WhirError::DeviceConfiguration("device busy".into());
        assert_eq!(classify_error(&err), ErrorClass::Transient);
        assert!(humanize_error(&err).retriable);
    }

    #[test]
    fn missing_front_camera_is_permanent() {
        let err = WhirError::DeviceUnavailable(CaptureDevicePosition::Front);
        assert_eq!(classify_error(&err), ErrorClass::Permanent);
        assert!(humanize_error(&err).message.contains("front"));
    }

    #[test]
    fn missing_file_needs_user() {
        let err = WhirError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(classify_error(&err), ErrorClass::UserAction);
    }
}
