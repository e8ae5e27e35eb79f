// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner delegate and console view for the driver.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use whir_core::error::WhirError;
use whir_core::human_errors::humanize_error;
use whir_core::isbn::Isbn;
use whir_core::types::{ScanStatus, Symbology};
use whir_scanner::{MessageLayout, ScannerDelegate, ScannerHandle, ScannerView};

use crate::services::lookup::{BookLookup, BookRecord};

/// What happened to one captured code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(BookRecord),
    NotFound(String),
    /// A non-ISBN code (product lookup mode).
    Captured { code: String, symbology: Symbology },
    LookupFailed(String),
    CameraError(String),
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(book) => write!(f, "found\t{}\t{}", book.isbn, book.title),
            Self::NotFound(isbn) => write!(f, "not-found\t{isbn}"),
            Self::Captured { code, symbology } => write!(f, "captured\t{symbology}\t{code}"),
            Self::LookupFailed(message) => write!(f, "lookup-error\t{message}"),
            Self::CameraError(message) => write!(f, "camera-error\t{message}"),
        }
    }
}

/// Resolves captured ISBNs against a catalogue and resets the scanner.
pub struct LookupDelegate {
    lookup: Arc<dyn BookLookup>,
    outcomes: mpsc::UnboundedSender<ScanOutcome>,
}

impl LookupDelegate {
    pub fn new(lookup: Arc<dyn BookLookup>, outcomes: mpsc::UnboundedSender<ScanOutcome>) -> Self {
        Self { lookup, outcomes }
    }

    fn resolve(&self, code: &str, symbology: Symbology) -> ScanOutcome {
        let Ok(isbn) = Isbn::parse(code) else {
            return ScanOutcome::Captured {
                code: code.to_string(),
                symbology,
            };
        };
        match self.lookup.find(&isbn) {
            Ok(Some(book)) => ScanOutcome::Found(book),
            Ok(None) => ScanOutcome::NotFound(isbn.to_string()),
            Err(e) => ScanOutcome::LookupFailed(humanize_error(&e).message),
        }
    }

    fn report(&self, outcome: ScanOutcome) {
        if self.outcomes.send(outcome).is_err() {
            debug!("outcome receiver gone");
        }
    }
}

impl ScannerDelegate for LookupDelegate {
    fn on_code_captured(&mut self, code: &str, symbology: Symbology, scanner: &ScannerHandle) {
        let outcome = self.resolve(code, symbology);
        let sent = match &outcome {
            ScanOutcome::NotFound(isbn) => {
                scanner.reset_with_error(Some(format!("No book found for {isbn}")))
            }
            ScanOutcome::LookupFailed(message) => scanner.reset_with_error(Some(message.clone())),
            _ => scanner.reset(true),
        };
        if let Err(e) = sent {
            warn!(error = %e, "could not reset scanner");
        }
        self.report(outcome);
    }

    fn on_camera_error(&mut self, error: &WhirError) {
        let human = humanize_error(error);
        warn!(error = %error, suggestion = %human.suggestion, "{}", human.message);
        self.report(ScanOutcome::CameraError(human.message));
    }

    fn on_dismiss(&mut self) {
        info!("scanner dismissed");
    }
}

/// Logs what a scanner screen would show.
pub struct ConsoleView;

impl ScannerView for ConsoleView {
    fn show_status(
        &mut self,
        status: &ScanStatus,
        message: &str,
        layout: Option<MessageLayout>,
        _duration: Duration,
    ) {
        info!(state = ?status.state(), ?layout, "{message}");
    }

    fn flash(&mut self) {
        debug!("flash");
    }

    fn show_permission_prompt(&mut self, can_open_settings: bool) {
        warn!(can_open_settings, "camera access needed");
    }
}
