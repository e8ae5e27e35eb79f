// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WHIR scanner engine.
//
// A scanner is one control task that owns a capture session, a delivery
// filter and the state controller. Decoded frames and consumer commands
// arrive as messages; state changes come out as delegate callbacks and
// view updates.

pub mod controller;
pub mod delegate;
pub mod filter;
pub mod runtime;
pub mod session;
pub mod transition;

pub use controller::ScannerStateController;
pub use delegate::{NoView, ScannerDelegate, ScannerView};
pub use filter::ScanDeliveryFilter;
pub use runtime::{Scanner, ScannerHandle, ScannerSnapshot};
pub use session::{CaptureSessionManager, OverlayState, SessionEvent};
pub use transition::{Effect, MessageLayout};
