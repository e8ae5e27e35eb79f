// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WHIR: core types, errors and ISBN validation shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod isbn;
pub mod types;

pub use config::{DeliveryMode, PayloadPolicy, ScannerConfig, StateMessages};
pub use error::WhirError;
pub use isbn::Isbn;
pub use types::*;
