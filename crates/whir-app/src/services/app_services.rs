// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration and collaborators for the driver.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use whir_core::config::{DeliveryMode, ScannerConfig};
use whir_core::error::{Result, WhirError};
use whir_core::types::CaptureDevicePosition;

use super::data_dir;
use super::lookup::{BookLookup, CatalogueLookup};

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "scanner.json";

/// Which preset the scanner starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Isbn,
    Product,
}

impl ScanMode {
    pub fn preset(self) -> ScannerConfig {
        match self {
            Self::Isbn => ScannerConfig::isbn(),
            Self::Product => ScannerConfig::product_lookup(),
        }
    }
}

impl FromStr for ScanMode {
    type Err = WhirError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "isbn" => Ok(Self::Isbn),
            "product" => Ok(Self::Product),
            other => Err(WhirError::Config(format!(
                "unknown mode {other:?} (expected isbn or product)"
            ))),
        }
    }
}

/// Command-line options.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub mode: Option<ScanMode>,
    pub continuous: bool,
    pub front: bool,
    pub lookup: Option<PathBuf>,
}

/// Everything the driver needs to run a scanner.
pub struct AppServices {
    pub data_dir: PathBuf,
    pub config: ScannerConfig,
    pub lookup: Arc<dyn BookLookup>,
}

impl AppServices {
    pub fn init(options: &CliOptions) -> Result<Self> {
        Self::init_in(data_dir::data_dir(), options)
    }

    /// Resolve configuration against an explicit data directory.
    ///
    /// Precedence: `--config`, then `--mode`, then `scanner.json`, then the
    /// ISBN preset (written to `scanner.json` for next time).
    pub fn init_in(data_dir: PathBuf, options: &CliOptions) -> Result<Self> {
        let mut config = resolve_config(&data_dir, options)?;
        if options.continuous {
            config.delivery = DeliveryMode::Continuous;
        }
        if options.front {
            config.initial_position = CaptureDevicePosition::Front;
        }
        config.validate()?;

        let lookup: Arc<dyn BookLookup> = match &options.lookup {
            Some(path) => Arc::new(CatalogueLookup::load(path)?),
            None => Arc::new(CatalogueLookup::empty()),
        };

        tracing::info!(
            data_dir = %data_dir.display(),
            policy = ?config.policy,
            delivery = ?config.delivery,
            "scanner services initialised"
        );
        Ok(Self {
            data_dir,
            config,
            lookup,
        })
    }
}

fn resolve_config(data_dir: &Path, options: &CliOptions) -> Result<ScannerConfig> {
    if let Some(path) = &options.config {
        return ScannerConfig::load(path);
    }
    if let Some(mode) = options.mode {
        return Ok(mode.preset());
    }

    let path = data_dir.join(CONFIG_FILE);
    if path.exists() {
        return ScannerConfig::load(&path);
    }
    let config = ScannerConfig::isbn();
    if let Err(e) = config.save(&path) {
        tracing::warn!(error = %e, "failed to persist default scanner config");
    }
    Ok(config)
}
