// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution for the scanner driver.

use std::path::{Path, PathBuf};

/// Return the WHIR data directory, creating it if needed.
///
/// Mobile hosts pass their own documents directory to `data_dir_in`.
pub fn data_dir() -> PathBuf {
    data_dir_in(&base_dir())
}

/// The `whir/` directory under `base`.
pub fn data_dir_in(base: &Path) -> PathBuf {
    let dir = base.join("whir");
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(error = %e, dir = %dir.display(), "could not create data directory");
    }
    dir
}

fn base_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from("/tmp")
}
