// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// WHIR: native camera capture abstractions.
//
// The traits here describe the hardware capture session the scanner drives:
// camera authorisation, device inputs, the metadata (barcode) output and the
// torch. Platform glue on iOS (AVFoundation) and Android (CameraX) implements
// them in the host application; this crate ships a no-camera stub for
// desktop/CI builds and a scriptable simulated camera for tests and demos.

pub mod simulated;
pub mod stub;
pub mod traits;

use std::sync::Arc;

pub use simulated::SimulatedCamera;
pub use stub::StubBackend;
pub use traits::{CaptureBackend, CaptureDeviceInfo, FrameSink};

/// Backend for environments without a native camera bridge.
///
/// Mobile hosts construct their own `CaptureBackend` and hand it to the
/// scanner directly.
pub fn platform_backend() -> Arc<dyn CaptureBackend> {
    Arc::new(StubBackend)
}
