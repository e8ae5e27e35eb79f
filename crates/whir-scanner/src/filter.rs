// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan delivery filter.
//
// Turns the raw stream of decoded frames into at most one delivery per scan
// attempt: first symbol of a frame only, EAN-13 "0" prefix normalised to
// UPC-A, optional ISBN validation, and a one-shot lock that is set before the
// delivery leaves this module.

use chrono::Utc;
use tracing::debug;

use whir_core::config::{PayloadPolicy, ScannerConfig};
use whir_core::isbn;
use whir_core::types::{DecodedSymbol, Delivery, Symbology};

/// Gatekeeper between decoded frames and the scanner state machine.
#[derive(Debug, Clone)]
pub struct ScanDeliveryFilter {
    symbologies: Vec<Symbology>,
    policy: PayloadPolicy,
    one_shot: bool,
    locked: bool,
    visible: bool,
}

impl ScanDeliveryFilter {
    /// An armed, visible filter for `config`.
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            symbologies: config.symbologies.clone(),
            policy: config.policy,
            one_shot: config.is_one_shot(),
            locked: false,
            visible: true,
        }
    }

    /// Decide whether `batch` produces a delivery.
    pub fn accept(&mut self, batch: &[DecodedSymbol]) -> Option<Delivery> {
        if self.locked || !self.visible {
            return None;
        }
        let symbol = batch.first()?;
        if !self.symbologies.contains(&symbol.symbology) {
            debug!(symbology = %symbol.symbology, "symbology not configured, frame dropped");
            return None;
        }

        let (code, symbology) = normalize(symbol);
        if self.policy == PayloadPolicy::Isbn && !isbn::is_valid(&code) {
            debug!(%code, "not an ISBN, frame dropped");
            return None;
        }

        if self.one_shot {
            self.locked = true;
        }
        Some(Delivery {
            code,
            symbology,
            captured_at: Utc::now(),
        })
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn rearm(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Frames are ignored while the scanner UI is off screen.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// UPC-A codes are reported by decoders as EAN-13 with a leading zero.
fn normalize(symbol: &DecodedSymbol) -> (String, Symbology) {
    match symbol.payload.strip_prefix('0') {
        Some(rest) if symbol.symbology == Symbology::Ean13 => (rest.to_string(), Symbology::UpcA),
        _ => (symbol.payload.clone(), symbol.symbology),
    }
}

#[cfg(test)]
mod tests {
    use whir_core::config::DeliveryMode;

    use super::*;

    fn frame(symbology: Symbology, payload: &str) -> Vec<DecodedSymbol> {
        vec![DecodedSymbol::new(symbology, payload)]
    }

    fn continuous(config: ScannerConfig) -> ScannerConfig {
        ScannerConfig {
            delivery: DeliveryMode::Continuous,
            ..config
        }
    }

    #[test]
    fn leading_zero_ean13_becomes_upca() {
        let mut filter = ScanDeliveryFilter::new(&ScannerConfig::product_lookup());
        let delivery = filter
            .accept(&frame(Symbology::Ean13, "0012345678905"))
            .expect("delivered");
        assert_eq!(delivery.code, "012345678905");
        assert_eq!(delivery.symbology, Symbology::UpcA);
    }

    #[test]
    fn isbn_policy_drops_invalid_codes_without_locking() {
        let mut filter = ScanDeliveryFilter::new(&ScannerConfig::isbn());
        assert!(filter.accept(&frame(Symbology::Ean13, "9780306406153")).is_none());
        assert!(filter.accept(&frame(Symbology::Ean13, "5901234123457")).is_none());
        assert!(!filter.is_locked());

        let delivery = filter
            .accept(&frame(Symbology::Ean13, "9780306406157"))
            .expect("valid ISBN delivered");
        assert_eq!(delivery.code, "9780306406157");
        assert_eq!(delivery.symbology, Symbology::Ean13);
        assert!(filter.is_locked());
    }

    #[test]
    fn burst_in_one_shot_mode_delivers_once() {
        let mut filter = ScanDeliveryFilter::new(&ScannerConfig::isbn());
        let delivered = (0..20)
            .filter_map(|_| filter.accept(&frame(Symbology::Ean13, "9783161484100")))
            .count();
        assert_eq!(delivered, 1);

        filter.rearm();
        assert!(filter.accept(&frame(Symbology::Ean13, "9783161484100")).is_some());
    }

    #[test]
    fn continuous_mode_never_locks() {
        let mut filter = ScanDeliveryFilter::new(&continuous(ScannerConfig::product_lookup()));
        for _ in 0..3 {
            assert!(filter.accept(&frame(Symbology::Qr, "hello")).is_some());
        }
        assert!(!filter.is_locked());
    }

    #[test]
    fn only_first_symbol_of_a_frame_counts() {
        let mut filter = ScanDeliveryFilter::new(&ScannerConfig::isbn());
        let batch = vec![
            DecodedSymbol::new(Symbology::Qr, "hello"),
            DecodedSymbol::new(Symbology::Ean13, "9783161484100"),
        ];
        assert!(filter.accept(&batch).is_none());
        assert!(filter.accept(&[]).is_none());
        assert!(!filter.is_locked());
    }

    #[test]
    fn hidden_or_locked_filter_ignores_frames() {
        let mut filter = ScanDeliveryFilter::new(&ScannerConfig::product_lookup());
        filter.set_visible(false);
        assert!(filter.accept(&frame(Symbology::Qr, "hello")).is_none());
        filter.set_visible(true);

        filter.lock();
        assert!(filter.accept(&frame(Symbology::Qr, "hello")).is_none());
        filter.rearm();
        assert!(filter.accept(&frame(Symbology::Qr, "hello")).is_some());
    }
}
