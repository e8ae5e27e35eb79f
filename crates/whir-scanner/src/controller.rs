// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner state controller.
//
// Holds the one active `ScanStatus` and turns events (session ready, session
// failed, code delivered, consumer reset, recovery timer) into effect lists.
// Every state entry bumps a generation counter; a recovery timer only fires
// if its generation is still current.

use tracing::{debug, info};

use whir_core::config::{ScannerConfig, StateMessages};
use whir_core::types::{Delivery, ScanState, ScanStatus};

use crate::transition::{Effect, NOT_FOUND_RECOVERY_DELAY, transition};

#[derive(Debug)]
pub struct ScannerStateController {
    status: ScanStatus,
    generation: u64,
    one_shot: bool,
    messages: StateMessages,
}

impl ScannerStateController {
    pub fn new(config: &ScannerConfig) -> Self {
        Self {
            status: ScanStatus::new(ScanState::Scanning),
            generation: 0,
            one_shot: config.is_one_shot(),
            messages: config.messages.clone(),
        }
    }

    pub fn status(&self) -> &ScanStatus {
        &self.status
    }

    pub fn state(&self) -> ScanState {
        self.status.state()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Text for the current status: the override if any, else the default.
    pub fn message(&self) -> &str {
        self.message_for(&self.status)
    }

    pub fn message_for<'a>(&'a self, status: &'a ScanStatus) -> &'a str {
        status
            .override_text()
            .unwrap_or_else(|| self.messages.text_for(status.state()))
    }

    /// Codes are only taken while the camera is meant to be scanning.
    pub fn accepts_codes(&self) -> bool {
        self.status.state() == ScanState::Scanning
    }

    /// The capture session finished configuring.
    ///
    /// Only resumes scanning from `Scanning`, or from `Unauthorized` after a
    /// fresh permission check. A late completion never cuts `Processing` or
    /// `NotFound` short.
    pub fn on_session_ready(&mut self) -> Vec<Effect> {
        match self.state() {
            ScanState::Scanning | ScanState::Unauthorized => {
                self.enter(ScanStatus::new(ScanState::Scanning))
            }
            state => {
                debug!(?state, "session ready ignored");
                Vec::new()
            }
        }
    }

    /// The capture session cannot run (camera access missing).
    pub fn on_session_failed(&mut self, can_open_settings: bool) -> Vec<Effect> {
        let mut effects = self.enter(ScanStatus::new(ScanState::Unauthorized));
        effects.push(Effect::ShowPermissionPrompt { can_open_settings });
        effects
    }

    /// A code passed the delivery filter.
    pub fn on_code_delivered(&mut self, delivery: Delivery) -> Vec<Effect> {
        info!(code = %delivery.code, symbology = %delivery.symbology, "code captured");
        let mut effects = vec![Effect::NotifyCodeCaptured(delivery), Effect::Flash];
        if self.one_shot {
            effects.extend(self.enter(ScanStatus::new(ScanState::Processing)));
        }
        effects
    }

    /// Return to scanning. Safe to call in any state.
    ///
    /// Without camera access this only asks for a new permission check;
    /// scanning resumes once the session reports ready.
    pub fn reset(&mut self, animated: bool) -> Vec<Effect> {
        if self.state() == ScanState::Unauthorized {
            return self.recheck_permission();
        }
        self.enter(ScanStatus::new(ScanState::Scanning).with_animated(animated))
    }

    /// Show a "not found" message, then resume scanning on a timer.
    pub fn reset_with_error(&mut self, message: Option<String>) -> Vec<Effect> {
        if self.state() == ScanState::Unauthorized {
            debug!(?message, "no scan to report while unauthorized");
            return self.recheck_permission();
        }
        let mut effects = self.enter(ScanStatus::new(ScanState::NotFound).with_text(message));
        effects.push(Effect::ScheduleRecovery {
            generation: self.generation,
            after: NOT_FOUND_RECOVERY_DELAY,
        });
        effects
    }

    /// The recovery timer scheduled for `generation` elapsed.
    pub fn on_recovery_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation || self.state() != ScanState::NotFound {
            debug!(
                generation,
                current = self.generation,
                state = ?self.state(),
                "stale recovery timer ignored"
            );
            return Vec::new();
        }
        self.enter(ScanStatus::new(ScanState::Scanning))
    }

    /// The scanner is back on screen or the app returned to the foreground.
    pub fn on_appear(&mut self) -> Vec<Effect> {
        if self.state() == ScanState::Unauthorized {
            self.recheck_permission()
        } else {
            Vec::new()
        }
    }

    fn recheck_permission(&self) -> Vec<Effect> {
        info!("checking camera access again");
        vec![Effect::CheckPermission]
    }

    fn enter(&mut self, next: ScanStatus) -> Vec<Effect> {
        let old = std::mem::replace(&mut self.status, next);
        self.generation += 1;
        info!(
            from = ?old.state(),
            to = ?self.status.state(),
            generation = self.generation,
            "scanner state changed"
        );
        transition(&old, &self.status, self.one_shot)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use whir_core::config::DeliveryMode;
    use whir_core::types::Symbology;

    use super::*;

    fn delivery(code: &str) -> Delivery {
        Delivery {
            code: code.into(),
            symbology: Symbology::Ean13,
            captured_at: Utc::now(),
        }
    }

    fn recovery_generation(effects: &[Effect]) -> u64 {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::ScheduleRecovery { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("recovery scheduled")
    }

    #[test]
    fn one_shot_delivery_enters_processing() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        controller.on_session_ready();

        let effects = controller.on_code_delivered(delivery("9783161484100"));
        assert!(matches!(effects[0], Effect::NotifyCodeCaptured(_)));
        assert_eq!(effects[1], Effect::Flash);
        assert!(effects.contains(&Effect::LockDelivery));
        assert_eq!(controller.state(), ScanState::Processing);
        assert!(!controller.accepts_codes());
        assert_eq!(controller.message(), "Looking for your book...");
    }

    #[test]
    fn continuous_delivery_stays_scanning() {
        let config = ScannerConfig {
            delivery: DeliveryMode::Continuous,
            ..ScannerConfig::product_lookup()
        };
        let mut controller = ScannerStateController::new(&config);
        let effects = controller.on_code_delivered(delivery("hello"));
        assert_eq!(effects.len(), 2);
        assert_eq!(controller.state(), ScanState::Scanning);
    }

    #[test]
    fn reset_while_scanning_is_harmless() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        let effects = controller.reset(true);
        assert_eq!(controller.state(), ScanState::Scanning);
        assert!(!effects.contains(&Effect::LockDelivery));
        assert!(effects.contains(&Effect::ArmDelivery));
    }

    #[test]
    fn session_failure_shows_permission_prompt() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        let effects = controller.on_session_failed(false);
        assert_eq!(controller.state(), ScanState::Unauthorized);
        assert!(effects.contains(&Effect::StopCapture));
        assert_eq!(
            effects.last(),
            Some(&Effect::ShowPermissionPrompt {
                can_open_settings: false
            })
        );
    }

    #[test]
    fn error_message_overrides_default_text() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        controller.reset_with_error(Some("No book found for 9783161484100".into()));
        assert_eq!(controller.message(), "No book found for 9783161484100");

        controller.reset_with_error(None);
        assert_eq!(controller.message(), "No book found");
    }

    #[test]
    fn recovery_timer_fires_once() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        let generation = recovery_generation(&controller.reset_with_error(None));

        let effects = controller.on_recovery_elapsed(generation);
        assert_eq!(controller.state(), ScanState::Scanning);
        assert!(effects.contains(&Effect::StartCapture));

        assert!(controller.on_recovery_elapsed(generation).is_empty());
    }

    #[test]
    fn newer_error_supersedes_older_timer() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        let first = recovery_generation(&controller.reset_with_error(Some("one".into())));
        let second = recovery_generation(&controller.reset_with_error(Some("two".into())));
        assert!(second > first);

        assert!(controller.on_recovery_elapsed(first).is_empty());
        assert_eq!(controller.state(), ScanState::NotFound);
        assert!(!controller.on_recovery_elapsed(second).is_empty());
        assert_eq!(controller.state(), ScanState::Scanning);
    }

    #[test]
    fn manual_reset_cancels_pending_recovery() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        let generation = recovery_generation(&controller.reset_with_error(None));
        controller.reset(false);
        assert!(controller.on_recovery_elapsed(generation).is_empty());
    }

    #[test]
    fn late_ready_keeps_not_found() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        let generation = recovery_generation(&controller.reset_with_error(Some("early".into())));

        assert!(controller.on_session_ready().is_empty());
        assert_eq!(controller.state(), ScanState::NotFound);
        assert_eq!(controller.generation(), generation);
        assert_eq!(controller.message(), "early");
        assert!(!controller.on_recovery_elapsed(generation).is_empty());
        assert_eq!(controller.state(), ScanState::Scanning);
    }

    #[test]
    fn late_ready_keeps_processing() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        controller.on_code_delivered(delivery("9783161484100"));
        assert!(controller.on_session_ready().is_empty());
        assert_eq!(controller.state(), ScanState::Processing);
    }

    #[test]
    fn resets_while_unauthorized_only_recheck_permission() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        controller.on_session_failed(true);
        let generation = controller.generation();

        assert_eq!(controller.reset(false), vec![Effect::CheckPermission]);
        assert_eq!(
            controller.reset_with_error(Some("No book found".into())),
            vec![Effect::CheckPermission]
        );
        assert_eq!(controller.on_appear(), vec![Effect::CheckPermission]);
        assert_eq!(controller.state(), ScanState::Unauthorized);
        assert_eq!(controller.generation(), generation);
    }

    #[test]
    fn granted_recheck_resumes_scanning() {
        let mut controller = ScannerStateController::new(&ScannerConfig::isbn());
        controller.on_session_failed(true);

        let effects = controller.on_session_ready();
        assert_eq!(controller.state(), ScanState::Scanning);
        assert!(effects.contains(&Effect::StartCapture));
        assert!(controller.on_appear().is_empty());
    }
}
