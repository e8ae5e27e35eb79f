// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner state transitions as data.
//
// `transition` maps an (old, new) status pair to the ordered list of side
// effects the runtime must apply. It never touches hardware or UI itself.

use std::time::Duration;

use whir_core::types::{Delivery, ScanState, ScanStatus};

/// Length of the animated message-panel change.
pub const TRANSITION_ANIMATION: Duration = Duration::from_millis(500);

/// Time a "not found" message stays up before scanning resumes.
pub const NOT_FOUND_RECOVERY_DELAY: Duration = Duration::from_secs(2);

/// Length of the white flash shown when a code is captured.
pub const FLASH_DURATION: Duration = Duration::from_millis(200);

/// Size of the message panel under the camera preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageLayout {
    /// Small banner; the preview stays visible.
    #[default]
    Collapsed,
    /// Panel covers the preview while a lookup runs.
    Expanded,
}

/// One side effect of a state change, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Stop the filter from delivering.
    LockDelivery,
    /// Let the filter deliver again.
    ArmDelivery,
    StartCapture,
    StopCapture,
    /// Present `status`. `layout: None` keeps the current panel size.
    ShowStatus {
        status: ScanStatus,
        layout: Option<MessageLayout>,
        duration: Duration,
    },
    Flash,
    AnimateLoading,
    ShowPermissionPrompt {
        can_open_settings: bool,
    },
    NotifyCodeCaptured(Delivery),
    ScheduleRecovery {
        generation: u64,
        after: Duration,
    },
    /// Query camera permission again and reconfigure the session.
    CheckPermission,
}

/// Side effects of moving from `old` to `new`.
///
/// Entering `NotFound` locks delivery and stops capture immediately. Other
/// transitions animate the panel when `new` asks for animation and the
/// change involves `Processing` or leaves `NotFound`; when leaving
/// `Processing` or `NotFound` the capture reset runs after the animation.
pub fn transition(old: &ScanStatus, new: &ScanStatus, one_shot: bool) -> Vec<Effect> {
    if new.state() == ScanState::NotFound {
        return vec![
            Effect::LockDelivery,
            Effect::StopCapture,
            Effect::ShowStatus {
                status: new.clone(),
                layout: None,
                duration: Duration::ZERO,
            },
        ];
    }

    let leaving_busy = matches!(old.state(), ScanState::Processing | ScanState::NotFound);
    let involves_panel = new.state() == ScanState::Processing || leaving_busy;
    let duration = if new.animated() && involves_panel {
        TRANSITION_ANIMATION
    } else {
        Duration::ZERO
    };
    let layout = match new.state() {
        ScanState::Processing => MessageLayout::Expanded,
        _ => MessageLayout::Collapsed,
    };

    let reset = capture_reset(new.state(), one_shot);
    let mut effects = Vec::with_capacity(reset.len() + 2);
    if !leaving_busy {
        effects.extend(reset.iter().cloned());
    }
    effects.push(Effect::ShowStatus {
        status: new.clone(),
        layout: Some(layout),
        duration,
    });
    if leaving_busy {
        effects.extend(reset);
    }
    if new.state() == ScanState::Processing {
        effects.push(Effect::AnimateLoading);
    }
    effects
}

/// Lock and capture changes required by `state`.
fn capture_reset(state: ScanState, one_shot: bool) -> Vec<Effect> {
    match state {
        ScanState::Scanning => vec![Effect::ArmDelivery, Effect::StartCapture],
        ScanState::Processing if one_shot => vec![Effect::LockDelivery, Effect::StopCapture],
        ScanState::Processing => vec![Effect::ArmDelivery, Effect::StopCapture],
        ScanState::Unauthorized => vec![Effect::ArmDelivery, Effect::StopCapture],
        ScanState::NotFound => vec![Effect::LockDelivery, Effect::StopCapture],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(state: ScanState) -> ScanStatus {
        ScanStatus::new(state)
    }

    fn shown(effects: &[Effect]) -> (Option<MessageLayout>, Duration) {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::ShowStatus { layout, duration, .. } => Some((*layout, *duration)),
                _ => None,
            })
            .expect("status shown")
    }

    #[test]
    fn scanning_to_processing_locks_and_expands() {
        let effects = transition(&status(ScanState::Scanning), &status(ScanState::Processing), true);
        assert_eq!(effects[0], Effect::LockDelivery);
        assert_eq!(effects[1], Effect::StopCapture);
        assert_eq!(shown(&effects), (Some(MessageLayout::Expanded), TRANSITION_ANIMATION));
        assert_eq!(effects.last(), Some(&Effect::AnimateLoading));
    }

    #[test]
    fn leaving_processing_rearms_after_animation() {
        let effects = transition(&status(ScanState::Processing), &status(ScanState::Scanning), true);
        assert!(matches!(effects[0], Effect::ShowStatus { .. }));
        assert_eq!(&effects[1..], &[Effect::ArmDelivery, Effect::StartCapture]);
        assert_eq!(shown(&effects), (Some(MessageLayout::Collapsed), TRANSITION_ANIMATION));
    }

    #[test]
    fn unanimated_reset_is_instant() {
        let quiet = status(ScanState::Scanning).with_animated(false);
        let effects = transition(&status(ScanState::Processing), &quiet, true);
        assert_eq!(shown(&effects).1, Duration::ZERO);
    }

    #[test]
    fn reset_while_scanning_never_locks() {
        let effects = transition(&status(ScanState::Scanning), &status(ScanState::Scanning), true);
        assert!(!effects.contains(&Effect::LockDelivery));
        assert_eq!(&effects[..2], &[Effect::ArmDelivery, Effect::StartCapture]);
        assert_eq!(shown(&effects).1, Duration::ZERO);
    }

    #[test]
    fn entering_not_found_locks_and_keeps_layout() {
        let effects = transition(&status(ScanState::Processing), &status(ScanState::NotFound), true);
        assert_eq!(&effects[..2], &[Effect::LockDelivery, Effect::StopCapture]);
        assert_eq!(shown(&effects).0, None);
    }

    #[test]
    fn leaving_not_found_rearms() {
        let effects = transition(&status(ScanState::NotFound), &status(ScanState::Unauthorized), true);
        assert!(effects.contains(&Effect::ArmDelivery));
        assert!(effects.contains(&Effect::StopCapture));
        assert!(!effects.contains(&Effect::LockDelivery));
    }
}
