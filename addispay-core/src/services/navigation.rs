//! Navigation state machine
//!
//! Every change to the current view, the back stack, the verification gate,
//! the KYC step and the capture marker goes through [`transition`]. It is a
//! pure function: it returns the next state plus the side effects the
//! caller must run (alerts, haptics, scrolling, releasing the camera).

use serde::Serialize;

use crate::domain::{CaptureTarget, KycStep, VerificationStatus, View};
use crate::ports::Haptic;

/// Warning shown when an unverified user opens a restricted view
pub const VERIFICATION_REQUIRED: &str = "Identity Verification Required to access this feature.";

/// Navigation-relevant slice of the client state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationState {
    current: View,
    /// Predecessors of `current`, oldest first
    stack: Vec<View>,
    verification: VerificationStatus,
    kyc_step: KycStep,
    capture: Option<CaptureTarget>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new(View::Splash)
    }
}

impl NavigationState {
    pub fn new(initial: View) -> Self {
        Self {
            current: initial,
            stack: Vec::new(),
            verification: VerificationStatus::None,
            kyc_step: KycStep::Details,
            capture: None,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn stack(&self) -> &[View] {
        &self.stack
    }

    pub fn verification(&self) -> VerificationStatus {
        self.verification
    }

    pub fn kyc_step(&self) -> KycStep {
        self.kyc_step
    }

    pub fn capture(&self) -> Option<CaptureTarget> {
        self.capture
    }

    /// Whether `view` may be entered directly right now
    pub fn can_enter(&self, view: View) -> bool {
        !view.is_restricted() || self.verification.is_approved()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    /// Forward navigation (subject to the verification gate)
    Navigate(View),
    /// Back button
    Back,
    /// Replace the current view and drop history (session boundaries,
    /// completed flows, admin tab switches)
    ResetTo(View),
    SetVerification(VerificationStatus),
    SetKycStep(KycStep),
    CaptureOpened(CaptureTarget),
    CaptureClosed,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Stop the open camera stream. Always listed first.
    ReleaseCapture,
    Alert(String),
    Haptic(Haptic),
    ScrollToTop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: NavigationState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: NavigationState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }
}

/// Compute the state after `event`
pub fn transition(mut state: NavigationState, event: NavEvent) -> Transition {
    let mut effects = Vec::new();

    match event {
        NavEvent::Navigate(target) => {
            if state.capture.take().is_some() {
                effects.push(Effect::ReleaseCapture);
            }
            if !state.can_enter(target) {
                state.kyc_step = KycStep::Details;
                state.current = View::KycForm;
                effects.push(Effect::Haptic(Haptic::Warning));
                effects.push(Effect::Alert(VERIFICATION_REQUIRED.to_string()));
            } else {
                state.stack.push(state.current);
                state.current = target;
                effects.push(Effect::ScrollToTop);
            }
        }
        NavEvent::Back => {
            if state.capture.take().is_some() {
                effects.push(Effect::ReleaseCapture);
            } else {
                state.current = state.stack.pop().unwrap_or(View::DEFAULT);
            }
        }
        NavEvent::ResetTo(view) => {
            if state.capture.take().is_some() {
                effects.push(Effect::ReleaseCapture);
            }
            state.stack.clear();
            state.current = view;
            effects.push(Effect::ScrollToTop);
        }
        NavEvent::SetVerification(status) => {
            state.verification = status;
        }
        NavEvent::SetKycStep(step) => {
            state.kyc_step = step;
        }
        NavEvent::CaptureOpened(target) => {
            if state.capture.is_some() {
                effects.push(Effect::ReleaseCapture);
            }
            state.capture = Some(target);
        }
        NavEvent::CaptureClosed => {
            if state.capture.take().is_none() {
                return Transition::unchanged(state);
            }
            effects.push(Effect::ReleaseCapture);
        }
    }

    Transition { state, effects }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(state: NavigationState, events: impl IntoIterator<Item = NavEvent>) -> (NavigationState, Vec<Effect>) {
        let mut state = state;
        let mut all = Vec::new();
        for event in events {
            let t = transition(state, event);
            state = t.state;
            all.extend(t.effects);
        }
        (state, all)
    }

    fn verified(at: View) -> NavigationState {
        let mut state = NavigationState::new(at);
        state.verification = VerificationStatus::Approved;
        state
    }

    #[test]
    fn test_navigate_pushes_and_back_pops() {
        let start = NavigationState::new(View::Dashboard);
        let targets = [View::Settings, View::KycForm, View::KycSubmitted, View::Login];

        let (state, _) = run(start.clone(), targets.iter().map(|v| NavEvent::Navigate(*v)));
        assert_eq!(state.stack().len(), targets.len());
        assert_eq!(state.current(), View::Login);

        let (state, _) = run(state, targets.iter().map(|_| NavEvent::Back));
        assert_eq!(state.current(), View::Dashboard);
        assert!(state.stack().is_empty());
    }

    #[test]
    fn test_restricted_targets_allowed_when_approved() {
        let (state, _) = run(
            verified(View::Dashboard),
            [
                NavEvent::Navigate(View::CardDetails),
                NavEvent::Navigate(View::FundCard),
                NavEvent::Navigate(View::Transactions),
            ],
        );
        assert_eq!(state.current(), View::Transactions);
        assert_eq!(state.stack(), &[View::Dashboard, View::CardDetails, View::FundCard]);
    }

    #[test]
    fn test_unverified_restricted_navigation_redirects() {
        for status in [
            VerificationStatus::None,
            VerificationStatus::Pending,
            VerificationStatus::Rejected,
        ] {
            for target in crate::domain::RESTRICTED_VIEWS {
                let mut start = NavigationState::new(View::Settings);
                start.stack = vec![View::Dashboard];
                start.verification = status;
                start.kyc_step = KycStep::IdBack;

                let t = transition(start.clone(), NavEvent::Navigate(target));
                assert_eq!(t.state.current(), View::KycForm);
                assert_eq!(t.state.stack(), start.stack());
                assert_eq!(t.state.kyc_step(), KycStep::Details);
                assert!(t.effects.contains(&Effect::Haptic(Haptic::Warning)));
            }
        }
    }

    #[test]
    fn test_fund_card_without_kyc_warns_once() {
        let start = NavigationState::new(View::Dashboard);
        let t = transition(start, NavEvent::Navigate(View::FundCard));
        assert_eq!(t.state.current(), View::KycForm);
        assert!(t.state.stack().is_empty());

        let alerts: Vec<_> = t
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Alert(_)))
            .collect();
        assert_eq!(alerts, vec![&Effect::Alert(VERIFICATION_REQUIRED.to_string())]);
        assert!(!t.effects.contains(&Effect::ScrollToTop));
    }

    #[test]
    fn test_back_on_empty_stack_lands_on_dashboard() {
        let (state, effects) = run(
            NavigationState::new(View::Settings),
            [NavEvent::Back, NavEvent::Back, NavEvent::Back],
        );
        assert_eq!(state.current(), View::Dashboard);
        assert!(state.stack().is_empty());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_pay_then_history_then_back_twice() {
        let (state, _) = run(
            verified(View::Dashboard),
            [
                NavEvent::Navigate(View::Pay),
                NavEvent::Navigate(View::Transactions),
                NavEvent::Back,
                NavEvent::Back,
            ],
        );
        assert_eq!(state.current(), View::Dashboard);
        assert!(state.stack().is_empty());
    }

    #[test]
    fn test_back_with_capture_only_closes_capture() {
        let mut start = NavigationState::new(View::KycForm);
        start.stack = vec![View::Dashboard, View::Settings];
        let (state, effects) = run(
            start.clone(),
            [NavEvent::CaptureOpened(CaptureTarget::IdFront), NavEvent::Back],
        );
        assert_eq!(effects, vec![Effect::ReleaseCapture]);
        assert_eq!(state.current(), View::KycForm);
        assert_eq!(state.stack(), start.stack());
        assert_eq!(state.capture(), None);
    }

    #[test]
    fn test_navigation_releases_open_capture_first() {
        let (state, effects) = run(
            verified(View::Pay),
            [
                NavEvent::CaptureOpened(CaptureTarget::QrScan),
                NavEvent::Navigate(View::Transactions),
            ],
        );
        assert_eq!(effects.first(), Some(&Effect::ReleaseCapture));
        assert_eq!(state.current(), View::Transactions);
        assert_eq!(state.capture(), None);
    }

    #[test]
    fn test_reset_clears_history() {
        let (state, _) = run(
            verified(View::Dashboard),
            [NavEvent::Navigate(View::FundCard), NavEvent::ResetTo(View::Dashboard)],
        );
        assert_eq!(state.current(), View::Dashboard);
        assert!(state.stack().is_empty());
    }

    #[test]
    fn test_set_verification_does_not_navigate() {
        let t = transition(
            NavigationState::new(View::KycSubmitted),
            NavEvent::SetVerification(VerificationStatus::Approved),
        );
        assert_eq!(t.state.current(), View::KycSubmitted);
        assert!(t.effects.is_empty());
        assert!(t.state.can_enter(View::Pay));
    }

    #[test]
    fn test_closing_without_capture_is_a_no_op() {
        let start = NavigationState::new(View::KycForm);
        let t = transition(start.clone(), NavEvent::CaptureClosed);
        assert_eq!(t.state, start);
        assert!(t.effects.is_empty());
    }
}
