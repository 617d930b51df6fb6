//! The single gate every destructive or account-touching action passes through.
//!
//! ```text
//! Pending -> RunningAppCheck -> Blocked
//!                            -> Confirming -> Confirmed -> Executed
//!                                          -> Denied    -> Skipped
//! ```

pub mod confirm;
pub mod process;

pub use confirm::{
    ConfirmReply, ConfirmRequest, ConfirmationSource, DenyAll, ScriptedConfirmer,
    TerminalConfirmer,
};
pub use process::{AppProbe, StaticProbe, SystemProbe};

use crate::identity::Identity;
use crate::store::{MatchDescriptor, StoreItem};
use std::time::Duration;

pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Blocked { app: String },
    Confirming,
    Confirmed,
    Denied { timed_out: bool },
    Executed,
    Skipped,
}

impl GateState {
    fn can_move_to(&self, next: &GateState) -> bool {
        use GateState::*;
        matches!(
            (self, next),
            (Pending, Blocked { .. })
                | (Pending, Confirming)
                | (Pending, Confirmed)
                | (Confirming, Confirmed)
                | (Confirming, Denied { .. })
                | (Confirmed, Executed)
                | (Denied { .. }, Skipped)
        )
    }
}

/// Whether an action needs an operator answer before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPolicy {
    Always,
    /// Skipped when the run was started with assume-yes.
    UnlessAssumeYes,
    /// Non-destructive actions (remediation) only need the app check.
    Never,
}

/// Tracks one action through the gate.
#[derive(Debug)]
pub struct Authorization {
    history: Vec<GateState>,
}

impl Authorization {
    fn new() -> Self {
        Self {
            history: vec![GateState::Pending],
        }
    }

    fn advance(&mut self, next: GateState) {
        let current = self.state();
        debug_assert!(current.can_move_to(&next), "{:?} -> {:?}", current, next);
        log::debug!("gate: {:?} -> {:?}", current, next);
        self.history.push(next);
    }

    pub fn state(&self) -> &GateState {
        self.history.last().unwrap_or(&GateState::Pending)
    }

    pub fn history(&self) -> &[GateState] {
        &self.history
    }

    pub fn is_confirmed(&self) -> bool {
        *self.state() == GateState::Confirmed
    }

    /// Record that the guarded action ran.
    pub fn executed(&mut self) {
        if self.is_confirmed() {
            self.advance(GateState::Executed);
        }
    }

    /// Move a denial to its terminal state.
    pub fn skipped(&mut self) {
        if matches!(self.state(), GateState::Denied { .. }) {
            self.advance(GateState::Skipped);
        }
    }
}

pub struct SafetyGate {
    probe: Box<dyn AppProbe>,
    confirmer: Box<dyn ConfirmationSource>,
    timeout: Duration,
    assume_yes: bool,
}

impl SafetyGate {
    pub fn new(probe: Box<dyn AppProbe>, confirmer: Box<dyn ConfirmationSource>) -> Self {
        Self {
            probe,
            confirmer,
            timeout: DEFAULT_CONFIRM_TIMEOUT,
            assume_yes: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Walk the state machine for one item. The returned authorization is in
    /// `Blocked`, `Confirmed` or `Denied`.
    pub fn authorize(
        &mut self,
        identity: &Identity,
        item: &StoreItem,
        matches: &[MatchDescriptor],
        policy: PromptPolicy,
    ) -> Authorization {
        let mut auth = Authorization::new();

        if let Some(owner) = &item.owner {
            if self.probe.is_running(owner) {
                auth.advance(GateState::Blocked {
                    app: owner.name.clone(),
                });
                return auth;
            }
        }

        let prompt = match policy {
            PromptPolicy::Always => true,
            PromptPolicy::UnlessAssumeYes => !self.assume_yes,
            PromptPolicy::Never => false,
        };

        if !prompt {
            auth.advance(GateState::Confirmed);
            return auth;
        }

        auth.advance(GateState::Confirming);
        let request = ConfirmRequest {
            identity: identity.to_string(),
            item: item.clone(),
            matches: matches.to_vec(),
        };

        match self.confirmer.confirm(&request, self.timeout) {
            ConfirmReply::Yes => auth.advance(GateState::Confirmed),
            ConfirmReply::No => auth.advance(GateState::Denied { timed_out: false }),
            ConfirmReply::TimedOut => auth.advance(GateState::Denied { timed_out: true }),
        }
        auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{OwningApp, StoreKind};

    fn identity() -> Identity {
        Identity::parse("old@example.com").unwrap()
    }

    fn mail_item() -> StoreItem {
        StoreItem::new(StoreKind::Mail, "/h/Library/Mail/V10/MailData/Accounts.plist", "Mail")
            .with_owner(OwningApp::new("Mail", &["Mail"]))
    }

    fn key_item() -> StoreItem {
        StoreItem::new(StoreKind::SshKey, "/h/.ssh/id.pub", "id")
    }

    #[test]
    fn test_running_app_blocks_without_prompt() {
        let confirmer = ScriptedConfirmer::always_yes(1);
        let mut gate = SafetyGate::new(
            Box::new(StaticProbe::with_running(&["Mail"])),
            Box::new(confirmer),
        );

        let auth = gate.authorize(&identity(), &mail_item(), &[], PromptPolicy::Always);
        assert_eq!(
            auth.state(),
            &GateState::Blocked {
                app: "Mail".to_string()
            }
        );
        assert_eq!(auth.history().len(), 2);
    }

    #[test]
    fn test_timeout_is_denial() {
        let mut gate = SafetyGate::new(
            Box::new(StaticProbe::none_running()),
            Box::new(ScriptedConfirmer::new(&[ConfirmReply::TimedOut])),
        );

        let mut auth = gate.authorize(&identity(), &key_item(), &[], PromptPolicy::Always);
        assert_eq!(auth.state(), &GateState::Denied { timed_out: true });
        auth.executed();
        assert_eq!(auth.state(), &GateState::Denied { timed_out: true });
        auth.skipped();
        assert_eq!(auth.state(), &GateState::Skipped);
    }

    #[test]
    fn test_assume_yes_only_applies_to_relaxed_policy() {
        let mut gate = SafetyGate::new(
            Box::new(StaticProbe::none_running()),
            Box::new(ScriptedConfirmer::new(&[ConfirmReply::No])),
        )
        .with_assume_yes(true);

        let auth = gate.authorize(&identity(), &key_item(), &[], PromptPolicy::UnlessAssumeYes);
        assert!(auth.is_confirmed());

        let auth = gate.authorize(&identity(), &key_item(), &[], PromptPolicy::Always);
        assert_eq!(auth.state(), &GateState::Denied { timed_out: false });
    }

    #[test]
    fn test_full_happy_path_history() {
        let mut gate = SafetyGate::new(
            Box::new(StaticProbe::none_running()),
            Box::new(ScriptedConfirmer::always_yes(1)),
        );

        let mut auth = gate.authorize(&identity(), &key_item(), &[], PromptPolicy::Always);
        auth.executed();
        assert_eq!(
            auth.history(),
            &[
                GateState::Pending,
                GateState::Confirming,
                GateState::Confirmed,
                GateState::Executed
            ]
        );
    }
}
