//! Per-item outcomes and the run report.
//!
//! Outcome constructors are the only way to build a `failed` or flagged
//! outcome, and they refuse to produce one without remediation text.

pub mod audit;

pub use audit::{AuditLevel, AuditLog};

use crate::error::Result;
use crate::identity::Identity;
use crate::store::{MatchDescriptor, StoreItem, StoreKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Deleted,
    WouldDelete,
    SkippedNoMatch,
    SkippedByUser,
    #[serde(rename = "flagged-for-manual-action")]
    Flagged,
    WouldFlag,
    Failed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Deleted => "deleted",
            OutcomeKind::WouldDelete => "would-delete",
            OutcomeKind::SkippedNoMatch => "skipped-no-match",
            OutcomeKind::SkippedByUser => "skipped-by-user",
            OutcomeKind::Flagged => "flagged-for-manual-action",
            OutcomeKind::WouldFlag => "would-flag",
            OutcomeKind::Failed => "failed",
        }
    }

    pub fn audit_level(&self) -> AuditLevel {
        match self {
            OutcomeKind::Deleted | OutcomeKind::WouldDelete | OutcomeKind::SkippedNoMatch => {
                AuditLevel::Info
            }
            OutcomeKind::SkippedByUser | OutcomeKind::Flagged | OutcomeKind::WouldFlag => {
                AuditLevel::Warn
            }
            OutcomeKind::Failed => AuditLevel::Error,
        }
    }

    /// Kinds that must carry operator instructions.
    pub fn needs_remediation(&self) -> bool {
        matches!(
            self,
            OutcomeKind::Failed | OutcomeKind::Flagged | OutcomeKind::WouldFlag
        )
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one store item for one identity.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub identity: Identity,
    pub store: StoreKind,
    pub path: PathBuf,
    pub label: String,
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl Outcome {
    fn base(identity: &Identity, item: &StoreItem, kind: OutcomeKind, matches: &[MatchDescriptor]) -> Self {
        Self {
            identity: identity.clone(),
            store: item.kind,
            path: item.path.clone(),
            label: item.label.clone(),
            kind,
            matched_fields: matches.iter().map(|m| m.describe()).collect(),
            error: None,
            remediation: None,
        }
    }

    pub fn no_match(identity: &Identity, item: &StoreItem) -> Self {
        Self::base(identity, item, OutcomeKind::SkippedNoMatch, &[])
    }

    pub fn deleted(identity: &Identity, item: &StoreItem, matches: &[MatchDescriptor]) -> Self {
        Self::base(identity, item, OutcomeKind::Deleted, matches)
    }

    pub fn would_delete(identity: &Identity, item: &StoreItem, matches: &[MatchDescriptor]) -> Self {
        Self::base(identity, item, OutcomeKind::WouldDelete, matches)
    }

    pub fn skipped_by_user(
        identity: &Identity,
        item: &StoreItem,
        matches: &[MatchDescriptor],
        timed_out: bool,
    ) -> Self {
        let mut outcome = Self::base(identity, item, OutcomeKind::SkippedByUser, matches);
        if timed_out {
            outcome.error = Some("confirmation timed out".to_string());
        }
        outcome
    }

    pub fn flagged(
        identity: &Identity,
        item: &StoreItem,
        matches: &[MatchDescriptor],
        remediation: String,
    ) -> Self {
        Self::base(identity, item, OutcomeKind::Flagged, matches).with_remediation(remediation)
    }

    pub fn would_flag(
        identity: &Identity,
        item: &StoreItem,
        matches: &[MatchDescriptor],
        remediation: String,
    ) -> Self {
        Self::base(identity, item, OutcomeKind::WouldFlag, matches).with_remediation(remediation)
    }

    pub fn failed(
        identity: &Identity,
        item: &StoreItem,
        matches: &[MatchDescriptor],
        error: impl ToString,
        remediation: String,
    ) -> Self {
        let mut outcome = Self::base(identity, item, OutcomeKind::Failed, matches);
        outcome.error = Some(error.to_string());
        outcome.with_remediation(remediation)
    }

    fn with_remediation(mut self, remediation: String) -> Self {
        let remediation = if remediation.trim().is_empty() {
            format!("Inspect {} manually.", self.path.display())
        } else {
            remediation
        };
        self.remediation = Some(remediation);
        self
    }

    /// Text for the audit line's `detail` field.
    pub fn detail(&self) -> String {
        let mut parts = Vec::new();
        if !self.matched_fields.is_empty() {
            parts.push(format!("matched: {}", self.matched_fields.join("; ")));
        }
        if let Some(error) = &self.error {
            parts.push(format!("error: {}", error));
        }
        if let Some(remediation) = &self.remediation {
            parts.push(format!("remediation: {}", remediation));
        }
        parts.join(" | ")
    }
}

/// Aggregate of every outcome in a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub outcomes: Vec<Outcome>,
    pub audit_log: Option<PathBuf>,
    pub cancelled: bool,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: Outcome) {
        debug_assert!(
            !outcome.kind.needs_remediation() || outcome.remediation.is_some(),
            "{} outcome without remediation",
            outcome.kind
        );
        self.outcomes.push(outcome);
    }

    pub fn counts(&self) -> BTreeMap<OutcomeKind, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.kind).or_insert(0) += 1;
        }
        counts
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(OutcomeKind::Failed) > 0
    }

    /// Every remediation instruction, in run order.
    pub fn remediations(&self) -> Vec<&Outcome> {
        self.outcomes
            .iter()
            .filter(|o| o.remediation.is_some())
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Outcomes worth showing: everything except items without a match.
    pub fn actionable(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes
            .iter()
            .filter(|o| o.kind != OutcomeKind::SkippedNoMatch)
    }
}
