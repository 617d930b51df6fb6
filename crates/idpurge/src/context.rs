//! Per-run state threaded through every engine call.

use crate::identity::Identity;
use crate::report::{AuditLevel, AuditLog, Outcome, OutcomeKind, Report};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// No filesystem mutation; every action is reported as what would happen.
    #[default]
    Preview,
    Execute,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Preview => "preview",
            RunMode::Execute => "execute",
        }
    }
}

/// Shared flag checked between store items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying flag, for registering signal handlers.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct RunContext {
    pub identities: Vec<Identity>,
    pub mode: RunMode,
    pub verbose: bool,
    pub cancel: CancelToken,
    audit: AuditLog,
    report: Report,
    totals: BTreeMap<OutcomeKind, usize>,
}

impl RunContext {
    pub fn new(identities: Vec<Identity>, mode: RunMode, audit: AuditLog) -> Self {
        let mut report = Report::new();
        report.audit_log = Some(audit.path().to_path_buf());
        Self {
            identities,
            mode,
            verbose: false,
            cancel: CancelToken::new(),
            audit,
            report,
            totals: BTreeMap::new(),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Append an outcome to the report and the audit log.
    pub fn record(&mut self, outcome: Outcome) {
        self.audit.outcome(&outcome);
        if self.verbose || outcome.kind != OutcomeKind::SkippedNoMatch {
            log::info!(
                "{} {} {}: {}",
                outcome.identity,
                outcome.store,
                outcome.path.display(),
                outcome.kind
            );
        }
        *self.totals.entry(outcome.kind).or_insert(0) += 1;
        self.report.push(outcome);
    }

    pub fn note(&mut self, level: AuditLevel, message: &str) {
        self.audit.event(level, message);
    }

    /// Running count of outcomes per kind.
    pub fn totals(&self) -> &BTreeMap<OutcomeKind, usize> {
        &self.totals
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn mark_cancelled(&mut self) {
        self.report.cancelled = true;
    }

    /// Close out the run and hand the report to the caller.
    pub fn finish(mut self) -> Report {
        let summary = self
            .totals
            .iter()
            .map(|(kind, n)| format!("{}={}", kind, n))
            .collect::<Vec<_>>()
            .join(" ");
        let level = if self.report.cancelled {
            AuditLevel::Warn
        } else {
            AuditLevel::Info
        };
        let status = if self.report.cancelled { "cancelled" } else { "finished" };
        self.audit
            .event(level, &format!("run {} mode={} {}", status, self.mode.as_str(), summary));
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreItem, StoreKind};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_record_updates_report_totals_and_log() {
        let dir = TempDir::new().unwrap();
        let audit = AuditLog::create(dir.path()).unwrap();
        let log_path = audit.path().to_path_buf();
        let identity = Identity::parse("old@example.com").unwrap();
        let mut ctx = RunContext::new(vec![identity.clone()], RunMode::Preview, audit);

        let item = StoreItem::new(StoreKind::SshKey, "/h/.ssh/a.pub", "a");
        ctx.record(Outcome::no_match(&identity, &item));
        ctx.record(Outcome::would_delete(&identity, &item, &[]));
        assert_eq!(ctx.totals()[&OutcomeKind::SkippedNoMatch], 1);

        let report = ctx.finish();
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.audit_log.as_deref(), Some(log_path.as_path()));

        let text = fs::read_to_string(&log_path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().last().unwrap().contains("run finished mode=preview"));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        assert!(token.flag().load(Ordering::Relaxed));
    }
}
