//! Durable, line-oriented record of what was (or would be) removed.
//!
//! One file per run. Each line is written and flushed on its own so an
//! interrupted run still leaves a complete record of the work it did.

use crate::error::{PurgeError, Result};
use crate::report::Outcome;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

impl AuditLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditLevel::Info => "INFO",
            AuditLevel::Warn => "WARN",
            AuditLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct AuditLog {
    path: PathBuf,
    writer: LineWriter<File>,
}

impl AuditLog {
    /// Create `idpurge-<timestamp>.log` inside `dir`. Failure here is fatal
    /// for the run: nothing may be removed without a record.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            PurgeError::AuditLog(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let mut path = dir.join(format!("idpurge-{}.log", stamp));
        let mut n = 1;
        while path.exists() {
            path = dir.join(format!("idpurge-{}-{}.log", stamp, n));
            n += 1;
        }

        let file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .map_err(|e| PurgeError::AuditLog(format!("cannot open {}: {}", path.display(), e)))?;

        Ok(Self {
            path,
            writer: LineWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Free-form run event (start, end, cancellation, scanner trouble).
    pub fn event(&mut self, level: AuditLevel, message: &str) {
        let line = format!("{} [{}] {}", timestamp(Utc::now()), level, message);
        self.write_line(&line);
    }

    pub fn outcome(&mut self, outcome: &Outcome) {
        let line = format_outcome_line(Utc::now(), outcome);
        self.write_line(&line);
    }

    fn write_line(&mut self, line: &str) {
        // A write failure after the file was opened must not abort the run;
        // the report still carries every outcome.
        if let Err(e) = writeln!(self.writer, "{}", line) {
            log::error!("Audit log write to {} failed: {}", self.path.display(), e);
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn quoted(value: &str) -> String {
    format!(
        "\"{}\"",
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    )
}

pub fn format_outcome_line(at: DateTime<Utc>, outcome: &Outcome) -> String {
    format!(
        "{} [{}] identity={} store={} path={} outcome={} detail={}",
        timestamp(at),
        outcome.kind.audit_level(),
        outcome.identity,
        outcome.store,
        quoted(&outcome.path.to_string_lossy()),
        outcome.kind,
        quoted(&outcome.detail()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::store::{StoreItem, StoreKind};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn identity() -> Identity {
        Identity::parse("old@example.com").unwrap()
    }

    #[test]
    fn test_outcome_line_format() {
        let item = StoreItem::new(StoreKind::Mail, "/h/Library/Mail/V10/MailData/Accounts.plist", "Mail");
        let outcome = Outcome::failed(
            &identity(),
            &item,
            &[],
            "Mail is running",
            "Quit Mail and re-run.".to_string(),
        );
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();

        insta::assert_snapshot!(
            format_outcome_line(at, &outcome),
            @r#"2026-10-16T09:30:00Z [ERROR] identity=old@example.com store=mail path="/h/Library/Mail/V10/MailData/Accounts.plist" outcome=failed detail="error: Mail is running | remediation: Quit Mail and re-run.""#
        );
    }

    #[test]
    fn test_lines_are_flushed_immediately() {
        let dir = TempDir::new().unwrap();
        let mut log = AuditLog::create(dir.path().join("logs")).unwrap();
        let item = StoreItem::new(StoreKind::SshKey, "/h/.ssh/id.pub", "id");

        log.event(AuditLevel::Info, "run started");
        log.outcome(&Outcome::no_match(&identity(), &item));

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] run started"));
        assert!(lines[1].contains("outcome=skipped-no-match"));
        assert!(lines[1].contains("store=ssh-key"));
    }

    #[test]
    fn test_two_logs_in_same_second_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let a = AuditLog::create(dir.path()).unwrap();
        let b = AuditLog::create(dir.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_unwritable_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        assert!(matches!(
            AuditLog::create(blocker.join("logs")),
            Err(PurgeError::AuditLog(_))
        ));
    }
}
