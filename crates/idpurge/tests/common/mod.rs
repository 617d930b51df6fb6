#![allow(dead_code)]

use idpurge_lib::{
    default_scanners, AuditLog, ConfirmReply, Identity, Outcome, PurgeEngine, Report, Resolver,
    RunContext, RunMode, SafetyGate, ScriptedConfirmer, Settings, StaticProbe,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod helpers;
pub use helpers::*;

pub const OLD: &str = "old@example.com";
pub const OTHER: &str = "someone@example.org";

/// A throwaway home directory plus a separate audit log directory, so
/// snapshots of the home never include the log.
pub struct FakeHome {
    pub home: TempDir,
    pub logs: TempDir,
}

impl FakeHome {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
            logs: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.home.path()
    }

    pub fn run(&self, identities: &[&str], options: RunOptions) -> Report {
        let identities: Vec<Identity> = identities
            .iter()
            .map(|value| Identity::parse(value).unwrap())
            .collect();

        let gate = SafetyGate::new(
            Box::new(StaticProbe::with_running(&options.running)),
            Box::new(ScriptedConfirmer::new(&options.replies)),
        )
        .with_assume_yes(options.assume_yes);

        let scanners = default_scanners(self.path(), &options.settings).unwrap();
        let mut engine = PurgeEngine::new(scanners, Resolver::new(gate));

        let audit = AuditLog::create(self.logs.path()).unwrap();
        let mut ctx = RunContext::new(identities, options.mode, audit);
        engine.run(&mut ctx);
        ctx.finish()
    }

    pub fn preview(&self, identities: &[&str]) -> Report {
        self.run(identities, RunOptions::preview())
    }
}

pub struct RunOptions {
    pub mode: RunMode,
    pub running: Vec<&'static str>,
    pub replies: Vec<ConfirmReply>,
    pub assume_yes: bool,
    pub settings: Settings,
}

impl RunOptions {
    pub fn preview() -> Self {
        Self {
            mode: RunMode::Preview,
            running: Vec::new(),
            replies: Vec::new(),
            assume_yes: false,
            settings: Settings::default(),
        }
    }

    pub fn execute() -> Self {
        Self {
            mode: RunMode::Execute,
            ..Self::preview()
        }
    }

    pub fn replies(mut self, replies: &[ConfirmReply]) -> Self {
        self.replies = replies.to_vec();
        self
    }

    pub fn running(mut self, apps: &[&'static str]) -> Self {
        self.running = apps.to_vec();
        self
    }

    pub fn assume_yes(mut self) -> Self {
        self.assume_yes = true;
        self
    }
}

pub fn audit_lines(report: &Report) -> Vec<String> {
    let path: PathBuf = report.audit_log.clone().unwrap();
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

/// The single outcome recorded for `path` and `identity`.
pub fn outcome_for<'a>(report: &'a Report, identity: &str, path: &Path) -> &'a Outcome {
    let found: Vec<&Outcome> = report
        .outcomes
        .iter()
        .filter(|o| o.identity.as_str() == identity && o.path == path)
        .collect();
    assert_eq!(found.len(), 1, "outcomes for {}: {:?}", path.display(), found);
    found[0]
}
