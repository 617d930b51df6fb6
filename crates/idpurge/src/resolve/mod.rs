//! Deleters and remediators: turn confirmed matches into one outcome.

pub mod delete;
pub mod remediation;

pub use delete::{remove_staged, Removal};

use crate::context::RunMode;
use crate::error::{PurgeError, Result};
use crate::identity::Identity;
use crate::report::Outcome;
use crate::safety::{GateState, PromptPolicy, SafetyGate};
use crate::store::{Disposition, MatchDescriptor, StoreItem};
use crate::util::verify_unchanged;
use std::path::Path;

pub struct Resolver {
    gate: SafetyGate,
}

impl Resolver {
    pub fn new(gate: SafetyGate) -> Self {
        Self { gate }
    }

    /// Decide and, in execute mode, act on one item.
    ///
    /// Only matches that point at `item` count; with none left the item is
    /// reported as not matching and nothing is touched.
    pub fn resolve(
        &mut self,
        identity: &Identity,
        item: &StoreItem,
        matches: &[MatchDescriptor],
        mode: RunMode,
    ) -> Outcome {
        let matches: Vec<MatchDescriptor> = matches
            .iter()
            .filter(|m| m.item_path == item.path && m.kind == item.kind)
            .cloned()
            .collect();

        if matches.is_empty() {
            return Outcome::no_match(identity, item);
        }

        let disposition = item.kind.disposition();

        if mode == RunMode::Preview {
            return match disposition {
                Disposition::Remediate => Outcome::would_flag(
                    identity,
                    item,
                    &matches,
                    remediation::manual_removal(item, identity),
                ),
                _ => Outcome::would_delete(identity, item, &matches),
            };
        }

        let policy = match disposition {
            Disposition::Remediate => PromptPolicy::Never,
            Disposition::DeleteDirectory => PromptPolicy::UnlessAssumeYes,
            Disposition::DeleteKeyPair => PromptPolicy::Always,
        };

        let mut auth = self.gate.authorize(identity, item, &matches, policy);

        match auth.state().clone() {
            GateState::Blocked { app } => {
                let error = PurgeError::PreconditionBlocked { app: app.clone() };
                Outcome::failed(
                    identity,
                    item,
                    &matches,
                    error,
                    remediation::quit_and_rerun(&app, identity),
                )
            }
            GateState::Denied { timed_out } => {
                auth.skipped();
                Outcome::skipped_by_user(identity, item, &matches, timed_out)
            }
            GateState::Confirmed => {
                let outcome = match disposition {
                    Disposition::Remediate => Outcome::flagged(
                        identity,
                        item,
                        &matches,
                        remediation::manual_removal(item, identity),
                    ),
                    _ => self.delete(identity, item, &matches),
                };
                auth.executed();
                outcome
            }
            other => {
                log::error!("Gate ended in unexpected state {:?}", other);
                Outcome::skipped_by_user(identity, item, &matches, false)
            }
        }
    }

    fn delete(&mut self, identity: &Identity, item: &StoreItem, matches: &[MatchDescriptor]) -> Outcome {
        match self.try_delete(item, matches) {
            Ok(Removal::Done) => {
                log::info!("Deleted {} {}", item.kind, item.path.display());
                Outcome::deleted(identity, item, matches)
            }
            Ok(Removal::Detached { leftover, error }) => Outcome::failed(
                identity,
                item,
                matches,
                format!("cleanup incomplete: {}", error),
                remediation::leftover_staging(&leftover),
            ),
            Err(e @ PurgeError::ChangedSinceScan { .. }) => Outcome::failed(
                identity,
                item,
                matches,
                e,
                remediation::rescan(item, identity),
            ),
            Err(e) => {
                log::error!("Failed to delete {}: {}", item.path.display(), e);
                Outcome::failed(identity, item, matches, e, remediation::manual_delete(item))
            }
        }
    }

    fn try_delete(&mut self, item: &StoreItem, matches: &[MatchDescriptor]) -> Result<Removal> {
        if !matches.iter().any(|m| m.item_path == item.path) {
            return Err(PurgeError::NoMatch(item.path.clone()));
        }

        if let Some(expected) = &item.fingerprint {
            verify_unchanged(&item.path, expected)?;
        }

        let targets: Vec<&Path> = item
            .all_paths()
            .into_iter()
            .filter(|p| p.symlink_metadata().is_ok())
            .collect();

        if targets.first() != Some(&item.path.as_path()) {
            return Err(PurgeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} no longer exists", item.path.display()),
            )));
        }

        remove_staged(&targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::OutcomeKind;
    use crate::safety::{ConfirmReply, ScriptedConfirmer, StaticProbe};
    use crate::store::{BrowserFamily, Confidence, MatchStrategy, OwningApp, StoreKind};
    use crate::util::compute_blake3_hash;
    use std::fs;
    use tempfile::TempDir;

    fn identity() -> Identity {
        Identity::parse("old@example.com").unwrap()
    }

    fn descriptor(item: &StoreItem) -> MatchDescriptor {
        MatchDescriptor {
            kind: item.kind,
            item_path: item.path.clone(),
            source_path: item.path.clone(),
            strategy: MatchStrategy::StructuredField,
            field: "sync account".to_string(),
            confidence: Confidence::Exact,
        }
    }

    fn resolver(replies: &[ConfirmReply], running: &[&str]) -> Resolver {
        Resolver::new(SafetyGate::new(
            Box::new(StaticProbe::with_running(running)),
            Box::new(ScriptedConfirmer::new(replies)),
        ))
    }

    fn key_pair(dir: &TempDir) -> StoreItem {
        let public = dir.path().join("id_ed25519.pub");
        let private = dir.path().join("id_ed25519");
        fs::write(&public, "ssh-ed25519 AAAA old@example.com").unwrap();
        fs::write(&private, "PRIVATE").unwrap();
        let hash = compute_blake3_hash(&public).unwrap();
        StoreItem::new(StoreKind::SshKey, &public, "id_ed25519")
            .with_companion(&private)
            .with_fingerprint(hash)
    }

    #[test]
    fn test_no_matches_never_deletes() {
        let dir = TempDir::new().unwrap();
        let item = key_pair(&dir);
        let mut resolver = resolver(&[ConfirmReply::Yes], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::SkippedNoMatch);
        assert!(item.path.exists());
    }

    #[test]
    fn test_match_for_other_item_is_ignored() {
        let dir = TempDir::new().unwrap();
        let item = key_pair(&dir);
        let other = StoreItem::new(StoreKind::SshKey, dir.path().join("other.pub"), "other");
        let mut resolver = resolver(&[ConfirmReply::Yes], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&other)], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::SkippedNoMatch);
        assert!(item.path.exists());
    }

    #[test]
    fn test_preview_never_mutates() {
        let dir = TempDir::new().unwrap();
        let item = key_pair(&dir);
        let mut resolver = resolver(&[ConfirmReply::Yes], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&item)], RunMode::Preview);
        assert_eq!(outcome.kind, OutcomeKind::WouldDelete);
        assert!(item.path.exists());
        assert!(item.companions[0].exists());
    }

    #[test]
    fn test_key_pair_deleted_after_confirmation() {
        let dir = TempDir::new().unwrap();
        let item = key_pair(&dir);
        let mut resolver = resolver(&[ConfirmReply::Yes], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&item)], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::Deleted);
        assert!(!item.path.exists());
        assert!(!item.companions[0].exists());
    }

    #[test]
    fn test_key_changed_since_scan_fails_with_rescan() {
        let dir = TempDir::new().unwrap();
        let item = key_pair(&dir);
        fs::write(&item.path, "ssh-ed25519 BBBB someone@else.org").unwrap();
        let mut resolver = resolver(&[ConfirmReply::Yes], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&item)], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.remediation.unwrap().contains("changed after it was scanned"));
        assert!(item.path.exists());
    }

    #[test]
    fn test_remediation_kind_flags_without_prompt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Accounts.plist");
        fs::write(&path, "{}").unwrap();
        let item = StoreItem::new(StoreKind::Mail, &path, "Mail")
            .with_owner(OwningApp::new("Mail", &["Mail"]));
        let mut resolver = resolver(&[], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&item)], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::Flagged);
        assert!(outcome.remediation.unwrap().contains("Mail > Settings > Accounts"));
        assert!(path.exists());
    }

    #[test]
    fn test_running_browser_blocks_profile_delete() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("Default");
        fs::create_dir(&profile).unwrap();
        let family = BrowserFamily::Chrome;
        let item = StoreItem::new(StoreKind::Browser(family), &profile, "Default")
            .with_owner(family.owning_app());
        let mut resolver = resolver(&[ConfirmReply::Yes], &["Google Chrome"]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&item)], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert_eq!(
            outcome.remediation.as_deref(),
            Some("Quit Google Chrome and re-run idpurge for old@example.com.")
        );
        assert!(profile.exists());
    }

    #[test]
    fn test_vanished_item_fails_with_manual_command() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("Profile 2");
        let item = StoreItem::new(StoreKind::Browser(BrowserFamily::Edge), &profile, "Profile 2");
        let mut resolver = resolver(&[ConfirmReply::Yes], &[]);

        let outcome = resolver.resolve(&identity(), &item, &[descriptor(&item)], RunMode::Execute);
        assert_eq!(outcome.kind, OutcomeKind::Failed);
        assert!(outcome.remediation.unwrap().starts_with("rm -rf "));
    }
}
