//! Operator confirmation with a bounded wait.

use crate::error::PurgeError;
use crate::store::{Confidence, MatchDescriptor, StoreItem};
use console::{style, Term};
use crossbeam_channel::{bounded, RecvTimeoutError};
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::thread;
use std::time::Duration;

/// What the operator is being asked to approve.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub identity: String,
    pub item: StoreItem,
    pub matches: Vec<MatchDescriptor>,
}

impl ConfirmRequest {
    /// Weakest evidence behind the request; substring-only matches are
    /// called out in the prompt.
    pub fn confidence(&self) -> Confidence {
        if self.matches.iter().any(|m| m.confidence == Confidence::Exact) {
            Confidence::Exact
        } else {
            Confidence::Substring
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "Delete {} {} ({}) for {}?",
            self.item.kind,
            self.item.label,
            self.item.path.display(),
            self.identity
        )
    }

    /// Multi-line detail listing every matched field.
    pub fn detail(&self) -> String {
        let mut out = String::new();
        for path in self.item.all_paths() {
            let _ = writeln!(out, "  path: {}", path.display());
        }
        for m in &self.matches {
            let _ = writeln!(out, "  match: {}", m.describe());
        }
        if self.confidence() == Confidence::Substring {
            let _ = writeln!(
                out,
                "  note: identity only appears as a substring; check this is really the account"
            );
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmReply {
    Yes,
    No,
    TimedOut,
}

/// Source of operator decisions. Implementations must return within
/// `timeout`, answering [`ConfirmReply::TimedOut`] when they cannot.
pub trait ConfirmationSource {
    fn confirm(&mut self, request: &ConfirmRequest, timeout: Duration) -> ConfirmReply;
}

/// Interactive prompt on the controlling terminal.
///
/// The prompt runs on a worker thread so the wait can be bounded. A worker
/// that timed out keeps reading stdin, so after the first timeout every
/// later request is denied without prompting.
pub struct TerminalConfirmer {
    term: Term,
    expired: bool,
}

impl TerminalConfirmer {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            expired: false,
        }
    }
}

impl Default for TerminalConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationSource for TerminalConfirmer {
    fn confirm(&mut self, request: &ConfirmRequest, timeout: Duration) -> ConfirmReply {
        if self.expired {
            log::warn!("Earlier prompt timed out; denying {}", request.item.path.display());
            return ConfirmReply::TimedOut;
        }

        let _ = self.term.write_line(&format!(
            "{} {}",
            style("?").yellow().bold(),
            style(format!("{} match(es) for {}", request.matches.len(), request.identity)).bold()
        ));
        let _ = self.term.write_str(&request.detail());
        let _ = self.term.write_line(&format!(
            "  {}",
            style(format!("(no answer within {}s means no)", timeout.as_secs())).dim()
        ));

        let (tx, rx) = bounded(1);
        let prompt = request.prompt();
        let term = self.term.clone();
        thread::spawn(move || {
            let answer = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .default(false)
                .interact_on_opt(&term);
            let _ = tx.send(answer);
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok(Some(true))) => ConfirmReply::Yes,
            Ok(Ok(_)) => ConfirmReply::No,
            Ok(Err(e)) => {
                log::warn!("Prompt failed, treating as no: {}", PurgeError::from(e));
                ConfirmReply::No
            }
            Err(RecvTimeoutError::Timeout) => {
                self.expired = true;
                let _ = self.term.write_line("");
                ConfirmReply::TimedOut
            }
            Err(RecvTimeoutError::Disconnected) => ConfirmReply::No,
        }
    }
}

/// Denies everything; used when no terminal is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl ConfirmationSource for DenyAll {
    fn confirm(&mut self, request: &ConfirmRequest, _timeout: Duration) -> ConfirmReply {
        log::info!("No terminal attached; not deleting {}", request.item.path.display());
        ConfirmReply::No
    }
}

/// Replays canned replies in order; once exhausted every request times out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConfirmer {
    replies: VecDeque<ConfirmReply>,
    pub asked: Vec<ConfirmRequest>,
}

impl ScriptedConfirmer {
    pub fn new(replies: &[ConfirmReply]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            asked: Vec::new(),
        }
    }

    pub fn always_yes(count: usize) -> Self {
        Self::new(&vec![ConfirmReply::Yes; count])
    }
}

impl ConfirmationSource for ScriptedConfirmer {
    fn confirm(&mut self, request: &ConfirmRequest, _timeout: Duration) -> ConfirmReply {
        self.asked.push(request.clone());
        self.replies.pop_front().unwrap_or(ConfirmReply::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MatchStrategy, StoreKind};
    use std::path::PathBuf;

    fn request(confidence: Confidence) -> ConfirmRequest {
        let item = StoreItem::new(StoreKind::SshKey, "/home/u/.ssh/id_ed25519.pub", "id_ed25519")
            .with_companion("/home/u/.ssh/id_ed25519");
        ConfirmRequest {
            identity: "old@example.com".to_string(),
            matches: vec![MatchDescriptor {
                kind: StoreKind::SshKey,
                item_path: item.path.clone(),
                source_path: PathBuf::from("/home/u/.ssh/id_ed25519.pub"),
                strategy: MatchStrategy::KeyComment,
                field: "key comment \"old@example.com\"".to_string(),
                confidence,
            }],
            item,
        }
    }

    #[test]
    fn test_prompt_text() {
        insta::assert_snapshot!(
            request(Confidence::Substring).prompt(),
            @"Delete ssh-key id_ed25519 (/home/u/.ssh/id_ed25519.pub) for old@example.com?"
        );
    }

    #[test]
    fn test_detail_flags_substring_confidence() {
        let detail = request(Confidence::Substring).detail();
        assert!(detail.contains("path: /home/u/.ssh/id_ed25519\n"));
        assert!(detail.contains("substring"));
        assert!(detail.contains("note:"));

        let detail = request(Confidence::Exact).detail();
        assert!(!detail.contains("note:"));
    }

    #[test]
    fn test_scripted_runs_out_into_timeout() {
        let mut confirmer = ScriptedConfirmer::new(&[ConfirmReply::Yes]);
        let req = request(Confidence::Exact);
        assert_eq!(confirmer.confirm(&req, Duration::from_secs(1)), ConfirmReply::Yes);
        assert_eq!(confirmer.confirm(&req, Duration::from_secs(1)), ConfirmReply::TimedOut);
        assert_eq!(confirmer.asked.len(), 2);
    }

    #[test]
    fn test_deny_all() {
        let req = request(Confidence::Exact);
        assert_eq!(DenyAll.confirm(&req, Duration::from_secs(1)), ConfirmReply::No);
    }
}
