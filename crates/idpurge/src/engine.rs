//! Drives scan, evaluation and resolution for every requested identity.

use crate::context::RunContext;
use crate::error::{PurgeError, Result};
use crate::identity::Identity;
use crate::matcher::Evaluator;
use crate::report::{AuditLevel, Outcome};
use crate::resolve::{remediation, Resolver};
use crate::scan::StoreScanner;
use crate::store::StoreItem;

pub struct PurgeEngine {
    scanners: Vec<Box<dyn StoreScanner>>,
    evaluator: Evaluator,
    resolver: Resolver,
}

impl PurgeEngine {
    pub fn new(scanners: Vec<Box<dyn StoreScanner>>, resolver: Resolver) -> Self {
        Self {
            scanners,
            evaluator: Evaluator::new(),
            resolver,
        }
    }

    /// Process every identity in `ctx`. Cancellation stops between items and
    /// is recorded on the report rather than returned.
    pub fn run(&mut self, ctx: &mut RunContext) {
        let identities = ctx.identities.clone();
        let names: Vec<&str> = identities.iter().map(Identity::as_str).collect();
        ctx.note(
            AuditLevel::Info,
            &format!(
                "run started mode={} identities={} stores={}",
                ctx.mode.as_str(),
                names.join(","),
                self.scanners
                    .iter()
                    .map(|s| s.kind().as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        );

        for identity in &identities {
            match self.process_identity(identity, ctx) {
                Ok(()) => {}
                Err(PurgeError::Cancelled) => {
                    log::warn!("Cancelled while processing {}", identity);
                    ctx.note(AuditLevel::Warn, &format!("cancelled during identity={}", identity));
                    ctx.mark_cancelled();
                    return;
                }
                Err(e) => {
                    log::error!("Stopped processing {}: {}", identity, e);
                    ctx.note(AuditLevel::Error, &format!("identity={} stopped: {}", identity, e));
                }
            }
        }
    }

    /// Scan every store for one identity and record one outcome per item.
    pub fn process_identity(&mut self, identity: &Identity, ctx: &mut RunContext) -> Result<()> {
        log::info!("Scanning for {}", identity);

        for scanner in &self.scanners {
            if ctx.cancel.is_cancelled() {
                return Err(PurgeError::Cancelled);
            }

            let kind = scanner.kind();
            for root in scanner.roots() {
                let items = match scanner.enumerate_root(&root) {
                    Ok(items) => items,
                    Err(e) => {
                        log::error!("Cannot enumerate {} under {}: {}", kind, root.display(), e);
                        let placeholder = StoreItem::new(kind, &root, kind.as_str());
                        ctx.record(Outcome::failed(
                            identity,
                            &placeholder,
                            &[],
                            e,
                            remediation::unreadable_root(&root),
                        ));
                        continue;
                    }
                };
                log::debug!("{} under {}: {} candidate item(s)", kind, root.display(), items.len());

                for item in &items {
                    if ctx.cancel.is_cancelled() {
                        return Err(PurgeError::Cancelled);
                    }

                    let sources = scanner.sources(item);
                    let matches = self.evaluator.evaluate(item, identity, &sources);
                    for diagnostic in self.evaluator.take_diagnostics() {
                        ctx.note(
                            AuditLevel::Warn,
                            &format!("identity={} store={} unreadable {}", identity, kind, diagnostic),
                        );
                    }

                    let outcome = self.resolver.resolve(identity, item, &matches, ctx.mode);
                    ctx.record(outcome);
                }
            }
        }

        Ok(())
    }
}
