//! Operator-facing instructions, written to be pasted or followed verbatim.

use crate::identity::Identity;
use crate::store::{StoreItem, StoreKind};
use crate::util::shell_quote;
use std::path::Path;

/// How to remove the account from an application that manages its own store.
pub fn manual_removal(item: &StoreItem, identity: &Identity) -> String {
    match item.kind {
        StoreKind::Mail => format!(
            "Open Mail > Settings > Accounts, select the account for {} and click the minus (-) button to remove it.",
            identity
        ),
        StoreKind::InternetAccounts => format!(
            "Open System Settings > Internet Accounts, select {} and choose Delete Account.",
            identity
        ),
        StoreKind::CloudStorage => format!(
            "Open {} > Settings > Account and sign out (unlink) {}; then remove the local sync folder if you no longer need it.",
            item.label, identity
        ),
        StoreKind::AppSupport => format!(
            "Review {} ({}): remove {} from inside the application's account settings, or uninstall it and delete the directory.",
            item.label,
            item.path.display(),
            identity
        ),
        StoreKind::Browser(family) => format!(
            "Open {} > Settings > You and Google / Profiles, sign out of {} and remove the profile at {}.",
            family.display_name(),
            identity,
            item.path.display()
        ),
        StoreKind::SshKey => format!(
            "Remove the key pair manually: rm -f {}",
            quoted_paths(&item.all_paths())
        ),
    }
}

pub fn quit_and_rerun(app: &str, identity: &Identity) -> String {
    format!("Quit {} and re-run idpurge for {}.", app, identity)
}

/// Literal command that completes a deletion the engine could not.
pub fn manual_delete(item: &StoreItem) -> String {
    match item.kind {
        StoreKind::SshKey => format!("rm -f {}", quoted_paths(&item.all_paths())),
        _ => format!("rm -rf {}", shell_quote(&item.path)),
    }
}

pub fn rescan(item: &StoreItem, identity: &Identity) -> String {
    format!(
        "{} changed after it was scanned; inspect it and re-run idpurge for {}.",
        item.path.display(),
        identity
    )
}

pub fn leftover_staging(staging: &Path) -> String {
    format!(
        "The item was detached but cleanup stopped part way; finish it with: rm -rf {}",
        shell_quote(staging)
    )
}

pub fn unreadable_root(root: &Path) -> String {
    format!(
        "Check read permissions on {} (ls -la {}) and re-run.",
        root.display(),
        shell_quote(root)
    )
}

fn quoted_paths(paths: &[&Path]) -> String {
    paths
        .iter()
        .map(|p| shell_quote(p))
        .collect::<Vec<_>>()
        .join(" ")
}
