//! Store scanners: enumerate candidate items per store kind and describe
//! where the evidence for a match lives inside each item.

pub mod accounts;
pub mod app_support;
pub mod browser;
pub mod ssh;

pub use accounts::{CloudStorageScanner, InternetAccountsScanner, MailScanner};
pub use app_support::AppSupportScanner;
pub use browser::BrowserScanner;
pub use ssh::SshKeyScanner;

use crate::config::Settings;
use crate::error::Result;
use crate::matcher::MatchSource;
use crate::store::{BrowserFamily, StoreItem, StoreKind};
use std::fs;
use std::path::{Path, PathBuf};

pub trait StoreScanner {
    fn kind(&self) -> StoreKind;

    /// Directories whose listings drive enumeration, each enumerated on its
    /// own so one unreadable root does not hide the others.
    fn roots(&self) -> Vec<PathBuf>;

    /// Candidate items under one of `roots()` in a stable order. A missing
    /// root yields no items; an unreadable one is an error.
    fn enumerate_root(&self, root: &Path) -> Result<Vec<StoreItem>>;

    /// Items under every root, failing on the first unreadable one.
    fn enumerate(&self) -> Result<Vec<StoreItem>> {
        let mut items = Vec::new();
        for root in self.roots() {
            items.extend(self.enumerate_root(&root)?);
        }
        Ok(items)
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>>;
}

/// Per-user application data directory under `home`.
pub fn app_support_dir(home: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        home.join("Library").join("Application Support")
    } else {
        home.join(".config")
    }
}

/// Every scanner in catalogue order, minus the kinds listed in
/// `skip_stores`.
pub fn default_scanners(home: &Path, settings: &Settings) -> Result<Vec<Box<dyn StoreScanner>>> {
    let skipped = settings.skipped_kinds()?;

    let mut scanners: Vec<Box<dyn StoreScanner>> = Vec::new();
    for family in BrowserFamily::ALL {
        scanners.push(Box::new(BrowserScanner::new(family, home)));
    }
    scanners.push(Box::new(SshKeyScanner::new(home)));
    scanners.push(Box::new(MailScanner::new(home)));
    scanners.push(Box::new(InternetAccountsScanner::new(home)));
    scanners.push(Box::new(CloudStorageScanner::new(home)));
    if settings.app_support.enabled {
        scanners.push(Box::new(AppSupportScanner::new(home, &settings.app_support)?));
    }

    scanners.retain(|s| !skipped.contains(&s.kind()));
    Ok(scanners)
}

/// Sorted entries of `dir`, or nothing when it does not exist.
pub(crate) fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = read
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
