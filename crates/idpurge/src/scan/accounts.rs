//! Account stores owned by an application: Mail, Internet Accounts and
//! cloud storage clients. These are never deleted, only flagged.

use super::{file_label, sorted_entries, StoreScanner};
use crate::error::Result;
use crate::matcher::{MatchSource, PreferenceSource};
use crate::store::{OwningApp, StoreItem, StoreKind};
use std::path::{Path, PathBuf};

const MAIL_FIELDS: [(&str, &str); 3] = [
    ("MailAccounts.*.EmailAddresses.*", "mail account address"),
    ("MailAccounts.*.Username", "mail account user"),
    ("DeliveryAccounts.*.Username", "outgoing server user"),
];

fn mail_app() -> OwningApp {
    OwningApp::new("Mail", &["Mail"])
}

pub struct MailScanner {
    roots: Vec<PathBuf>,
}

impl MailScanner {
    pub fn new(home: &Path) -> Self {
        Self {
            roots: vec![
                home.join("Library").join("Mail"),
                home.join("Library/Containers/com.apple.mail/Data/Library/Mail"),
            ],
        }
    }
}

fn is_mail_version_dir(path: &Path) -> bool {
    let name = file_label(path);
    path.is_dir()
        && name.len() > 1
        && name.starts_with('V')
        && name[1..].chars().all(|c| c.is_ascii_digit())
}

impl StoreScanner for MailScanner {
    fn kind(&self) -> StoreKind {
        StoreKind::Mail
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }

    fn enumerate_root(&self, root: &Path) -> Result<Vec<StoreItem>> {
        let mut items = Vec::new();
        for version in sorted_entries(root)? {
            if !is_mail_version_dir(&version) {
                continue;
            }
            let accounts = version.join("MailData").join("Accounts.plist");
            if accounts.is_file() {
                let label = format!("Mail {}", file_label(&version));
                items.push(StoreItem::new(StoreKind::Mail, accounts, label).with_owner(mail_app()));
            }
        }
        Ok(items)
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>> {
        vec![Box::new(PreferenceSource::new(&item.path, &MAIL_FIELDS))]
    }
}

/// System-level accounts (iCloud and friends) listed in
/// `MobileMeAccounts.plist`.
pub struct InternetAccountsScanner {
    path: PathBuf,
}

impl InternetAccountsScanner {
    pub fn new(home: &Path) -> Self {
        Self {
            path: home.join("Library/Preferences/MobileMeAccounts.plist"),
        }
    }
}

impl StoreScanner for InternetAccountsScanner {
    fn kind(&self) -> StoreKind {
        StoreKind::InternetAccounts
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.path.clone())]
    }

    fn enumerate_root(&self, _root: &Path) -> Result<Vec<StoreItem>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        Ok(vec![StoreItem::new(StoreKind::InternetAccounts, &self.path, "Internet Accounts")
            .with_owner(OwningApp::new(
                "System Settings",
                &["System Settings", "System Preferences"],
            ))])
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>> {
        vec![Box::new(PreferenceSource::new(
            &item.path,
            &[("Accounts.*.AccountID", "internet account")],
        ))]
    }
}

struct CloudClient {
    name: &'static str,
    process: &'static str,
    relative: &'static str,
    fields: &'static [(&'static str, &'static str)],
}

const CLOUD_CLIENTS: [CloudClient; 3] = [
    CloudClient {
        name: "Dropbox",
        process: "Dropbox",
        relative: ".dropbox/info.json",
        fields: &[
            ("personal.email", "personal account"),
            ("business.email", "business account"),
        ],
    },
    CloudClient {
        name: "OneDrive",
        process: "OneDrive",
        relative: "Library/Group Containers/UBF8T346G9.OneDriveStandaloneSuite/Library/Preferences/UBF8T346G9.OneDriveStandaloneSuite.plist",
        // One dict per linked account: Personal, Business1, Business2...
        fields: &[("*.UserEmail", "linked account")],
    },
    CloudClient {
        name: "Google Drive",
        process: "Google Drive",
        relative: "Library/Preferences/com.google.drivefs.settings.plist",
        fields: &[("DefaultAccountEmail", "default account")],
    },
];

/// Sign-in state of the desktop sync clients.
pub struct CloudStorageScanner {
    home: PathBuf,
}

impl CloudStorageScanner {
    pub fn new(home: &Path) -> Self {
        Self {
            home: home.to_path_buf(),
        }
    }
}

impl StoreScanner for CloudStorageScanner {
    fn kind(&self) -> StoreKind {
        StoreKind::CloudStorage
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.home.clone()]
    }

    fn enumerate_root(&self, _root: &Path) -> Result<Vec<StoreItem>> {
        Ok(CLOUD_CLIENTS
            .iter()
            .map(|client| (client, self.home.join(client.relative)))
            .filter(|(_, path)| path.is_file())
            .map(|(client, path)| {
                StoreItem::new(StoreKind::CloudStorage, path, client.name)
                    .with_owner(OwningApp::new(client.name, &[client.process]))
            })
            .collect())
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>> {
        let fields = CLOUD_CLIENTS
            .iter()
            .find(|client| item.path == self.home.join(client.relative))
            .map_or(&[][..], |client| client.fields);
        vec![Box::new(PreferenceSource::new(&item.path, fields))]
    }
}
