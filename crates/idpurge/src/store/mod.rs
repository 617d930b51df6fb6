//! Data model shared by scanners, the match evaluator and the resolvers.

use crate::error::{PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Brave,
}

impl BrowserFamily {
    pub const ALL: [BrowserFamily; 3] = [BrowserFamily::Chrome, BrowserFamily::Edge, BrowserFamily::Brave];

    pub fn display_name(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "Google Chrome",
            BrowserFamily::Edge => "Microsoft Edge",
            BrowserFamily::Brave => "Brave Browser",
        }
    }

    pub fn owning_app(&self) -> OwningApp {
        match self {
            BrowserFamily::Chrome => OwningApp::new("Google Chrome", &["Google Chrome", "chrome"]),
            BrowserFamily::Edge => OwningApp::new("Microsoft Edge", &["Microsoft Edge", "msedge"]),
            BrowserFamily::Brave => OwningApp::new("Brave Browser", &["Brave Browser", "brave"]),
        }
    }
}

/// Which application data store an item belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(into = "String", try_from = "String")]
pub enum StoreKind {
    Browser(BrowserFamily),
    SshKey,
    Mail,
    InternetAccounts,
    CloudStorage,
    AppSupport,
}

impl StoreKind {
    pub const ALL: [StoreKind; 8] = [
        StoreKind::Browser(BrowserFamily::Chrome),
        StoreKind::Browser(BrowserFamily::Edge),
        StoreKind::Browser(BrowserFamily::Brave),
        StoreKind::SshKey,
        StoreKind::Mail,
        StoreKind::InternetAccounts,
        StoreKind::CloudStorage,
        StoreKind::AppSupport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Browser(BrowserFamily::Chrome) => "chrome-profile",
            StoreKind::Browser(BrowserFamily::Edge) => "edge-profile",
            StoreKind::Browser(BrowserFamily::Brave) => "brave-profile",
            StoreKind::SshKey => "ssh-key",
            StoreKind::Mail => "mail",
            StoreKind::InternetAccounts => "internet-accounts",
            StoreKind::CloudStorage => "cloud-storage",
            StoreKind::AppSupport => "app-support",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        StoreKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| PurgeError::Config(format!("Unknown store kind: {}", s)))
    }

    /// What happens to an item of this kind once it is confirmed as a match.
    pub fn disposition(&self) -> Disposition {
        match self {
            StoreKind::Browser(_) => Disposition::DeleteDirectory,
            StoreKind::SshKey => Disposition::DeleteKeyPair,
            StoreKind::Mail
            | StoreKind::InternetAccounts
            | StoreKind::CloudStorage
            | StoreKind::AppSupport => Disposition::Remediate,
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<StoreKind> for String {
    fn from(kind: StoreKind) -> Self {
        kind.as_str().to_string()
    }
}

impl TryFrom<String> for StoreKind {
    type Error = PurgeError;

    fn try_from(value: String) -> Result<Self> {
        StoreKind::from_str(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The whole item directory is removed as one unit.
    DeleteDirectory,
    /// The public key and its private companion are removed together.
    DeleteKeyPair,
    /// Never touched; the operator gets an instruction instead.
    Remediate,
}

/// Application that owns a store and must not be running while it is changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwningApp {
    pub name: String,
    pub process_names: Vec<String>,
}

impl OwningApp {
    pub fn new(name: &str, process_names: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            process_names: process_names.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// One scannable unit: a profile directory, a key pair or a configuration file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreItem {
    pub kind: StoreKind,
    pub path: PathBuf,
    pub label: String,
    /// Files removed together with `path` (the private half of a key pair).
    pub companions: Vec<PathBuf>,
    /// BLAKE3 of `path` taken at enumeration, for file items.
    pub fingerprint: Option<String>,
    pub owner: Option<OwningApp>,
}

impl StoreItem {
    pub fn new(kind: StoreKind, path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            label: label.into(),
            companions: Vec::new(),
            fingerprint: None,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: OwningApp) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_companion(mut self, path: impl Into<PathBuf>) -> Self {
        self.companions.push(path.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: String) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// Every path a deletion of this item would remove.
    pub fn all_paths(&self) -> Vec<&Path> {
        std::iter::once(self.path.as_path())
            .chain(self.companions.iter().map(|p| p.as_path()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    StructuredField,
    DeepDocument,
    RelationalStore,
    KeyComment,
}

impl MatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::StructuredField => "structured-field",
            MatchStrategy::DeepDocument => "deep-document",
            MatchStrategy::RelationalStore => "relational-store",
            MatchStrategy::KeyComment => "key-comment",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Exact,
    Substring,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Exact => "exact",
            Confidence::Substring => "substring",
        }
    }
}

/// Evidence that an identity was found inside a store item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MatchDescriptor {
    pub kind: StoreKind,
    /// The originating store item.
    pub item_path: PathBuf,
    /// The file inside the item where the evidence was found.
    pub source_path: PathBuf,
    pub strategy: MatchStrategy,
    pub field: String,
    pub confidence: Confidence,
}

impl MatchDescriptor {
    pub fn describe(&self) -> String {
        format!(
            "{} ({}, {} match in {})",
            self.field,
            self.strategy.as_str(),
            self.confidence.as_str(),
            self.source_path.display()
        )
    }
}
