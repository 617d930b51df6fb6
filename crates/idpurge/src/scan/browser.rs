use super::{app_support_dir, file_label, sorted_entries, StoreScanner};
use crate::error::Result;
use crate::matcher::{LoginStoreSource, MatchSource, PreferenceSource};
use crate::store::{BrowserFamily, StoreItem, StoreKind};
use std::path::{Path, PathBuf};

const PREFERENCES: &str = "Preferences";
const LOGIN_STORES: [&str; 2] = ["Login Data", "Login Data For Account"];
const NON_USER_PROFILES: [&str; 2] = ["System Profile", "Guest Profile"];

const ACCOUNT_FIELDS: [(&str, &str); 3] = [
    ("account_info.*.email", "sync account"),
    ("google.services.last_username", "last signed-in user"),
    ("google.services.username", "signed-in user"),
];

/// Chromium-family profiles: every directory under the user data root that
/// holds a `Preferences` file.
pub struct BrowserScanner {
    family: BrowserFamily,
    root: PathBuf,
}

impl BrowserScanner {
    pub fn new(family: BrowserFamily, home: &Path) -> Self {
        Self {
            family,
            root: Self::user_data_dir(family, home),
        }
    }

    pub fn with_root(family: BrowserFamily, root: impl Into<PathBuf>) -> Self {
        Self {
            family,
            root: root.into(),
        }
    }

    pub fn user_data_dir(family: BrowserFamily, home: &Path) -> PathBuf {
        let base = app_support_dir(home);
        let relative: &[&str] = if cfg!(target_os = "macos") {
            match family {
                BrowserFamily::Chrome => &["Google", "Chrome"],
                BrowserFamily::Edge => &["Microsoft Edge"],
                BrowserFamily::Brave => &["BraveSoftware", "Brave-Browser"],
            }
        } else {
            match family {
                BrowserFamily::Chrome => &["google-chrome"],
                BrowserFamily::Edge => &["microsoft-edge"],
                BrowserFamily::Brave => &["BraveSoftware", "Brave-Browser"],
            }
        };
        relative.iter().fold(base, |path, part| path.join(part))
    }
}

impl StoreScanner for BrowserScanner {
    fn kind(&self) -> StoreKind {
        StoreKind::Browser(self.family)
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }

    fn enumerate_root(&self, root: &Path) -> Result<Vec<StoreItem>> {
        let items = sorted_entries(root)?
            .into_iter()
            .filter(|path| path.is_dir() && path.join(PREFERENCES).is_file())
            .filter(|path| !NON_USER_PROFILES.contains(&file_label(path).as_str()))
            .map(|path| {
                let label = file_label(&path);
                StoreItem::new(self.kind(), path, label).with_owner(self.family.owning_app())
            })
            .collect();
        Ok(items)
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>> {
        let mut sources: Vec<Box<dyn MatchSource>> = vec![Box::new(PreferenceSource::new(
            item.path.join(PREFERENCES),
            &ACCOUNT_FIELDS,
        ))];
        for name in LOGIN_STORES {
            let path = item.path.join(name);
            if path.is_file() {
                sources.push(Box::new(LoginStoreSource { path }));
            }
        }
        sources
    }
}
