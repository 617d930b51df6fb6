use super::{app_support_dir, browser::BrowserScanner, file_label, sorted_entries, StoreScanner};
use crate::config::AppSupportSettings;
use crate::error::{PurgeError, Result};
use crate::matcher::{MatchSource, PreferenceSource};
use crate::store::{BrowserFamily, StoreItem, StoreKind};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Generic per-application data directories. Each top-level directory is
/// one item; its small JSON and property-list files are searched for the
/// identity anywhere in their content.
pub struct AppSupportScanner {
    root: PathBuf,
    excluded: BTreeSet<String>,
    include: GlobSet,
    max_depth: usize,
    max_file_bytes: u64,
}

impl AppSupportScanner {
    pub fn new(home: &Path, settings: &AppSupportSettings) -> Result<Self> {
        let root = app_support_dir(home);

        // Browser profiles have their own scanner.
        let mut excluded: BTreeSet<String> = BrowserFamily::ALL
            .iter()
            .filter_map(|family| {
                BrowserScanner::user_data_dir(*family, home)
                    .strip_prefix(&root)
                    .ok()
                    .and_then(|rel| rel.components().next())
                    .map(|c| c.as_os_str().to_string_lossy().to_string())
            })
            .collect();
        excluded.insert("idpurge".to_string());
        excluded.extend(settings.exclude.iter().cloned());

        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.include {
            let glob = Glob::new(pattern)
                .map_err(|e| PurgeError::Config(format!("Invalid glob pattern '{}': {}", pattern, e)))?;
            builder.add(glob);
        }
        let include = builder
            .build()
            .map_err(|e| PurgeError::Config(format!("Failed to build globset: {}", e)))?;

        Ok(Self {
            root,
            excluded,
            include,
            max_depth: settings.max_depth,
            max_file_bytes: settings.max_file_bytes,
        })
    }

    /// Files under `dir` worth parsing, in walk order.
    fn candidate_files(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .max_depth(self.max_depth)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::debug!("Walk error under {}: {}", dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.include.is_match(entry.file_name()) {
                continue;
            }
            match entry.metadata() {
                Ok(meta) if meta.len() <= self.max_file_bytes => files.push(entry.into_path()),
                Ok(_) => log::debug!("Skipping large file {}", entry.path().display()),
                Err(e) => log::debug!("No metadata for {}: {}", entry.path().display(), e),
            }
        }
        files
    }
}

impl StoreScanner for AppSupportScanner {
    fn kind(&self) -> StoreKind {
        StoreKind::AppSupport
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }

    fn enumerate_root(&self, root: &Path) -> Result<Vec<StoreItem>> {
        Ok(sorted_entries(root)?
            .into_iter()
            .filter(|path| path.is_dir() && !self.excluded.contains(&file_label(path)))
            .filter(|path| !self.candidate_files(path).is_empty())
            .map(|path| {
                let label = file_label(&path);
                StoreItem::new(StoreKind::AppSupport, path, label)
            })
            .collect())
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>> {
        self.candidate_files(&item.path)
            .into_iter()
            .map(|path| Box::new(PreferenceSource::deep_only(path)) as Box<dyn MatchSource>)
            .collect()
    }
}
