use super::{file_label, sorted_entries, StoreScanner};
use crate::error::Result;
use crate::matcher::{KeyCommentSource, MatchSource};
use crate::store::{StoreItem, StoreKind};
use crate::util::compute_blake3_hash;
use std::path::{Path, PathBuf};

/// OpenSSH key pairs in `~/.ssh`, keyed by their public half.
pub struct SshKeyScanner {
    root: PathBuf,
}

impl SshKeyScanner {
    pub fn new(home: &Path) -> Self {
        Self {
            root: home.join(".ssh"),
        }
    }
}

impl StoreScanner for SshKeyScanner {
    fn kind(&self) -> StoreKind {
        StoreKind::SshKey
    }

    fn roots(&self) -> Vec<PathBuf> {
        vec![self.root.clone()]
    }

    fn enumerate_root(&self, root: &Path) -> Result<Vec<StoreItem>> {
        let mut items = Vec::new();
        for public in sorted_entries(root)? {
            if !public.is_file() || public.extension().map_or(true, |ext| ext != "pub") {
                continue;
            }

            let private = public.with_extension("");
            let mut item = StoreItem::new(StoreKind::SshKey, &public, file_label(&private));
            if private.is_file() {
                item = item.with_companion(&private);
            }

            match compute_blake3_hash(&public) {
                Ok(hash) => item = item.with_fingerprint(hash),
                Err(e) => log::warn!("Cannot fingerprint {}: {}", public.display(), e),
            }
            items.push(item);
        }
        Ok(items)
    }

    fn sources(&self, item: &StoreItem) -> Vec<Box<dyn MatchSource>> {
        vec![Box::new(KeyCommentSource {
            path: item.path.clone(),
        })]
    }
}
