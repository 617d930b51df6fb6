//! Staged removal: detach first, then delete.
//!
//! Targets are renamed into a hidden staging directory next to them. Renames
//! within one directory are atomic, so the original location either still
//! holds the complete item or holds nothing. Only then is the staging
//! directory removed.

use crate::error::{PurgeError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Removal {
    Done,
    /// Targets are gone from their original location but the staging
    /// directory could not be fully removed.
    Detached { leftover: PathBuf, error: io::Error },
}

pub fn remove_staged(targets: &[&Path]) -> Result<Removal> {
    let first = targets
        .first()
        .ok_or_else(|| PurgeError::Config("nothing to remove".to_string()))?;
    let parent = first
        .parent()
        .ok_or_else(|| PurgeError::Config(format!("{} has no parent", first.display())))?;

    let staging = tempfile::Builder::new()
        .prefix(".idpurge-staging-")
        .tempdir_in(parent)?;

    let mut moved: Vec<(PathBuf, PathBuf)> = Vec::new();
    for target in targets {
        let name = target
            .file_name()
            .ok_or_else(|| PurgeError::Config(format!("{} has no file name", target.display())))?;
        let staged = staging.path().join(name);

        if let Err(e) = fs::rename(target, &staged) {
            log::error!("Failed to detach {}: {}", target.display(), e);
            for (original, staged) in moved.iter().rev() {
                if let Err(restore) = fs::rename(staged, original) {
                    log::error!(
                        "Failed to restore {} from {}: {}",
                        original.display(),
                        staged.display(),
                        restore
                    );
                    // Keep the staging directory so nothing is lost.
                    let kept = staging.keep();
                    log::error!("Staged files left in {}", kept.display());
                    return Err(e.into());
                }
            }
            return Err(e.into());
        }
        moved.push((target.to_path_buf(), staged));
    }

    let staging_path = staging.path().to_path_buf();
    match staging.close() {
        Ok(()) => Ok(Removal::Done),
        Err(error) => {
            log::error!("Cleanup of {} failed: {}", staging_path.display(), error);
            Ok(Removal::Detached {
                leftover: staging_path,
                error,
            })
        }
    }
}
