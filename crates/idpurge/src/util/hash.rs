use crate::error::{PurgeError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub fn compute_blake3_hash<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        log::error!("Failed to open file for hashing: {}: {}", path.display(), e);
        e
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Fail with `ChangedSinceScan` unless `path` still hashes to `expected`.
pub fn verify_unchanged<P: AsRef<Path>>(path: P, expected: &str) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PurgeError::ChangedSinceScan {
            path: path.to_path_buf(),
        });
    }

    let actual = compute_blake3_hash(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        log::warn!(
            "{} changed since scan: expected {}, got {}",
            path.display(),
            expected,
            actual
        );
        return Err(PurgeError::ChangedSinceScan {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}
