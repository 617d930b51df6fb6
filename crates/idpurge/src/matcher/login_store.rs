//! Read access to browser login databases through a private temporary copy.
//!
//! The live database may be locked or mid-write by a running browser, so it
//! is never opened directly: the file (and its `-wal`/`-journal` sidecars) is
//! copied into a fresh temporary directory, the copy is queried, and the
//! directory is removed when the closure returns.

use crate::error::{PurgeError, Result};
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::Path;

const SIDECAR_SUFFIXES: [&str; 2] = ["-wal", "-journal"];

/// Run `query` against a throwaway copy of the database at `live_path`.
pub fn with_private_copy<T, F>(live_path: &Path, query: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let file_name = live_path
        .file_name()
        .ok_or_else(|| PurgeError::parse(live_path, "not a file path"))?;

    let scratch = tempfile::Builder::new().prefix("idpurge-login-").tempdir()?;
    let copy_path = scratch.path().join(file_name);
    fs::copy(live_path, &copy_path)?;

    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = live_path.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = Path::new(&sidecar);
        if sidecar.exists() {
            let mut target = copy_path.as_os_str().to_owned();
            target.push(suffix);
            fs::copy(sidecar, Path::new(&target))?;
        }
    }

    log::debug!(
        "Querying private copy {} of {}",
        copy_path.display(),
        live_path.display()
    );

    let result = {
        let conn = Connection::open_with_flags(
            &copy_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        query(&conn)
    };

    scratch.close()?;
    result
}

/// Origins of saved logins whose username equals `username` exactly.
pub fn logins_for_username(live_path: &Path, username: &str) -> Result<Vec<String>> {
    with_private_copy(live_path, |conn| {
        let mut stmt = conn.prepare(
            "SELECT origin_url FROM logins WHERE username_value = ?1 ORDER BY origin_url",
        )?;
        let origins = stmt
            .query_map([username], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(origins)
    })
}
