//! Advisory ownership of the persisted session.
//!
//! A foreground runner keeps the session in memory and only writes it back on
//! its own commands, so nothing else may mutate the stored record while it is
//! alive. Ownership is an OS file lock (`flock`) on
//! `<data_dir>/session.lock`, held for as long as the guard lives and released
//! by the kernel if the process dies.
//!
//! One-shot commands take the same lock for the duration of a single
//! command; read-only queries do not need it.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{Result, StoreError};

const LOCK_FILE: &str = "session.lock";

/// Held session ownership. Dropping it releases the lock.
#[derive(Debug)]
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Take ownership under the default data directory.
    ///
    /// # Errors
    /// Returns [`StoreError::Owned`] when another process holds the session.
    pub fn acquire() -> Result<Self> {
        let dir = data_dir()?;
        Ok(Self::acquire_in(&dir)?)
    }

    /// Take ownership under `dir`, failing fast if it is already held.
    pub fn acquire_in(dir: &Path) -> Result<Self, StoreError> {
        Self::try_acquire_in(dir)?.ok_or(StoreError::Owned)
    }

    /// Take ownership under `dir`; `Ok(None)` when another holder exists.
    pub fn try_acquire_in(dir: &Path) -> Result<Option<Self>, StoreError> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| lock_failed(&path, e))?;

        match lock_nonblocking(&file) {
            Ok(()) => {
                // Owner info for humans; not read back.
                let _ = file.set_len(0);
                let _ = file.seek(SeekFrom::Start(0));
                let _ = writeln!(file, "pid={}", std::process::id());
                let _ = file.flush();
                Ok(Some(Self { file, path }))
            }
            Err(e) if is_busy(&e) => Ok(None),
            Err(e) => Err(lock_failed(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(e) = unlock(&self.file) {
            tracing::debug!(error = %e, path = %self.path.display(), "session unlock failed");
        }
    }
}

fn lock_failed(path: &Path, source: io::Error) -> StoreError {
    StoreError::LockFile {
        path: path.to_path_buf(),
        source,
    }
}

fn is_busy(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock)
        || matches!(error.raw_os_error(), Some(11) | Some(35))
}

#[cfg(unix)]
fn lock_nonblocking(file: &File) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    const LOCK_EX: i32 = 2;
    const LOCK_NB: i32 = 4;
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(file.as_raw_fd(), LOCK_EX | LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn unlock(file: &File) -> io::Result<()> {
    use std::os::fd::AsRawFd;

    const LOCK_UN: i32 = 8;
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(file.as_raw_fd(), LOCK_UN) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(unix)]
extern "C" {
    fn flock(fd: i32, operation: i32) -> i32;
}

// No advisory locking elsewhere: every caller becomes the owner.
#[cfg(not(unix))]
fn lock_nonblocking(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn unlock(_file: &File) -> io::Result<()> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn second_holder_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let first = SessionLock::acquire_in(dir.path()).unwrap();
        assert!(SessionLock::try_acquire_in(dir.path()).unwrap().is_none());
        assert!(matches!(
            SessionLock::acquire_in(dir.path()),
            Err(StoreError::Owned)
        ));

        drop(first);
        let again = SessionLock::acquire_in(dir.path()).unwrap();
        assert_eq!(again.path(), dir.path().join("session.lock"));
    }

    #[test]
    fn lock_file_records_owner_pid() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SessionLock::acquire_in(dir.path()).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), format!("pid={}", std::process::id()));
    }
}
