//! Exclusive ownership of a data directory.
//!
//! Only the holder of `eyecare.lock` may change the saved session or the
//! statistics. `eyecare run` holds it for its whole lifetime; one-shot
//! commands take it for the length of one command. Lock acquisition is
//! atomic and exclusive via `flock(LOCK_EX | LOCK_NB)` and the kernel drops
//! the lock with the file descriptor, so a crashed owner never leaves it
//! behind.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

pub const LOCK_FILE: &str = "eyecare.lock";

/// Held lock. Released on drop.
#[derive(Debug)]
pub struct OwnerLock {
    _file: File,
    path: PathBuf,
}

impl OwnerLock {
    /// Try to become the owner of `dir` without waiting.
    ///
    /// Returns `Ok(None)` when another process holds the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked for a
    /// reason other than contention.
    pub fn try_acquire(dir: &Path) -> io::Result<Option<Self>> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        if !try_flock_exclusive(&file)? {
            debug!(path = %path.display(), "data directory is owned elsewhere");
            return Ok(None);
        }
        // The pid is informational only; the flock is what excludes.
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        Ok(Some(Self { _file: file, path }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Returns `Ok(true)` if the lock was acquired, `Ok(false)` if another open
/// file description already holds it.
fn try_flock_exclusive(file: &File) -> io::Result<bool> {
    #[cfg(unix)]
    {
        use std::os::unix::io::AsRawFd;
        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by `file` for the whole call.
        #[allow(unsafe_code)]
        let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if result == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::EWOULDBLOCK)
        {
            return Ok(false);
        }
        Err(err)
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(true)
    }
}
