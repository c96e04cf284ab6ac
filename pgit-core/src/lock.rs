//! Exclusive advisory lock on a repository.
//!
//! Held around every mutating command so two processes never interleave ref
//! updates or tree writes. Released on drop.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::context::RepoContext;
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    file: File,
}

impl RepoLock {
    /// Takes the lock without blocking; fails with [`Error::Locked`] if held.
    pub fn acquire(ctx: &RepoContext) -> Result<Self> {
        if !ctx.control_dir().is_dir() {
            return Err(Error::Uninitialized(ctx.control_dir().to_path_buf()));
        }
        let path = ctx.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("acquired {}", path.display());
                Ok(Self { path, file })
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Err(Error::Locked),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("released {}", self.path.display());
    }
}
