pub mod branch;
pub mod cat_file;
pub mod checkout;
pub mod commit;
pub mod hash_object;
pub mod init;
pub mod log;
pub mod read_tree;
pub mod reset;
pub mod show;
pub mod status;
pub mod tag;
pub mod write_tree;

use anyhow::{Context, Result};
use pgit_core::{Error, OsFs, RepoLock, Repository};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The directory commands run in: `-C <dir>` or the process working directory.
pub fn base_dir(custom: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
    Ok(match custom {
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}

pub fn open_repo(base: &Path) -> Result<Repository> {
    match Repository::discover(OsFs, base) {
        Err(Error::Uninitialized(_)) => anyhow::bail!(
            "Not a pgit repository (or any parent up to /). Run 'pgit init' first."
        ),
        other => {
            let repo = other?;
            debug!("using repository at {}", repo.context().work_dir().display());
            Ok(repo)
        }
    }
}

/// Serializes mutating commands against other pgit processes.
pub fn lock(repo: &Repository) -> Result<RepoLock> {
    RepoLock::acquire(repo.context()).with_context(|| {
        format!(
            "Cannot lock repository at {}",
            repo.context().control_dir().display()
        )
    })
}
