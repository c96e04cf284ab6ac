use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run(base: &Path, path: Option<PathBuf>) -> Result<()> {
    let repo = super::open_repo(base)?;
    let _lock = super::lock(&repo)?;

    let oid = match path {
        Some(path) => repo.write_tree_at(&base.join(path))?,
        None => repo.write_tree()?,
    };
    println!("{}", oid);

    Ok(())
}
