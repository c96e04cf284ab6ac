use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn run(base: &Path, file: PathBuf) -> Result<()> {
    let repo = super::open_repo(base)?;
    let path = base.join(file);
    let data = std::fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))?;

    let _lock = super::lock(&repo)?;
    let oid = repo.hash_object(&data)?;
    println!("{}", oid);

    Ok(())
}
