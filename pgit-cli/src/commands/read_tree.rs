use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(base: &Path, tree: &str) -> Result<()> {
    let repo = super::open_repo(base)?;
    let _lock = super::lock(&repo)?;

    let oid = repo.resolve_revision(tree)?;
    repo.read_tree(&oid)?;

    println!(
        "{} {}",
        "✓ Working directory replaced with tree".green().bold(),
        oid.short().yellow()
    );

    Ok(())
}
