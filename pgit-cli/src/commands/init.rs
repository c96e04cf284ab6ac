use anyhow::Result;
use colored::Colorize;
use pgit_core::{OsFs, Repository};
use std::path::{Path, PathBuf};

pub fn run(base: &Path, path: Option<PathBuf>) -> Result<()> {
    let work_dir = match path {
        Some(path) => base.join(path),
        None => base.to_path_buf(),
    };
    std::fs::create_dir_all(&work_dir)?;

    let repo = Repository::init(OsFs, &work_dir)?;

    println!(
        "{} {}",
        "✓ Initialized empty pgit repository in".green().bold(),
        repo.context().control_dir().display()
    );
    println!(
        "  {}: {}",
        "Branch".bold(),
        repo.config().default_branch.cyan()
    );

    Ok(())
}
