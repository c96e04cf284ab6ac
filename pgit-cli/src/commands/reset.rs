use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::display::describe_head;

pub fn run(base: &Path, rev: &str) -> Result<()> {
    let repo = super::open_repo(base)?;
    let _lock = super::lock(&repo)?;

    repo.reset(rev)?;
    let head = repo.head_state()?;

    println!("{} {}", "✓ Reset".green().bold(), describe_head(&head));
    println!(
        "  {}",
        "Working directory left unchanged; see 'pgit status'".dimmed()
    );

    Ok(())
}
