use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::display::{change_icon, describe_head};

pub fn run(base: &Path, json: bool) -> Result<()> {
    let repo = super::open_repo(base)?;
    let status = repo.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Repository Status".bold().cyan());
    println!(
        "  {}: {}",
        "Root".bold(),
        repo.context().work_dir().display()
    );
    println!("  {}: {}", "HEAD".bold(), describe_head(&status.head));
    println!();

    if status.is_clean() {
        println!("{}", "No uncommitted changes".green());
        return Ok(());
    }

    println!(
        "{} {}",
        "Uncommitted changes:".bold(),
        format!("({})", status.changes.len()).yellow()
    );
    println!();
    for change in &status.changes {
        println!(
            "  {} {}",
            change_icon(change.change_type),
            change.path.display()
        );
    }
    println!();
    println!(
        "Run {} to commit these changes",
        "pgit commit -m \"message\"".cyan()
    );

    Ok(())
}
