use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(base: &Path, name: Option<&str>, start: Option<&str>) -> Result<()> {
    let repo = super::open_repo(base)?;

    let Some(name) = name else {
        for branch in repo.branches()? {
            let at = branch
                .oid
                .map(|oid| oid.short())
                .unwrap_or_else(|| "(no commits)".to_string());
            if branch.is_current {
                println!("{} {} {}", "*".green(), branch.name.green().bold(), at.dimmed());
            } else {
                println!("  {} {}", branch.name, at.dimmed());
            }
        }
        return Ok(());
    };

    let _lock = super::lock(&repo)?;
    let oid = repo.create_branch(name, start)?;
    let at = oid
        .map(|oid| oid.short())
        .unwrap_or_else(|| "(no commits)".to_string());
    println!(
        "{} {} at {}",
        "✓ Created branch".green().bold(),
        name.cyan(),
        at.yellow()
    );

    Ok(())
}
