use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(base: &Path, message: &str) -> Result<()> {
    let repo = super::open_repo(base)?;
    let _lock = super::lock(&repo)?;

    let oid = repo.commit(message)?;
    let head = repo.head_state()?;

    println!("{}", "✓ Commit created successfully!".green().bold());
    println!("  {}: {}", "Commit ID".bold(), oid);
    println!(
        "  {}: {}",
        "Branch".bold(),
        head.branch().unwrap_or("(detached HEAD)")
    );
    println!("  {}: {}", "Message".bold(), message);

    Ok(())
}
