use anyhow::Result;
use colored::Colorize;
use pgit_core::HeadState;
use std::path::Path;

pub fn run(base: &Path, target: &str) -> Result<()> {
    let repo = super::open_repo(base)?;
    let _lock = super::lock(&repo)?;

    match repo.checkout(target)? {
        HeadState::Branch { name, .. } => {
            println!("{} {}", "✓ Switched to branch".green().bold(), name.cyan());
        }
        HeadState::Detached { oid } => {
            let at = oid.map(|oid| oid.short()).unwrap_or_default();
            println!(
                "{} {}",
                "✓ HEAD is now detached at".green().bold(),
                at.yellow()
            );
        }
    }

    Ok(())
}
