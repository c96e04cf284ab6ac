use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(base: &Path, name: Option<&str>, rev: Option<&str>) -> Result<()> {
    let repo = super::open_repo(base)?;

    let Some(name) = name else {
        for (tag, oid) in repo.tags()? {
            let at = oid.map(|oid| oid.short()).unwrap_or_default();
            println!("{} {}", tag, at.dimmed());
        }
        return Ok(());
    };

    let _lock = super::lock(&repo)?;
    let oid = repo.create_tag(name, rev)?;
    println!(
        "{} {} at {}",
        "✓ Tagged".green().bold(),
        name.cyan(),
        oid.short().yellow()
    );

    Ok(())
}
