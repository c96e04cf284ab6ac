use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::display::{change_label, print_file_diff};

pub fn run(base: &Path, rev: Option<&str>) -> Result<()> {
    let repo = super::open_repo(base)?;
    let report = repo.show(rev)?;

    println!(
        "{} {}",
        "commit".yellow().bold(),
        report.id.to_string().yellow()
    );
    println!("{}: {}", "Tree".bold(), report.commit.tree.short());
    if let Some(parent) = &report.commit.parent {
        println!("{}: {}", "Parent".bold(), parent.short());
    }
    println!();
    for line in report.commit.message.lines() {
        println!("    {}", line);
    }
    println!();

    for (change, diff) in &report.changes {
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "{} {}",
            change_label(change.change_type),
            change.path.display().to_string().white().bold()
        );
        println!();
        print_file_diff(diff);
        println!();
    }

    Ok(())
}
