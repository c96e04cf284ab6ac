use anyhow::Result;
use colored::Colorize;
use pgit_core::{Commit, ObjectId};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct LogEntry<'a> {
    id: &'a ObjectId,
    #[serde(flatten)]
    commit: &'a Commit,
}

pub fn run(base: &Path, rev: Option<&str>, limit: Option<usize>, json: bool) -> Result<()> {
    let repo = super::open_repo(base)?;
    let commits = repo.log(rev, limit)?;

    if json {
        let entries: Vec<_> = commits
            .iter()
            .map(|(id, commit)| LogEntry { id, commit })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if commits.is_empty() {
        println!("{}", "No commits yet".yellow());
        return Ok(());
    }

    for (id, commit) in &commits {
        println!("{} {}", "commit".yellow().bold(), id.to_string().yellow());
        if let Some(parent) = &commit.parent {
            println!("{}: {}", "Parent".bold(), parent.short().dimmed());
        }
        println!();
        for line in commit.message.lines() {
            println!("    {}", line);
        }
        println!();
    }

    if let Some(limit) = limit {
        if commits.len() == limit {
            println!("Use {} to see more", "--limit N".cyan());
        }
    }

    Ok(())
}
