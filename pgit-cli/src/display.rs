use colored::{ColoredString, Colorize};
use pgit_core::diff::{DiffLineType, FileDiff};
use pgit_core::{ChangeType, HeadState};

pub fn change_icon(change_type: ChangeType) -> ColoredString {
    match change_type {
        ChangeType::Create => "+".green(),
        ChangeType::Modify => "~".yellow(),
        ChangeType::Delete => "-".red(),
    }
}

pub fn change_label(change_type: ChangeType) -> ColoredString {
    match change_type {
        ChangeType::Create => "NEW".green(),
        ChangeType::Modify => "MOD".yellow(),
        ChangeType::Delete => "DEL".red(),
    }
}

pub fn describe_head(head: &HeadState) -> String {
    match head {
        HeadState::Branch { name, oid: Some(oid) } => format!("{} ({})", name, oid.short()),
        HeadState::Branch { name, oid: None } => format!("{} (no commits yet)", name),
        HeadState::Detached { oid: Some(oid) } => format!("detached at {}", oid.short()),
        HeadState::Detached { oid: None } => "detached (empty)".to_string(),
    }
}

pub fn print_file_diff(diff: &FileDiff) {
    if diff.binary {
        println!("  {}", "[Binary file]".dimmed());
        return;
    }
    for line in &diff.diff_lines {
        let (prefix, color): (&str, fn(&str) -> ColoredString) = match line.line_type {
            DiffLineType::Addition => ("+", |s| s.green()),
            DiffLineType::Deletion => ("-", |s| s.red()),
            DiffLineType::Context => (" ", |s| s.normal()),
        };
        let mut text = format!("{}{}", prefix, line.content);
        if !text.ends_with('\n') {
            text.push('\n');
        }
        print!("{}", color(&text));
    }
}
