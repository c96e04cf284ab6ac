use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::object::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Modify,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Modify => "modify",
            ChangeType::Delete => "delete",
        }
    }
}

/// One file that differs between two flattened trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeChange {
    pub path: PathBuf,
    pub change_type: ChangeType,
    pub old: Option<ObjectId>,
    pub new: Option<ObjectId>,
}

/// Compares two `path -> blob id` maps; the result is sorted by path.
pub fn diff_trees(
    old: &BTreeMap<PathBuf, ObjectId>,
    new: &BTreeMap<PathBuf, ObjectId>,
) -> Vec<TreeChange> {
    let paths: BTreeSet<&PathBuf> = old.keys().chain(new.keys()).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let before = old.get(path).copied();
            let after = new.get(path).copied();
            let change_type = match (before, after) {
                (None, Some(_)) => ChangeType::Create,
                (Some(_), None) => ChangeType::Delete,
                (Some(a), Some(b)) if a != b => ChangeType::Modify,
                _ => return None,
            };
            Some(TreeChange {
                path: path.clone(),
                change_type,
                old: before,
                new: after,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct FileDiff {
    pub path: String,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub binary: bool,
    pub diff_lines: Vec<DiffLine>,
}

#[derive(Debug, Clone)]
pub struct DiffLine {
    pub line_type: DiffLineType,
    pub content: String,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLineType {
    Context,
    Addition,
    Deletion,
}

impl FileDiff {
    /// Line diff of two blob payloads; `None` stands for an absent file.
    pub fn from_blobs(path: impl Into<String>, old: Option<&[u8]>, new: Option<&[u8]>) -> Self {
        let decode = |bytes: Option<&[u8]>| -> Option<Option<String>> {
            match bytes {
                None => Some(None),
                Some(b) => std::str::from_utf8(b).ok().map(|s| Some(s.to_string())),
            }
        };

        match (decode(old), decode(new)) {
            (Some(old_content), Some(new_content)) => {
                let diff_lines = Self::compute_diff(
                    old_content.as_deref().unwrap_or(""),
                    new_content.as_deref().unwrap_or(""),
                );
                FileDiff {
                    path: path.into(),
                    old_content,
                    new_content,
                    binary: false,
                    diff_lines,
                }
            }
            _ => FileDiff {
                path: path.into(),
                old_content: None,
                new_content: None,
                binary: true,
                diff_lines: Vec::new(),
            },
        }
    }

    fn compute_diff(old_text: &str, new_text: &str) -> Vec<DiffLine> {
        let diff = TextDiff::from_lines(old_text, new_text);
        let mut lines = Vec::new();
        let mut old_line_num = 1;
        let mut new_line_num = 1;

        for change in diff.iter_all_changes() {
            let (line_type, old_num, new_num) = match change.tag() {
                ChangeTag::Delete => {
                    let num = old_line_num;
                    old_line_num += 1;
                    (DiffLineType::Deletion, Some(num), None)
                }
                ChangeTag::Insert => {
                    let num = new_line_num;
                    new_line_num += 1;
                    (DiffLineType::Addition, None, Some(num))
                }
                ChangeTag::Equal => {
                    let old_num = old_line_num;
                    let new_num = new_line_num;
                    old_line_num += 1;
                    new_line_num += 1;
                    (DiffLineType::Context, Some(old_num), Some(new_num))
                }
            };

            lines.push(DiffLine {
                line_type,
                content: change.to_string(),
                old_line_number: old_num,
                new_line_number: new_num,
            });
        }

        lines
    }

    pub fn has_changes(&self) -> bool {
        self.binary
            || self
                .diff_lines
                .iter()
                .any(|l| l.line_type != DiffLineType::Context)
    }

    pub fn format_unified(&self, context_lines: usize) -> String {
        if self.binary {
            return format!("Binary file {} differs\n", self.path);
        }
        let old = self.old_content.as_deref().unwrap_or("");
        let new = self.new_content.as_deref().unwrap_or("");
        let old_header = if self.old_content.is_some() {
            format!("a/{}", self.path)
        } else {
            "/dev/null".to_string()
        };
        let new_header = if self.new_content.is_some() {
            format!("b/{}", self.path)
        } else {
            "/dev/null".to_string()
        };

        TextDiff::from_lines(old, new)
            .unified_diff()
            .context_radius(context_lines)
            .header(&old_header, &new_header)
            .to_string()
    }
}
