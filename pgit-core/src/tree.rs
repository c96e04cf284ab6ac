//! Directory trees as content-addressed objects.
//!
//! A tree object is UTF-8 text with one line per entry, `<kind> <id> <name>`,
//! sorted by name so that identical directories always hash identically.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::context::CONTROL_DIR;
use crate::error::{Error, Result};
use crate::fs::{DirEntry, FileSystem};
use crate::object::{self, ObjectId, ObjectKind, ObjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Blob => "blob",
            EntryKind::Tree => "tree",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(EntryKind::Blob),
            "tree" => Some(EntryKind::Tree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub id: ObjectId,
    pub name: String,
}

impl TreeEntry {
    pub fn new(kind: EntryKind, id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            name: name.into(),
        }
    }
}

/// Ordered listing of one directory. Entries are kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn parse(oid: &ObjectId, data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::corrupt_object(oid, "tree is not valid UTF-8"))?;

        let mut entries = Vec::new();
        for line in text.lines() {
            let mut parts = line.splitn(3, ' ');
            let (kind, id, name) = match (parts.next(), parts.next(), parts.next()) {
                (Some(kind), Some(id), Some(name)) => (kind, id, name),
                _ => {
                    return Err(Error::corrupt_object(
                        oid,
                        format!("malformed tree line {:?}", line),
                    ))
                }
            };
            let kind = EntryKind::parse(kind).ok_or_else(|| {
                Error::corrupt_object(oid, format!("unknown entry kind {:?}", kind))
            })?;
            let id = id
                .parse::<ObjectId>()
                .map_err(|_| Error::corrupt_object(oid, format!("bad entry id {:?}", id)))?;
            if !is_valid_name(name) {
                return Err(Error::corrupt_object(
                    oid,
                    format!("bad entry name {:?}", name),
                ));
            }
            entries.push(TreeEntry::new(kind, id, name));
        }
        Ok(Self::new(entries))
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} {} {}", entry.kind.as_str(), entry.id, entry.name)?;
        }
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\n', '\r', '\0'])
}

/// Names that are never recorded in trees nor removed by a sweep.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
    extra: Vec<String>,
}

impl Exclusions {
    pub fn new(extra: Vec<String>) -> Self {
        Self { extra }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        name == CONTROL_DIR || name.starts_with('.') || self.extra.iter().any(|e| e == name)
    }
}

/// Reads and writes directory trees through an [`ObjectStore`].
pub struct TreeCodec<'a, F: FileSystem> {
    fs: &'a F,
    store: &'a ObjectStore<'a, F>,
    exclusions: Exclusions,
}

impl<'a, F: FileSystem> TreeCodec<'a, F> {
    pub fn new(fs: &'a F, store: &'a ObjectStore<'a, F>, exclusions: Exclusions) -> Self {
        Self {
            fs,
            store,
            exclusions,
        }
    }

    fn eligible_entries(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = self
            .fs
            .list_entries(dir)
            .map_err(|e| Error::io(dir, e))?;
        entries.retain(|entry| !self.exclusions.is_excluded(&entry.name));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Stores the directory at `root` (recursively) and returns its tree id.
    pub fn write_tree(&self, root: &Path) -> Result<ObjectId> {
        let mut entries = Vec::new();
        for entry in self.eligible_entries(root)? {
            if entry.is_symlink() {
                warn!("skipping symlink {}", root.join(&entry.name).display());
                continue;
            }
            if !is_valid_name(&entry.name) {
                return Err(Error::InvalidPath(root.join(&entry.name).display().to_string()));
            }
            let path = root.join(&entry.name);
            if entry.is_dir() {
                let id = self.write_tree(&path)?;
                entries.push(TreeEntry::new(EntryKind::Tree, id, entry.name));
            } else {
                let data = self.fs.read_file(&path).map_err(|e| Error::io(&path, e))?;
                let id = self.store.put(&data)?;
                entries.push(TreeEntry::new(EntryKind::Blob, id, entry.name));
            }
        }

        let tree = Tree::new(entries);
        let oid = self
            .store
            .put_object(ObjectKind::Tree, tree.encode().as_bytes())?;
        debug!("wrote tree {} for {}", oid.short(), root.display());
        Ok(oid)
    }

    pub fn load(&self, oid: &ObjectId) -> Result<Tree> {
        let data = self.store.get_kind(oid, ObjectKind::Tree)?;
        Tree::parse(oid, &data)
    }

    /// Materializes tree `oid` into `dest`, recreating nested directories.
    pub fn read_tree(&self, oid: &ObjectId, dest: &Path) -> Result<()> {
        let tree = self.load(oid)?;
        self.fs
            .create_dir_all(dest)
            .map_err(|e| Error::io(dest, e))?;

        for entry in tree.entries() {
            let path = dest.join(&entry.name);
            match entry.kind {
                EntryKind::Blob => {
                    let data = self.store.get_kind(&entry.id, ObjectKind::Blob)?;
                    self.fs
                        .write_file(&path, &data)
                        .map_err(|e| Error::io(&path, e))?;
                }
                EntryKind::Tree => self.read_tree(&entry.id, &path)?,
            }
        }
        debug!("read tree {} into {}", oid.short(), dest.display());
        Ok(())
    }

    /// Removes everything under `path` except excluded entries.
    ///
    /// Directories that still hold excluded entries after sweeping are kept.
    /// Symlinks are unlinked, never descended into.
    pub fn sweep(&self, path: &Path) -> Result<()> {
        for entry in self.eligible_entries(path)? {
            let child = path.join(&entry.name);
            if entry.is_dir() {
                self.sweep(&child)?;
                let remaining = self
                    .fs
                    .list_entries(&child)
                    .map_err(|e| Error::io(&child, e))?;
                if !remaining.is_empty() {
                    continue;
                }
            }
            self.fs
                .remove_all(&child)
                .map_err(|e| Error::io(&child, e))?;
        }
        Ok(())
    }

    /// Every blob reachable from tree `oid`, keyed by its relative path.
    pub fn flatten(&self, oid: &ObjectId) -> Result<BTreeMap<PathBuf, ObjectId>> {
        let mut files = BTreeMap::new();
        self.flatten_into(oid, Path::new(""), &mut files)?;
        Ok(files)
    }

    fn flatten_into(
        &self,
        oid: &ObjectId,
        prefix: &Path,
        files: &mut BTreeMap<PathBuf, ObjectId>,
    ) -> Result<()> {
        for entry in self.load(oid)?.entries() {
            let path = prefix.join(&entry.name);
            match entry.kind {
                EntryKind::Blob => {
                    files.insert(path, entry.id);
                }
                EntryKind::Tree => self.flatten_into(&entry.id, &path, files)?,
            }
        }
        Ok(())
    }

    /// Blob ids of the working files under `root`, computed without storing anything.
    pub fn snapshot(&self, root: &Path) -> Result<BTreeMap<PathBuf, ObjectId>> {
        let mut files = BTreeMap::new();
        self.snapshot_into(root, Path::new(""), &mut files)?;
        Ok(files)
    }

    fn snapshot_into(
        &self,
        dir: &Path,
        prefix: &Path,
        files: &mut BTreeMap<PathBuf, ObjectId>,
    ) -> Result<()> {
        for entry in self.eligible_entries(dir)? {
            let path = dir.join(&entry.name);
            let rel = prefix.join(&entry.name);
            if entry.is_symlink() {
                continue;
            }
            if entry.is_dir() {
                self.snapshot_into(&path, &rel, files)?;
                continue;
            }
            match self.fs.read_file(&path) {
                Ok(data) => {
                    files.insert(rel, object::hash(ObjectKind::Blob, &data));
                }
                Err(e) => warn!("skipping unreadable {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}
