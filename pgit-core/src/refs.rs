//! Named pointers stored as files under the control directory.
//!
//! A ref file holds either a bare hex object id (direct; empty means unborn)
//! or `ref: <target> <- <name>` (symbolic). Ref names are paths relative to
//! the control directory, e.g. `HEAD` or `refs/heads/master`.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::context::{HEADS_DIR, REFS_DIR, TAGS_DIR};
use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::object::ObjectId;

pub const SYMBOLIC_MARKER: &str = "ref:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ref {
    /// Points straight at an object; `None` while the ref is unborn.
    Direct { name: String, oid: Option<ObjectId> },
    /// Points at another ref by name.
    Symbolic { name: String, target: String },
}

impl Ref {
    pub fn name(&self) -> &str {
        match self {
            Ref::Direct { name, .. } | Ref::Symbolic { name, .. } => name,
        }
    }

    pub fn oid(&self) -> Option<&ObjectId> {
        match self {
            Ref::Direct { oid, .. } => oid.as_ref(),
            Ref::Symbolic { .. } => None,
        }
    }

    pub fn is_symbolic(&self) -> bool {
        matches!(self, Ref::Symbolic { .. })
    }
}

/// Checks a branch or tag short name.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "HEAD"
        || name == "@"
        || name.starts_with(['-', '.', '/'])
        || name.ends_with(['/', '.'])
        || name.contains("..")
        || name.contains("//")
        || name.split('/').any(|part| part.starts_with('.'))
        || name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "~^:?*[\\".contains(c));
    if bad {
        return Err(Error::InvalidRefName(name.to_string()));
    }
    Ok(())
}

pub struct RefStore<'a, F: FileSystem> {
    fs: &'a F,
    root: PathBuf,
}

impl<'a, F: FileSystem> RefStore<'a, F> {
    /// `root` is the control directory every ref name is relative to.
    pub fn new(fs: &'a F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        let path = self.path(name);
        self.fs.exists(&path) && !self.fs.is_dir(&path)
    }

    /// Reads ref `name`. A missing file is an unborn direct ref.
    pub fn load(&self, name: &str) -> Result<Ref> {
        let path = self.path(name);
        if !self.fs.exists(&path) {
            return Ok(Ref::Direct {
                name: name.to_string(),
                oid: None,
            });
        }
        let raw = self.fs.read_file(&path).map_err(|e| Error::io(&path, e))?;
        parse_ref(name, &String::from_utf8_lossy(&raw))
    }

    /// Like [`load`](Self::load), but a missing file is [`Error::NotFound`].
    pub fn load_existing(&self, name: &str) -> Result<Ref> {
        if !self.exists(name) {
            return Err(Error::not_found(format!("ref {}", name)));
        }
        self.load(name)
    }

    /// Follows symbolic refs until a direct one is reached.
    pub fn resolve_symbolic(&self, reference: Ref) -> Result<Ref> {
        let mut visited = HashSet::new();
        let mut chain = vec![reference.name().to_string()];
        visited.insert(reference.name().to_string());

        let mut current = reference;
        loop {
            let target = match &current {
                Ref::Symbolic { target, .. } => target.clone(),
                Ref::Direct { .. } => break,
            };
            chain.push(target.clone());
            if !visited.insert(target.clone()) {
                return Err(Error::CyclicRef(chain));
            }
            current = self.load(&target)?;
        }
        Ok(current)
    }

    /// Object id `name` ultimately points at; `None` if unborn.
    pub fn resolve(&self, name: &str) -> Result<Option<ObjectId>> {
        let resolved = self.resolve_symbolic(self.load(name)?)?;
        Ok(resolved.oid().copied())
    }

    /// Points `name` at `oid`, writing through symbolic refs to the terminal ref.
    pub fn update(&self, name: &str, oid: &ObjectId) -> Result<()> {
        let terminal = self.resolve_symbolic(self.load(name)?)?;
        self.write_direct(terminal.name(), Some(oid))
    }

    /// Overwrites `name` itself with a direct pointer, never following it.
    pub fn write_direct(&self, name: &str, oid: Option<&ObjectId>) -> Result<()> {
        let path = self.path(name);
        let content = oid.map(|oid| format!("{}\n", oid)).unwrap_or_default();
        self.fs
            .write_file(&path, content.as_bytes())
            .map_err(|e| Error::io(&path, e))?;
        debug!(
            "{} -> {}",
            name,
            oid.map(|o| o.short()).unwrap_or_else(|| "(unborn)".into())
        );
        Ok(())
    }

    /// Rewrites `name` as a symbolic ref to `target`.
    pub fn update_symbolic(&self, name: &str, target: &str) -> Result<()> {
        if !is_contained(target) {
            return Err(Error::InvalidRefName(target.to_string()));
        }
        let path = self.path(name);
        let content = format!("{} {} <- {}\n", SYMBOLIC_MARKER, target, name);
        self.fs
            .write_file(&path, content.as_bytes())
            .map_err(|e| Error::io(&path, e))?;
        debug!("{} => {}", name, target);
        Ok(())
    }

    pub fn branches(&self) -> Result<Vec<(String, Option<ObjectId>)>> {
        self.list(&Path::new(REFS_DIR).join(HEADS_DIR))
    }

    pub fn tags(&self) -> Result<Vec<(String, Option<ObjectId>)>> {
        self.list(&Path::new(REFS_DIR).join(TAGS_DIR))
    }

    /// Short names and resolved ids of every ref under `dir`, sorted by name.
    fn list(&self, dir: &Path) -> Result<Vec<(String, Option<ObjectId>)>> {
        let mut names = Vec::new();
        let abs = self.root.join(dir);
        if self.fs.is_dir(&abs) {
            self.collect_names(&abs, "", &mut names)?;
        }
        names.sort();

        names
            .into_iter()
            .map(|short| {
                let full = format!("{}/{}", dir.display(), short);
                let oid = self.resolve(&full)?;
                Ok((short, oid))
            })
            .collect()
    }

    fn collect_names(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<()> {
        let entries = self.fs.list_entries(dir).map_err(|e| Error::io(dir, e))?;
        for entry in entries {
            let short = if prefix.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", prefix, entry.name)
            };
            if entry.is_dir() {
                self.collect_names(&dir.join(&entry.name), &short, out)?;
            } else {
                out.push(short);
            }
        }
        Ok(())
    }
}

/// True if `name` stays inside the control directory when joined onto it.
fn is_contained(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

fn parse_ref(name: &str, content: &str) -> Result<Ref> {
    let content = content.trim();
    if let Some(rest) = content.strip_prefix(SYMBOLIC_MARKER) {
        let target = rest
            .split_whitespace()
            .next()
            .ok_or_else(|| Error::corrupt_ref(name, "symbolic ref without a target"))?;
        if !is_contained(target) {
            return Err(Error::corrupt_ref(
                name,
                format!("target {:?} escapes the control directory", target),
            ));
        }
        return Ok(Ref::Symbolic {
            name: name.to_string(),
            target: target.to_string(),
        });
    }
    if content.is_empty() {
        return Ok(Ref::Direct {
            name: name.to_string(),
            oid: None,
        });
    }
    let oid = content
        .parse::<ObjectId>()
        .map_err(|_| Error::corrupt_ref(name, format!("invalid object id {:?}", content)))?;
    Ok(Ref::Direct {
        name: name.to_string(),
        oid: Some(oid),
    })
}
