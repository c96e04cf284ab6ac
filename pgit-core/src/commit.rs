use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::object::{ObjectId, ObjectKind, ObjectStore};

/// A snapshot: its tree, optional parent and message.
///
/// Encoded as `tree <id>\n[parent <id>\n]\n<message>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parent: Option<ObjectId>,
    pub message: String,
}

impl Commit {
    pub fn new(tree: ObjectId, message: impl Into<String>) -> Self {
        Self {
            tree,
            parent: None,
            message: message.into(),
        }
    }

    pub fn with_parent(mut self, parent: Option<ObjectId>) -> Self {
        self.parent = parent;
        self
    }

    pub fn encode(&self) -> String {
        let mut out = format!("tree {}\n", self.tree);
        if let Some(parent) = &self.parent {
            out.push_str(&format!("parent {}\n", parent));
        }
        out.push('\n');
        out.push_str(&self.message);
        out
    }

    pub fn parse(oid: &ObjectId, data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::corrupt_object(oid, "commit is not valid UTF-8"))?;
        let (headers, message) = text.split_once("\n\n").unwrap_or((text, ""));

        let mut tree = None;
        let mut parent = None;
        for line in headers.lines() {
            let (key, value) = line.split_once(' ').ok_or_else(|| {
                Error::corrupt_object(oid, format!("malformed header {:?}", line))
            })?;
            let id = value.trim().parse::<ObjectId>().map_err(|_| {
                Error::corrupt_object(oid, format!("bad {} id {:?}", key, value))
            })?;
            match key {
                "tree" => tree = Some(id),
                "parent" => parent = Some(id),
                other => {
                    return Err(Error::corrupt_object(
                        oid,
                        format!("unknown header {:?}", other),
                    ))
                }
            }
        }

        let tree = tree.ok_or_else(|| Error::corrupt_object(oid, "missing tree line"))?;
        Ok(Self {
            tree,
            parent,
            message: message.to_string(),
        })
    }

    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// Creates, reads and walks commits in an [`ObjectStore`].
pub struct CommitGraph<'a, F: FileSystem> {
    store: &'a ObjectStore<'a, F>,
}

impl<'a, F: FileSystem> CommitGraph<'a, F> {
    pub fn new(store: &'a ObjectStore<'a, F>) -> Self {
        Self { store }
    }

    /// Stores a new commit. `tree` must name a stored tree and `parent`, if
    /// any, a stored commit.
    pub fn create(
        &self,
        message: &str,
        tree: &ObjectId,
        parent: Option<&ObjectId>,
    ) -> Result<ObjectId> {
        self.store.get_kind(tree, ObjectKind::Tree)?;
        if let Some(parent) = parent {
            self.store.get_kind(parent, ObjectKind::Commit)?;
        }

        let commit = Commit::new(*tree, message).with_parent(parent.copied());
        let oid = self
            .store
            .put_object(ObjectKind::Commit, commit.encode().as_bytes())?;
        debug!(
            "created commit {} (tree {}, parent {:?})",
            oid.short(),
            tree.short(),
            parent.map(|p| p.short())
        );
        Ok(oid)
    }

    pub fn parse(&self, oid: &ObjectId) -> Result<Commit> {
        let data = self.store.get_kind(oid, ObjectKind::Commit)?;
        Commit::parse(oid, &data)
    }

    /// Lazily follows parent links from `start` down to the root commit.
    pub fn walk(&self, start: Option<ObjectId>) -> Walk<'_, 'a, F> {
        Walk {
            graph: self,
            next: start,
        }
    }
}

/// Iterator over a commit chain, newest first.
///
/// Each call to [`CommitGraph::walk`] starts a fresh, independent walk.
pub struct Walk<'g, 'a, F: FileSystem> {
    graph: &'g CommitGraph<'a, F>,
    next: Option<ObjectId>,
}

impl<'g, 'a, F: FileSystem> Iterator for Walk<'g, 'a, F> {
    type Item = Result<(ObjectId, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.next.take()?;
        match self.graph.parse(&oid) {
            Ok(commit) => {
                self.next = commit.parent;
                Some(Ok((oid, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
