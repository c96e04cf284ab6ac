//! Repository-level operations built from the object store, tree codec,
//! ref store and commit graph.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::commit::{Commit, CommitGraph};
use crate::config::Config;
use crate::context::{branch_ref, tag_ref, RepoContext, HEAD, HEAD_ALIAS, HEADS_DIR, REFS_DIR};
use crate::diff::{diff_trees, FileDiff, TreeChange};
use crate::error::{Error, Result};
use crate::fs::{FileSystem, OsFs};
use crate::object::{Object, ObjectId, ObjectStore};
use crate::refs::{validate_name, Ref, RefStore};
use crate::tree::{Exclusions, TreeCodec};

/// Where HEAD currently points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HeadState {
    /// Attached to a branch; `oid` is `None` until the branch has a commit.
    Branch {
        name: String,
        oid: Option<ObjectId>,
    },
    Detached {
        oid: Option<ObjectId>,
    },
}

impl HeadState {
    pub fn oid(&self) -> Option<&ObjectId> {
        match self {
            HeadState::Branch { oid, .. } | HeadState::Detached { oid } => oid.as_ref(),
        }
    }

    pub fn branch(&self) -> Option<&str> {
        match self {
            HeadState::Branch { name, .. } => Some(name),
            HeadState::Detached { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub name: String,
    pub oid: Option<ObjectId>,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub head: HeadState,
    pub changes: Vec<TreeChange>,
}

impl Status {
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ShowReport {
    pub id: ObjectId,
    pub commit: Commit,
    pub changes: Vec<(TreeChange, FileDiff)>,
}

pub struct Repository<F: FileSystem = OsFs> {
    fs: F,
    ctx: RepoContext,
    config: Config,
}

impl<F: FileSystem> Repository<F> {
    /// Creates the control directory under `work_dir` with default settings.
    pub fn init(fs: F, work_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::init_with_config(fs, work_dir, Config::default())
    }

    pub fn init_with_config(fs: F, work_dir: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let ctx = RepoContext::new(work_dir);
        if fs.exists(ctx.control_dir()) {
            return Err(Error::AlreadyInitialized(ctx.control_dir().to_path_buf()));
        }
        validate_name(&config.default_branch)?;

        for dir in [ctx.objects_dir(), ctx.heads_dir(), ctx.tags_dir()] {
            fs.create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        config.save(&fs, &ctx.config_path())?;

        let repo = Self { fs, ctx, config };
        let branch = branch_ref(&repo.config.default_branch);
        let refs = repo.refs();
        refs.write_direct(&branch, None)?;
        refs.update_symbolic(HEAD, &branch)?;

        info!(
            "initialized repository at {} on branch {}",
            repo.ctx.control_dir().display(),
            repo.config.default_branch
        );
        Ok(repo)
    }

    /// Opens the repository whose work dir is exactly `work_dir`.
    pub fn open(fs: F, work_dir: impl Into<PathBuf>) -> Result<Self> {
        let ctx = RepoContext::new(work_dir);
        Self::with_context(fs, ctx)
    }

    /// Opens the nearest repository at or above `start`.
    pub fn discover(fs: F, start: &Path) -> Result<Self> {
        let ctx = RepoContext::discover(&fs, start)?;
        Self::with_context(fs, ctx)
    }

    fn with_context(fs: F, ctx: RepoContext) -> Result<Self> {
        if !fs.is_dir(ctx.control_dir()) {
            return Err(Error::Uninitialized(ctx.control_dir().to_path_buf()));
        }
        let config = Config::load(&fs, &ctx.config_path())?;
        Ok(Self { fs, ctx, config })
    }

    pub fn context(&self) -> &RepoContext {
        &self.ctx
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn objects(&self) -> ObjectStore<'_, F> {
        ObjectStore::new(&self.fs, self.ctx.objects_dir())
    }

    pub fn refs(&self) -> RefStore<'_, F> {
        RefStore::new(&self.fs, self.ctx.control_dir())
    }

    pub fn trees<'s>(&'s self, store: &'s ObjectStore<'s, F>) -> TreeCodec<'s, F> {
        TreeCodec::new(
            &self.fs,
            store,
            Exclusions::new(self.config.exclude.clone()),
        )
    }

    pub fn hash_object(&self, data: &[u8]) -> Result<ObjectId> {
        self.objects().put(data)
    }

    pub fn cat_file(&self, rev: &str) -> Result<(ObjectId, Object)> {
        let oid = self.resolve_revision(rev)?;
        let object = self.objects().get_object(&oid)?;
        Ok((oid, object))
    }

    /// Resolves `HEAD`/`@`, a branch, a tag, a full ref name, or an object id
    /// (full or abbreviated), in that order.
    pub fn resolve_revision(&self, rev: &str) -> Result<ObjectId> {
        let refs = self.refs();
        let unborn = || Error::not_found(format!("{} has no commits yet", rev));

        if rev == HEAD || rev == HEAD_ALIAS {
            return refs.resolve(HEAD)?.ok_or_else(unborn);
        }
        for name in [branch_ref(rev), tag_ref(rev)] {
            if refs.exists(&name) {
                return refs.resolve(&name)?.ok_or_else(unborn);
            }
        }
        if rev.starts_with(REFS_DIR) && refs.exists(rev) {
            return refs.resolve(rev)?.ok_or_else(unborn);
        }
        self.objects().resolve_prefix(rev)
    }

    pub fn head_state(&self) -> Result<HeadState> {
        let refs = self.refs();
        match refs.load(HEAD)? {
            Ref::Symbolic { target, .. } => {
                let oid = refs.resolve(HEAD)?;
                let prefix = format!("{}/{}/", REFS_DIR, HEADS_DIR);
                let name = target
                    .strip_prefix(&prefix)
                    .unwrap_or(&target)
                    .to_string();
                Ok(HeadState::Branch { name, oid })
            }
            Ref::Direct { oid, .. } => Ok(HeadState::Detached { oid }),
        }
    }

    /// Stores the working directory as a tree.
    pub fn write_tree(&self) -> Result<ObjectId> {
        self.write_tree_at(self.ctx.work_dir())
    }

    /// Stores the directory at `path` (relative paths start at the work dir).
    pub fn write_tree_at(&self, path: &Path) -> Result<ObjectId> {
        let path = self.ctx.work_dir().join(path);
        let store = self.objects();
        self.trees(&store).write_tree(&path)
    }

    /// Replaces the working directory with the contents of tree `oid`.
    pub fn read_tree(&self, oid: &ObjectId) -> Result<()> {
        let store = self.objects();
        let trees = self.trees(&store);
        trees.load(oid)?;
        trees.sweep(self.ctx.work_dir())?;
        trees.read_tree(oid, self.ctx.work_dir())
    }

    /// Snapshots the working directory and advances HEAD (or the branch it
    /// points at) to the new commit.
    pub fn commit(&self, message: &str) -> Result<ObjectId> {
        let store = self.objects();
        let tree = self.trees(&store).write_tree(self.ctx.work_dir())?;
        let refs = self.refs();
        let parent = refs.resolve(HEAD)?;

        let oid = CommitGraph::new(&store).create(message, &tree, parent.as_ref())?;
        refs.update(HEAD, &oid)?;
        info!("committed {} (tree {})", oid.short(), tree.short());
        Ok(oid)
    }

    /// Commits reachable from `rev` (default HEAD), newest first.
    pub fn log(&self, rev: Option<&str>, limit: Option<usize>) -> Result<Vec<(ObjectId, Commit)>> {
        let start = match rev {
            Some(rev) => Some(self.resolve_revision(rev)?),
            None => self.refs().resolve(HEAD)?,
        };
        let store = self.objects();
        let graph = CommitGraph::new(&store);
        let commits = graph
            .walk(start)
            .take(limit.unwrap_or(usize::MAX))
            .collect::<Result<Vec<_>>>()?;
        Ok(commits)
    }

    /// Checks out a branch (attaching HEAD) or any other revision (detaching HEAD).
    pub fn checkout(&self, target: &str) -> Result<HeadState> {
        let refs = self.refs();
        let branch = branch_ref(target);
        let (oid, attach) = if target != HEAD && target != HEAD_ALIAS && refs.exists(&branch) {
            (refs.resolve(&branch)?, Some(branch))
        } else {
            (Some(self.resolve_revision(target)?), None)
        };

        if let Some(oid) = &oid {
            let store = self.objects();
            let commit = CommitGraph::new(&store).parse(oid)?;
            self.read_tree(&commit.tree)?;
        }

        match &attach {
            Some(branch) => refs.update_symbolic(HEAD, branch)?,
            None => refs.write_direct(HEAD, oid.as_ref())?,
        }
        info!(
            "checked out {} ({})",
            target,
            if attach.is_some() { "attached" } else { "detached" }
        );
        self.head_state()
    }

    /// Creates branch `name` at `start` (default: HEAD's commit).
    pub fn create_branch(&self, name: &str, start: Option<&str>) -> Result<Option<ObjectId>> {
        validate_name(name)?;
        let refs = self.refs();
        let branch = branch_ref(name);
        if refs.exists(&branch) {
            return Err(Error::AlreadyExists(format!("branch {}", name)));
        }
        let oid = match start {
            Some(rev) => Some(self.resolve_commit(rev)?),
            None => refs.resolve(HEAD)?,
        };
        refs.write_direct(&branch, oid.as_ref())?;
        info!("created branch {}", name);
        Ok(oid)
    }

    pub fn branches(&self) -> Result<Vec<BranchInfo>> {
        let head = self.head_state()?;
        let current = head.branch();
        Ok(self
            .refs()
            .branches()?
            .into_iter()
            .map(|(name, oid)| BranchInfo {
                is_current: current == Some(name.as_str()),
                name,
                oid,
            })
            .collect())
    }

    /// Creates tag `name` at `rev` (default: HEAD's commit).
    pub fn create_tag(&self, name: &str, rev: Option<&str>) -> Result<ObjectId> {
        validate_name(name)?;
        let refs = self.refs();
        let tag = tag_ref(name);
        if refs.exists(&tag) {
            return Err(Error::AlreadyExists(format!("tag {}", name)));
        }
        let oid = self.resolve_revision(rev.unwrap_or(HEAD))?;
        refs.write_direct(&tag, Some(&oid))?;
        info!("created tag {} at {}", name, oid.short());
        Ok(oid)
    }

    pub fn tags(&self) -> Result<Vec<(String, Option<ObjectId>)>> {
        self.refs().tags()
    }

    /// Moves HEAD's branch (or detached HEAD) to `rev`; the working
    /// directory is left untouched.
    pub fn reset(&self, rev: &str) -> Result<ObjectId> {
        let oid = self.resolve_commit(rev)?;
        self.refs().update(HEAD, &oid)?;
        info!("reset HEAD to {}", oid.short());
        Ok(oid)
    }

    /// HEAD state plus working-directory changes relative to HEAD's tree.
    pub fn status(&self) -> Result<Status> {
        let head = self.head_state()?;
        let store = self.objects();
        let trees = self.trees(&store);
        let committed = match head.oid() {
            Some(oid) => trees.flatten(&CommitGraph::new(&store).parse(oid)?.tree)?,
            None => BTreeMap::new(),
        };
        let working = trees.snapshot(self.ctx.work_dir())?;
        Ok(Status {
            head,
            changes: diff_trees(&committed, &working),
        })
    }

    /// A commit and the line diffs it introduces over its parent.
    pub fn show(&self, rev: Option<&str>) -> Result<ShowReport> {
        let id = self.resolve_commit(rev.unwrap_or(HEAD))?;
        let store = self.objects();
        let graph = CommitGraph::new(&store);
        let trees = self.trees(&store);

        let commit = graph.parse(&id)?;
        let new = trees.flatten(&commit.tree)?;
        let old = match &commit.parent {
            Some(parent) => trees.flatten(&graph.parse(parent)?.tree)?,
            None => BTreeMap::new(),
        };

        let mut changes = Vec::new();
        for change in diff_trees(&old, &new) {
            let before = change.old.map(|oid| store.get(&oid)).transpose()?;
            let after = change.new.map(|oid| store.get(&oid)).transpose()?;
            let file_diff = FileDiff::from_blobs(
                change.path.display().to_string(),
                before.as_deref(),
                after.as_deref(),
            );
            changes.push((change, file_diff));
        }
        Ok(ShowReport {
            id,
            commit,
            changes,
        })
    }

    fn resolve_commit(&self, rev: &str) -> Result<ObjectId> {
        let oid = self.resolve_revision(rev)?;
        let store = self.objects();
        CommitGraph::new(&store).parse(&oid)?;
        Ok(oid)
    }
}
