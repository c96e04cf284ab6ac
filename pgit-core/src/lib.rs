//! # pgit-core
//!
//! Core library for pgit - a content-addressed object store, directory tree
//! codec, ref resolution and a linear commit graph.
//!
//! Everything goes through the [`FileSystem`] trait, so the same code runs
//! against the real disk ([`OsFs`]) or an in-memory tree ([`MemoryFs`]).

pub mod commit;
pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod fs;
pub mod lock;
pub mod object;
pub mod refs;
pub mod repo;
pub mod tree;

pub use commit::{Commit, CommitGraph, Walk};
pub use config::Config;
pub use context::RepoContext;
pub use diff::{ChangeType, FileDiff, TreeChange};
pub use error::{Error, Result};
pub use fs::{FileSystem, MemoryFs, OsFs};
pub use lock::RepoLock;
pub use object::{Object, ObjectId, ObjectKind, ObjectStore};
pub use refs::{Ref, RefStore};
pub use repo::{BranchInfo, HeadState, Repository, ShowReport, Status};
pub use tree::{Exclusions, Tree, TreeCodec, TreeEntry};
