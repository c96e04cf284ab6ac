//! Fixed layout of a repository's control directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::FileSystem;

pub const CONTROL_DIR: &str = ".pgit";
pub const OBJECTS_DIR: &str = "objects";
pub const REFS_DIR: &str = "refs";
pub const HEADS_DIR: &str = "heads";
pub const TAGS_DIR: &str = "tags";
pub const HEAD: &str = "HEAD";
pub const HEAD_ALIAS: &str = "@";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOCK_FILE: &str = "lock";

/// Paths of one repository, passed explicitly to every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    work_dir: PathBuf,
    control_dir: PathBuf,
}

impl RepoContext {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        let control_dir = work_dir.join(CONTROL_DIR);
        Self {
            work_dir,
            control_dir,
        }
    }

    /// Walks up from `start` until a directory containing the control dir is found.
    pub fn discover<F: FileSystem>(fs: &F, start: &Path) -> Result<Self> {
        start
            .ancestors()
            .find(|dir| fs.is_dir(&dir.join(CONTROL_DIR)))
            .map(Self::new)
            .ok_or_else(|| Error::Uninitialized(start.join(CONTROL_DIR)))
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn control_dir(&self) -> &Path {
        &self.control_dir
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.control_dir.join(OBJECTS_DIR)
    }

    pub fn heads_dir(&self) -> PathBuf {
        self.control_dir.join(REFS_DIR).join(HEADS_DIR)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.control_dir.join(REFS_DIR).join(TAGS_DIR)
    }

    pub fn head_path(&self) -> PathBuf {
        self.control_dir.join(HEAD)
    }

    pub fn config_path(&self) -> PathBuf {
        self.control_dir.join(CONFIG_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.control_dir.join(LOCK_FILE)
    }
}

/// Ref name of a branch, relative to the control dir.
pub fn branch_ref(name: &str) -> String {
    format!("{}/{}/{}", REFS_DIR, HEADS_DIR, name)
}

/// Ref name of a tag, relative to the control dir.
pub fn tag_ref(name: &str) -> String {
    format!("{}/{}/{}", REFS_DIR, TAGS_DIR, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    #[test]
    fn test_layout() {
        let ctx = RepoContext::new("/work");

        assert_eq!(ctx.control_dir(), Path::new("/work/.pgit"));
        assert_eq!(ctx.objects_dir(), PathBuf::from("/work/.pgit/objects"));
        assert_eq!(ctx.heads_dir(), PathBuf::from("/work/.pgit/refs/heads"));
        assert_eq!(ctx.tags_dir(), PathBuf::from("/work/.pgit/refs/tags"));
        assert_eq!(ctx.head_path(), PathBuf::from("/work/.pgit/HEAD"));
        assert_eq!(branch_ref("master"), "refs/heads/master");
        assert_eq!(tag_ref("v1"), "refs/tags/v1");
    }

    #[test]
    fn test_discover_walks_up() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/work/.pgit/objects")).unwrap();
        fs.create_dir_all(Path::new("/work/src/deep")).unwrap();

        let ctx = RepoContext::discover(&fs, Path::new("/work/src/deep")).unwrap();
        assert_eq!(ctx.work_dir(), Path::new("/work"));
    }

    #[test]
    fn test_discover_without_repo_is_uninitialized() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/elsewhere")).unwrap();

        let err = RepoContext::discover(&fs, Path::new("/elsewhere")).unwrap_err();
        assert!(matches!(err, Error::Uninitialized(_)));
    }
}
