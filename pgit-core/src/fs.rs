//! Filesystem capability used by the object store, tree codec and ref store.
//!
//! Everything in the core touches disk through [`FileSystem`], so tests can
//! run against [`MemoryFs`] while the CLI uses [`OsFs`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// A symbolic link, never followed.
    Symlink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

/// Minimal set of filesystem operations the core relies on.
///
/// `write_file` creates missing parent directories. `list_entries` makes no
/// promise about ordering.
pub trait FileSystem {
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn remove_all(&self, path: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl FileSystem for OsFs {
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("non UTF-8 file name: {:?}", raw),
                    ))
                }
            };
            let file_type = entry.file_type()?;
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry { name, kind });
        }
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Write-then-rename so readers never observe a half-written file.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(contents)?;
        #[cfg(unix)]
        {
            // Temp files are created 0600; keep the target's mode or use 0644.
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(path)
                .map(|m| m.permissions().mode())
                .unwrap_or(0o644);
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(mode))?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let meta = fs::symlink_metadata(path)?;
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

/// In-memory filesystem for tests.
///
/// Paths are stored verbatim; callers should use absolute paths so parents
/// resolve consistently.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: RwLock<BTreeMap<PathBuf, Node>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file path currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let nodes = self.nodes.read().expect("lock poisoned");
        nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn insert_dirs(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            match nodes.get(ancestor) {
                Some(Node::Dir) => {}
                Some(Node::File(_)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{} is a file", ancestor.display()),
                    ))
                }
                None => {
                    nodes.insert(ancestor.to_path_buf(), Node::Dir);
                }
            }
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

impl FileSystem for MemoryFs {
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.nodes.read().expect("lock poisoned");
        match nodes.get(dir) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("{} is not a directory", dir.display()),
                ))
            }
            None => return Err(not_found(dir)),
        }

        let entries = nodes
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .filter_map(|(path, node)| {
                let name = path.file_name()?.to_str()?.to_string();
                let kind = match node {
                    Node::File(_) => EntryKind::File,
                    Node::Dir => EntryKind::Dir,
                };
                Some(DirEntry { name, kind })
            })
            .collect();
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let nodes = self.nodes.read().expect("lock poisoned");
        match nodes.get(path) {
            Some(Node::File(data)) => Ok(data.clone()),
            Some(Node::Dir) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        if let Some(Node::Dir) = nodes.get(path) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            Self::insert_dirs(&mut nodes, parent)?;
        }
        nodes.insert(path.to_path_buf(), Node::File(contents.to_vec()));
        Ok(())
    }

    fn remove_all(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        if !nodes.contains_key(path) {
            return Err(not_found(path));
        }
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes.write().expect("lock poisoned");
        Self::insert_dirs(&mut nodes, path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.nodes.read().expect("lock poisoned").contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(
            self.nodes.read().expect("lock poisoned").get(path),
            Some(Node::Dir)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_fs_write_creates_parents() {
        let fs = MemoryFs::new();
        fs.write_file(Path::new("/repo/a/b/c.txt"), b"hi").unwrap();

        assert!(fs.is_dir(Path::new("/repo/a/b")));
        assert!(fs.is_dir(Path::new("/repo")));
        assert_eq!(fs.read_file(Path::new("/repo/a/b/c.txt")).unwrap(), b"hi");
    }

    #[test]
    fn test_memory_fs_list_entries_is_one_level() {
        let fs = MemoryFs::new();
        fs.write_file(Path::new("/repo/top.txt"), b"1").unwrap();
        fs.write_file(Path::new("/repo/sub/nested.txt"), b"2").unwrap();

        let mut entries = fs.list_entries(Path::new("/repo")).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(
            entries,
            vec![
                DirEntry {
                    name: "sub".into(),
                    kind: EntryKind::Dir
                },
                DirEntry {
                    name: "top.txt".into(),
                    kind: EntryKind::File
                },
            ]
        );
    }

    #[test]
    fn test_memory_fs_remove_all_is_recursive() {
        let fs = MemoryFs::new();
        fs.write_file(Path::new("/repo/sub/a.txt"), b"a").unwrap();
        fs.write_file(Path::new("/repo/subway.txt"), b"b").unwrap();

        fs.remove_all(Path::new("/repo/sub")).unwrap();

        assert!(!fs.exists(Path::new("/repo/sub")));
        assert!(!fs.exists(Path::new("/repo/sub/a.txt")));
        assert!(fs.exists(Path::new("/repo/subway.txt")));
    }

    #[test]
    fn test_memory_fs_missing_file_is_not_found() {
        let fs = MemoryFs::new();
        let err = fs.read_file(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_os_fs_atomic_write_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let fs = OsFs;
        let path = temp_dir.path().join("nested").join("file.txt");

        fs.write_file(&path, b"first").unwrap();
        fs.write_file(&path, b"second").unwrap();

        assert_eq!(fs.read_file(&path).unwrap(), b"second");
        let entries = fs.list_entries(&temp_dir.path().join("nested")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "file.txt");
        assert_eq!(entries[0].kind, EntryKind::File);
    }

    #[test]
    fn test_os_fs_remove_all_handles_files_and_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let fs = OsFs;
        let file = temp_dir.path().join("f.txt");
        let dir = temp_dir.path().join("d");
        fs.write_file(&file, b"x").unwrap();
        fs.write_file(&dir.join("inner.txt"), b"y").unwrap();

        fs.remove_all(&file).unwrap();
        fs.remove_all(&dir).unwrap();

        assert!(!fs.exists(&file));
        assert!(!fs.exists(&dir));
    }

    #[cfg(unix)]
    #[test]
    fn test_os_fs_symlinks_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("keep.txt"), b"keep").unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let fs = OsFs;
        let entries = fs.list_entries(temp_dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_symlink());
        assert!(!entries[0].is_dir());

        fs.remove_all(&link).unwrap();
        assert!(!link.exists());
        assert!(outside.path().join("keep.txt").exists());
    }
}
