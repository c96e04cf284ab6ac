use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not a pgit repository (no control directory at {0}); run 'pgit init' first")]
    Uninitialized(PathBuf),

    #[error("already initialized: {0}")]
    AlreadyInitialized(PathBuf),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("corrupt object {oid}: {reason}")]
    CorruptObject { oid: String, reason: String },

    #[error("corrupt ref {name}: {reason}")]
    CorruptRef { name: String, reason: String },

    #[error("symbolic ref cycle: {}", .0.join(" -> "))]
    CyclicRef(Vec<String>),

    #[error("object {oid} is a {actual}, expected a {expected}")]
    UnexpectedKind {
        oid: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("ambiguous object id {prefix}: {count} candidates")]
    AmbiguousObjectId { prefix: String, count: usize },

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("repository is locked by another pgit process")]
    Locked,

    #[error("I/O failure at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization failed: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt_object(oid: impl ToString, reason: impl Into<String>) -> Self {
        Self::CorruptObject {
            oid: oid.to_string(),
            reason: reason.into(),
        }
    }

    pub fn corrupt_ref(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptRef {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// True for errors that mean "the thing asked for does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_io_error_keeps_source() {
        let err = Error::io(
            "/repo/file.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(err.to_string(), "I/O failure at /repo/file.txt");
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "denied");
    }

    #[test]
    fn test_cyclic_ref_message() {
        let err = Error::CyclicRef(vec!["HEAD".into(), "refs/heads/a".into(), "HEAD".into()]);
        assert_eq!(
            err.to_string(),
            "symbolic ref cycle: HEAD -> refs/heads/a -> HEAD"
        );
    }
}
