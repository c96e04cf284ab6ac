//! Content-addressed object store.
//!
//! Objects are stored in a flat directory, one file per object, named by the
//! hex SHA-256 of the object's canonical encoding `<kind>\0<payload>`.
//!
//! Only blob files carry the `blob\0` header on disk. Tree and commit files
//! hold their plain text payload; their kind is recovered by matching the
//! file against its id.

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fs::FileSystem;

/// Separates the kind header from the payload in an encoded object.
pub const MARKER: u8 = 0;

/// Shortest prefix accepted when looking up abbreviated ids.
pub const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form for display.
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(8);
        hex
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidObjectId(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(ObjectKind::Blob),
            "tree" => Some(ObjectKind::Tree),
            "commit" => Some(ObjectKind::Commit),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded object: its kind and raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl Object {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Canonical byte encoding: kind name, marker, payload.
    pub fn encode(&self) -> Vec<u8> {
        encode(self.kind, &self.data)
    }

    pub fn id(&self) -> ObjectId {
        hash(self.kind, &self.data)
    }

    /// Fails with [`Error::UnexpectedKind`] unless the object is `expected`.
    pub fn expect_kind(self, oid: &ObjectId, expected: ObjectKind) -> Result<Self> {
        if self.kind != expected {
            return Err(Error::UnexpectedKind {
                oid: oid.to_string(),
                expected: expected.as_str(),
                actual: self.kind.as_str(),
            });
        }
        Ok(self)
    }
}

/// Canonical encoding `<kind>\0<payload>`, the bytes an id is computed over.
pub fn encode(kind: ObjectKind, data: &[u8]) -> Vec<u8> {
    let header = kind.as_str().as_bytes();
    let mut buf = Vec::with_capacity(header.len() + 1 + data.len());
    buf.extend_from_slice(header);
    buf.push(MARKER);
    buf.extend_from_slice(data);
    buf
}

pub fn hash(kind: ObjectKind, data: &[u8]) -> ObjectId {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([MARKER]);
    hasher.update(data);
    ObjectId(hasher.finalize().into())
}

/// Bytes written to an object file: the canonical encoding for blobs, the
/// bare payload for trees and commits.
pub fn stored_form(kind: ObjectKind, data: &[u8]) -> Vec<u8> {
    match kind {
        ObjectKind::Blob => encode(kind, data),
        ObjectKind::Tree | ObjectKind::Commit => data.to_vec(),
    }
}

fn blob_header() -> Vec<u8> {
    let mut header = ObjectKind::Blob.as_str().as_bytes().to_vec();
    header.push(MARKER);
    header
}

/// Splits an object file into its kind and payload.
///
/// A file starting with `blob\0` is a blob and everything after that first
/// marker is payload. Further marker bytes are accepted rather than rejected,
/// since binary blob contents routinely contain NUL. Any other file must be a
/// tree or commit payload whose canonical encoding hashes to `oid`.
pub fn decode<'a>(oid: &ObjectId, stored: &'a [u8]) -> Result<(ObjectKind, &'a [u8])> {
    if let Some(payload) = stored.strip_prefix(blob_header().as_slice()) {
        return Ok((ObjectKind::Blob, payload));
    }
    [ObjectKind::Tree, ObjectKind::Commit]
        .into_iter()
        .find(|kind| hash(*kind, stored) == *oid)
        .map(|kind| (kind, stored))
        .ok_or_else(|| {
            Error::corrupt_object(oid, "not a blob, and no tree or commit hashes to this id")
        })
}

pub struct ObjectStore<'a, F: FileSystem> {
    fs: &'a F,
    dir: PathBuf,
}

impl<'a, F: FileSystem> ObjectStore<'a, F> {
    pub fn new(fs: &'a F, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_initialized(&self) -> Result<()> {
        if !self.fs.is_dir(&self.dir) {
            return Err(Error::Uninitialized(self.dir.clone()));
        }
        Ok(())
    }

    fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.dir.join(oid.to_hex())
    }

    /// Stores `payload` as a blob.
    pub fn put(&self, payload: &[u8]) -> Result<ObjectId> {
        self.put_object(ObjectKind::Blob, payload)
    }

    /// Stores a payload of the given kind. Writing existing content is a no-op.
    pub fn put_object(&self, kind: ObjectKind, payload: &[u8]) -> Result<ObjectId> {
        self.ensure_initialized()?;
        let oid = hash(kind, payload);
        let path = self.object_path(&oid);
        if self.fs.exists(&path) {
            debug!("{} {} already stored", kind, oid.short());
            return Ok(oid);
        }
        self.fs
            .write_file(&path, &stored_form(kind, payload))
            .map_err(|e| Error::io(&path, e))?;
        debug!("stored {} {} ({} bytes)", kind, oid.short(), payload.len());
        Ok(oid)
    }

    /// Payload of the object `oid`, whatever its kind.
    pub fn get(&self, oid: &ObjectId) -> Result<Vec<u8>> {
        Ok(self.get_object(oid)?.data)
    }

    pub fn get_object(&self, oid: &ObjectId) -> Result<Object> {
        self.ensure_initialized()?;
        let path = self.object_path(oid);
        if !self.fs.exists(&path) {
            return Err(Error::not_found(format!("object {}", oid)));
        }
        let encoded = self.fs.read_file(&path).map_err(|e| Error::io(&path, e))?;
        let (kind, data) = decode(oid, &encoded)?;
        Ok(Object::new(kind, data.to_vec()))
    }

    /// Payload of `oid`, which must be of kind `expected`.
    pub fn get_kind(&self, oid: &ObjectId, expected: ObjectKind) -> Result<Vec<u8>> {
        Ok(self.get_object(oid)?.expect_kind(oid, expected)?.data)
    }

    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.fs.exists(&self.object_path(oid))
    }

    /// Resolves a full id or a unique abbreviated hex prefix to a stored object.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<ObjectId> {
        self.ensure_initialized()?;
        let prefix = prefix.to_ascii_lowercase();
        if let Ok(oid) = prefix.parse::<ObjectId>() {
            return if self.contains(&oid) {
                Ok(oid)
            } else {
                Err(Error::not_found(format!("object {}", oid)))
            };
        }
        if prefix.len() < MIN_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidObjectId(prefix));
        }

        let entries = self
            .fs
            .list_entries(&self.dir)
            .map_err(|e| Error::io(&self.dir, e))?;
        let matches: Vec<&str> = entries
            .iter()
            .filter(|entry| !entry.is_dir() && entry.name.starts_with(&prefix))
            .map(|entry| entry.name.as_str())
            .collect();

        match matches.as_slice() {
            [] => Err(Error::not_found(format!("object {}", prefix))),
            [single] => single.parse(),
            many => Err(Error::AmbiguousObjectId {
                prefix,
                count: many.len(),
            }),
        }
    }
}
