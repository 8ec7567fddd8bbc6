use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::compress::{deflate, inflate};
use crate::error::{Error, IoResultExt, Result};
use crate::hash::{frame_and_hash, Hash};
use crate::repo::Repo;

/// the kinds of object the store holds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }
}

impl TryFrom<&str> for ObjectKind {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(Error::InvalidObjectType(other.to_string())),
        }
    }
}

/// a written (or deduplicated) object with its size accounting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub hash: Hash,
    /// framed (uncompressed) length
    pub size: u64,
    /// zlib stream length on disk
    pub compressed_size: u64,
}

/// filesystem path for an object hash
pub fn object_path(repo: &Repo, hash: &Hash) -> PathBuf {
    let (dir, file) = hash.to_path_components();
    repo.objects_path().join(dir).join(file)
}

/// check whether an object exists in the store
pub fn exists(repo: &Repo, hash: &Hash) -> bool {
    object_path(repo, hash).exists()
}

/// frame, hash, compress, and write an object
///
/// writing an existing hash is a no-op; fresh writes go through a temp file
/// and rename so readers never observe a truncated object
pub fn put(repo: &Repo, kind: ObjectKind, payload: &[u8]) -> Result<StoredObject> {
    let (framed, hash) = frame_and_hash(kind.as_str(), payload)?;
    let compressed = deflate(&framed)?;

    let stored = StoredObject {
        hash,
        size: framed.len() as u64,
        compressed_size: compressed.len() as u64,
    };

    let (dir_name, file_name) = hash.to_path_components();
    let object_dir = repo.objects_path().join(dir_name);
    let path = object_dir.join(file_name);

    // deduplication: content-addressed, so an existing file is the same object
    if path.exists() {
        debug!(hash = %hash, kind = kind.as_str(), "object already present");
        return Ok(stored);
    }

    fs::create_dir_all(&object_dir).with_path(&object_dir)?;

    let tmp_path = object_dir.join(uuid::Uuid::new_v4().to_string());
    {
        let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
        tmp_file.write_all(&compressed).with_path(&tmp_path)?;
        tmp_file.sync_all().with_path(&tmp_path)?;
    }
    fs::rename(&tmp_path, &path).with_path(&path)?;

    debug!(hash = %hash, kind = kind.as_str(), size = stored.size, "wrote object");
    Ok(stored)
}

/// read an object, returning its kind and raw payload with framing stripped
pub fn get(repo: &Repo, hash: &Hash) -> Result<(ObjectKind, Vec<u8>)> {
    let path = object_path(repo, hash);
    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*hash)
        } else {
            Error::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;

    let framed = inflate(&compressed).map_err(|_| Error::CorruptObject(*hash))?;
    let (kind, payload) = split_framed(&framed).ok_or(Error::CorruptObject(*hash))?;
    Ok((kind, payload.to_vec()))
}

/// size accounting for an existing object: (framed length, zlib length)
pub fn sizes(repo: &Repo, hash: &Hash) -> Result<(u64, u64)> {
    let path = object_path(repo, hash);
    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::ObjectNotFound(*hash)
        } else {
            Error::Io {
                path: path.clone(),
                source: e,
            }
        }
    })?;
    let framed = inflate(&compressed).map_err(|_| Error::CorruptObject(*hash))?;
    Ok((framed.len() as u64, compressed.len() as u64))
}

/// split framed bytes into kind and payload, verifying the declared length
fn split_framed(framed: &[u8]) -> Option<(ObjectKind, &[u8])> {
    let nul = framed.iter().position(|&b| b == 0)?;
    let header = std::str::from_utf8(&framed[..nul]).ok()?;
    let (kind_token, len_token) = header.split_once(' ')?;
    let kind = ObjectKind::try_from(kind_token).ok()?;
    let declared: usize = len_token.parse().ok()?;
    let payload = &framed[nul + 1..];
    if payload.len() != declared {
        return None;
    }
    Some((kind, payload))
}
