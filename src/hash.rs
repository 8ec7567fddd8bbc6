use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;

use crate::error::{Error, Result};

/// SHA-1 hash used for content addressing
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; 20]);

impl Hash {
    /// zero hash (useful as sentinel)
    pub const ZERO: Hash = Hash([0u8; 20]);

    /// create from raw bytes
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// parse from a 40-character lowercase hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != 40 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(Error::InvalidHash(s.to_string()));
        }
        let bytes = hex::decode(s).map_err(|_| Error::InvalidHash(s.to_string()))?;
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// get raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// split into path components for the object store
    /// returns (first 2 hex chars, remaining 38 hex chars)
    pub fn to_path_components(&self) -> (String, String) {
        let hex = self.to_hex();
        (hex[..2].to_string(), hex[2..].to_string())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..12])
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// frame a payload as `"<type> <len>\0<payload>"`
///
/// fails only when the type token is empty
pub fn frame(kind: &str, payload: &[u8]) -> Result<Vec<u8>> {
    if kind.is_empty() {
        return Err(Error::InvalidInput(
            "object type cannot be empty".to_string(),
        ));
    }
    let len = payload.len().to_string();
    let mut framed = Vec::with_capacity(kind.len() + len.len() + 2 + payload.len());
    framed.extend_from_slice(kind.as_bytes());
    framed.push(b' ');
    framed.extend_from_slice(len.as_bytes());
    framed.push(0);
    framed.extend_from_slice(payload);
    Ok(framed)
}

/// frame a payload and hash the framed form
///
/// the object's identity is always the hash of the framed (uncompressed)
/// bytes, never of the payload alone
pub fn frame_and_hash(kind: &str, payload: &[u8]) -> Result<(Vec<u8>, Hash)> {
    let framed = frame(kind, payload)?;
    let digest = Sha1::digest(&framed);
    Ok((framed, Hash(digest.into())))
}
