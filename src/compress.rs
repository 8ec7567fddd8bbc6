use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// zlib-compress bytes at the default level
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(|source| Error::Io {
        path: "<deflate>".into(),
        source,
    })?;
    encoder.finish().map_err(|source| Error::Io {
        path: "<deflate>".into(),
        source,
    })
}

/// decompress a zlib stream
///
/// malformed input is a corrupt-object condition, not an io failure
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::CorruptObjectMessage(format!("zlib inflate failed: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_inflate_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let compressed = deflate(data).unwrap();
        let restored = inflate(&compressed).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn test_roundtrip_empty() {
        let compressed = deflate(b"").unwrap();
        assert_eq!(inflate(&compressed).unwrap(), b"");
    }

    #[test]
    fn test_roundtrip_binary() {
        let data: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let compressed = deflate(&data).unwrap();
        assert_eq!(inflate(&compressed).unwrap(), data);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        let result = inflate(b"definitely not a zlib stream");
        assert!(matches!(result, Err(Error::CorruptObjectMessage(_))));
    }

    #[test]
    fn test_inflate_rejects_truncated() {
        let compressed = deflate(b"some content that compresses").unwrap();
        let result = inflate(&compressed[..compressed.len() / 2]);
        assert!(result.is_err());
    }
}
