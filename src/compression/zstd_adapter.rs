//! Thin wrapper around the real `zstd` crate, fulfilling the `ZSTD`
//! entropy-coder adapter slot. Unlike `HUFFMAN`/`FSE` (see sibling modules),
//! a production-grade Rust binding for this one already exists in this
//! crate's dependency neighborhood (used the same way by
//! `other_examples/manifests/keller-mark-blusc` and
//! `other_examples/manifests/cool-japan-oxiarc`), so there is no case for
//! reimplementing it.

use crate::error::{Error, Result};

pub fn compress(src: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::stream::encode_all(src, level).map_err(|error| Error::codec(format!("zstd compression failed: {error}")))
}

pub fn decompress(compressed: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut decompressed =
        zstd::stream::decode_all(compressed).map_err(|error| Error::codec(format!("zstd decompression failed: {error}")))?;

    if decompressed.len() != expected_len {
        return Err(Error::codec(format!(
            "zstd decompressed {} bytes, expected {}",
            decompressed.len(),
            expected_len
        )));
    }

    decompressed.truncate(expected_len);
    Ok(decompressed)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips() {
        let src = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let compressed = compress(&src, 1).unwrap();
        let restored = decompress(&compressed, src.len()).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn rejects_size_mismatch() {
        let src = b"hello world".repeat(10);
        let compressed = compress(&src, 1).unwrap();
        assert!(decompress(&compressed, src.len() + 1).is_err());
    }
}
