//! The entropy-coder adapter: a uniform interface over the five ways a
//! stream can be stored in the container, plus the post-encode threshold
//! check that guarantees the container never inflates a stream beyond
//! `compThreshold`.

mod fse;
mod huffman;
mod zstd_adapter;

use crate::config::Method;
use crate::error::{Error, Result};

/// The method a single stream of a single chunk was encoded with, exactly
/// as recorded in the container's method matrix. `Auto` (spec.md's request-time
/// sentinel) never appears here — it's resolved to a concrete method by the
/// selector before a stream is ever encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMethod {
    Original = 0,
    Huffman = 1,
    Zstd = 2,
    Fse = 3,
    Truncate = 4,
}

impl StreamMethod {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(StreamMethod::Original),
            1 => Ok(StreamMethod::Huffman),
            2 => Ok(StreamMethod::Zstd),
            3 => Ok(StreamMethod::Fse),
            4 => Ok(StreamMethod::Truncate),
            other => Err(Error::config(format!("reserved method byte {other} in container"))),
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl From<Method> for StreamMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Auto => unreachable!("Auto must be resolved by the selector before encoding"),
            Method::Huffman => StreamMethod::Huffman,
            Method::Zstd => StreamMethod::Zstd,
            Method::Fse => StreamMethod::Fse,
        }
    }
}

/// Either owned, freshly decoded bytes, or a borrowed view into the
/// container/caller buffer. Only `Owned` is ever dropped as a heap
/// allocation; `Borrowed` is never freed by this crate, per the ownership
/// rule in the data model.
pub enum StreamBuffer<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a [u8]),
}

impl<'a> StreamBuffer<'a> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            StreamBuffer::Owned(bytes) => bytes,
            StreamBuffer::Borrowed(bytes) => bytes,
        }
    }

    pub fn into_owned(self) -> Vec<u8> {
        match self {
            StreamBuffer::Owned(bytes) => bytes,
            StreamBuffer::Borrowed(bytes) => bytes.to_vec(),
        }
    }
}

/// Encodes `uncompressed` with `requested`, then applies the containment
/// check: if the result isn't smaller than `uncompressed.len() * comp_threshold`,
/// the stream is rewritten as `ORIGINAL` instead. Returns the method that was
/// actually recorded, and the bytes to store for it (empty for `TRUNCATE`).
pub fn encode_stream(uncompressed: &[u8], requested: StreamMethod, comp_threshold: f32, zstd_level: i32) -> Result<(StreamMethod, Vec<u8>)> {
    let encoded = match requested {
        StreamMethod::Original => uncompressed.to_vec(),
        StreamMethod::Truncate => {
            if uncompressed.iter().any(|&byte| byte != 0) {
                return Err(Error::config("TRUNCATE requested for a stream with nonzero bytes"));
            }
            return Ok((StreamMethod::Truncate, Vec::new()));
        }
        StreamMethod::Huffman => huffman::compress(uncompressed)?,
        StreamMethod::Zstd => zstd_adapter::compress(uncompressed, zstd_level)?,
        StreamMethod::Fse => fse::compress(uncompressed)?,
    };

    if requested == StreamMethod::Original {
        return Ok((StreamMethod::Original, encoded));
    }

    let threshold_bytes = (uncompressed.len() as f32 * comp_threshold).ceil() as usize;
    if encoded.len() >= threshold_bytes {
        Ok((StreamMethod::Original, uncompressed.to_vec()))
    } else {
        Ok((requested, encoded))
    }
}

/// Decodes a stream according to its recorded method, returning a view that
/// avoids copying for `ORIGINAL` streams aliasing the container.
pub fn decode_stream<'a>(compressed: &'a [u8], method: StreamMethod, uncompressed_len: usize) -> Result<StreamBuffer<'a>> {
    match method {
        StreamMethod::Original => {
            if compressed.len() != uncompressed_len {
                return Err(Error::format(format!(
                    "ORIGINAL stream has {} bytes, expected {}",
                    compressed.len(),
                    uncompressed_len
                )));
            }
            Ok(StreamBuffer::Borrowed(compressed))
        }
        StreamMethod::Truncate => Ok(StreamBuffer::Owned(vec![0u8; uncompressed_len])),
        StreamMethod::Huffman => Ok(StreamBuffer::Owned(huffman::decompress(compressed, uncompressed_len)?)),
        StreamMethod::Zstd => Ok(StreamBuffer::Owned(zstd_adapter::decompress(compressed, uncompressed_len)?)),
        StreamMethod::Fse => Ok(StreamBuffer::Owned(fse::decompress(compressed, uncompressed_len)?)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn all_zero_stream_always_truncates_under_auto() {
        let zeros = vec![0u8; 64];
        let (method, payload) = encode_stream(&zeros, StreamMethod::Truncate, 1.0, 1).unwrap();
        assert_eq!(method, StreamMethod::Truncate);
        assert!(payload.is_empty());
    }

    #[test]
    fn falls_back_to_original_when_not_beneficial() {
        // incompressible random-looking bytes; huffman/fse headers alone exceed the input
        let src: Vec<u8> = (0u8..16).collect();
        let (method, payload) = encode_stream(&src, StreamMethod::Huffman, 1.0, 1).unwrap();
        assert_eq!(method, StreamMethod::Original);
        assert_eq!(payload, src);
    }

    #[test]
    fn round_trips_through_each_method() {
        let src: Vec<u8> = (0..2000).map(|i| (i % 7) as u8).collect();
        for requested in [StreamMethod::Huffman, StreamMethod::Zstd, StreamMethod::Fse, StreamMethod::Original] {
            let (method, payload) = encode_stream(&src, requested, 1.0, 1).unwrap();
            let decoded = decode_stream(&payload, method, src.len()).unwrap();
            assert_eq!(decoded.as_slice(), src.as_slice());
        }
    }

    #[test]
    fn method_byte_round_trips() {
        for method in [StreamMethod::Original, StreamMethod::Huffman, StreamMethod::Zstd, StreamMethod::Fse, StreamMethod::Truncate] {
            assert_eq!(StreamMethod::from_byte(method.as_byte()).unwrap(), method);
        }
        assert!(StreamMethod::from_byte(5).is_err());
    }
}
