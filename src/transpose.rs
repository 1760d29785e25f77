//! Byte transposition ("byte grouping"): splits a chunk into `N` per-byte-position
//! streams, so each stream holds only the bytes that shared the same lane
//! across every element — which, after [`crate::bits`] has clustered the
//! exponent bits, makes the exponent-lane stream extremely repetitive.

use crate::config::BytesMode;
use crate::error::{Error, Result};

impl BytesMode {
    /// Parses the raw wire-format mode code used by the container's callers
    /// (and, historically, by the reference implementation this format was
    /// modeled on). Reserved truncation variants for N=4 (41, 9, 1) are
    /// recognized but rejected, per the open question in the design notes:
    /// their split/combine behavior has no reference vector yet.
    pub fn from_raw(code: u16) -> Result<Self> {
        match code {
            10 => Ok(BytesMode::Split2),
            1 => Ok(BytesMode::TruncateLowByte),
            8 => Ok(BytesMode::TruncateHighByte),
            220 => Ok(BytesMode::Split4),
            41 | 9 => Err(Error::config(format!(
                "bytes_mode {code} is a reserved N=4 truncation variant with no reference vector; unsupported"
            ))),
            other => Err(Error::config(format!("unrecognized bytes_mode {other}"))),
        }
    }

    pub fn as_raw(self) -> u16 {
        match self {
            BytesMode::Split2 => 10,
            BytesMode::TruncateLowByte => 1,
            BytesMode::TruncateHighByte => 8,
            BytesMode::Split4 => 220,
        }
    }
}

/// Splits `chunk` into `N` streams according to `mode`. Truncating modes
/// produce an empty stream for every truncated lane.
pub fn transpose(chunk: &[u8], mode: BytesMode) -> Vec<Vec<u8>> {
    match mode {
        BytesMode::Split2 => {
            let mut even = Vec::with_capacity(chunk.len().div_ceil(2));
            let mut odd = Vec::with_capacity(chunk.len() / 2);
            for (index, &byte) in chunk.iter().enumerate() {
                if index % 2 == 0 { even.push(byte) } else { odd.push(byte) }
            }
            vec![even, odd]
        }
        BytesMode::TruncateLowByte => {
            let stream0 = chunk.iter().step_by(2).copied().collect();
            vec![stream0, Vec::new()]
        }
        BytesMode::TruncateHighByte => {
            let stream0 = chunk.iter().skip(1).step_by(2).copied().collect();
            vec![stream0, Vec::new()]
        }
        BytesMode::Split4 => {
            let mut streams: Vec<Vec<u8>> = (0..4)
                .map(|b| Vec::with_capacity(chunk.len() / 4 + 1))
                .collect();
            for (index, &byte) in chunk.iter().enumerate() {
                streams[index % 4].push(byte);
            }
            streams
        }
    }
}

/// Reconstructs a chunk of `original_len` bytes from its transposed streams.
/// Truncated lanes (empty streams for a truncating mode) are zero-filled.
pub fn inverse_transpose(streams: &[&[u8]], mode: BytesMode, original_len: usize) -> Result<Vec<u8>> {
    let mut chunk = vec![0u8; original_len];

    match mode {
        BytesMode::Split2 => {
            let (even, odd) = (streams[0], streams[1]);
            for (index, slot) in chunk.iter_mut().enumerate() {
                *slot = if index % 2 == 0 {
                    even[index / 2]
                } else {
                    odd[index / 2]
                };
            }
        }
        BytesMode::TruncateLowByte => {
            let kept = streams[0];
            for (pair_index, value) in kept.iter().enumerate() {
                chunk[pair_index * 2] = *value;
            }
            // odd positions stay zero
        }
        BytesMode::TruncateHighByte => {
            let kept = streams[0];
            for (pair_index, value) in kept.iter().enumerate() {
                chunk[pair_index * 2 + 1] = *value;
            }
            // even positions stay zero
        }
        BytesMode::Split4 => {
            for (index, slot) in chunk.iter_mut().enumerate() {
                let lane = index % 4;
                let position_in_lane = index / 4;
                *slot = *streams[lane].get(position_in_lane).ok_or_else(|| {
                    Error::format("transposed stream shorter than declared chunk length")
                })?;
            }
        }
    }

    Ok(chunk)
}

/// Uncompressed size `U(b,c)` of stream `b` for a chunk of `chunk_len` bytes,
/// without running the transpose — used by the container parser and the
/// decompression executor, which both need `U` before any bytes are decoded.
pub fn stream_uncompressed_len(chunk_len: usize, mode: BytesMode, stream: usize) -> usize {
    match mode {
        BytesMode::Split2 => {
            if stream == 0 { chunk_len.div_ceil(2) } else { chunk_len / 2 }
        }
        BytesMode::TruncateLowByte | BytesMode::TruncateHighByte => {
            if stream == 0 { chunk_len.div_ceil(2) } else { 0 }
        }
        BytesMode::Split4 => {
            let base = chunk_len / 4;
            let remainder = chunk_len % 4;
            base + usize::from(stream < remainder)
        }
    }
}
