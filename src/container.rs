//! The on-wire/in-memory container: an opaque caller header, a method
//! matrix, a cumulative compressed-size matrix, and the concatenated
//! per-buffer payloads. Bit-exact with the layout documented in
//! `SPEC_FULL.md` §6.1.

use lebe::prelude::*;
use smallvec::SmallVec;

use crate::compression::StreamMethod;
use crate::config::BytesMode;
use crate::error::{Error, Result};
use crate::transpose;

/// Per-chunk metadata never holds more than 4 entries (`N` is always 2 or
/// 4), so it's kept inline rather than heap-allocated per chunk.
pub type MethodRow = SmallVec<[StreamMethod; 4]>;

/// Byte offset, within the header, of the 8-byte little-endian total
/// container length.
pub const TOTAL_LEN_OFFSET: usize = 24;

/// This crate's fixed header length. The format leaves the header's
/// internal layout to the caller (spec.md §6.1), but decompression still
/// needs to know where the header ends and the method matrix begins; since
/// the wire contract doesn't thread a header length through `decompress`,
/// this crate fixes it at the documented minimum (spec.md §3: "header
/// (≥32 bytes"), per the open question in `SPEC_FULL.md` §9 that such a
/// convention must be pinned down and documented separately. Callers who
/// need a larger opaque header must embed it outside this container and
/// pass only the trailing `HEADER_LEN` bytes plus everything after to
/// `decompress`.
pub const HEADER_LEN: usize = 32;

/// One chunk's worth of per-stream encode results, indexed by buffer `b`.
pub struct ChunkResult {
    pub methods: MethodRow,
    pub payloads: Vec<Vec<u8>>,
}

/// The uncompressed byte length of chunk `c`, given the total original
/// size `orig_size` split into chunks of `orig_chunk_size` (the last one
/// possibly shorter).
pub fn chunk_len(c: usize, num_chunks: usize, orig_chunk_size: usize, orig_size: usize) -> usize {
    if c + 1 < num_chunks {
        orig_chunk_size
    } else {
        orig_size - orig_chunk_size * (num_chunks - 1)
    }
}

pub fn num_chunks(orig_size: usize, orig_chunk_size: usize) -> usize {
    orig_size.div_ceil(orig_chunk_size.max(1))
}

/// Serializes `header` plus every chunk's encode results into a single
/// container buffer, writing the total length into `header[24..32]` of the
/// copy embedded in the output.
pub fn serialize(header: &[u8], bytes_mode: BytesMode, chunks: &[ChunkResult]) -> Result<Vec<u8>> {
    if header.len() != HEADER_LEN {
        return Err(Error::config(format!("header must be exactly {HEADER_LEN} bytes, got {}", header.len())));
    }

    let streams = bytes_mode.stream_count().as_usize();
    let num_chunks = chunks.len();

    for chunk in chunks {
        if chunk.methods.len() != streams || chunk.payloads.len() != streams {
            return Err(Error::config("chunk result does not carry one method/payload per stream"));
        }
    }

    let method_matrix_len = streams * num_chunks;
    let cumulative_matrix_len = streams * num_chunks * 8;
    let payload_len: usize = chunks.iter().map(|chunk| chunk.payloads.iter().map(Vec::len).sum::<usize>()).sum();

    let total_len = HEADER_LEN + method_matrix_len + cumulative_matrix_len + payload_len;

    let mut out = Vec::with_capacity(total_len);
    out.extend_from_slice(header);
    out[TOTAL_LEN_OFFSET..TOTAL_LEN_OFFSET + 8].copy_from_slice(&(total_len as u64).to_le_bytes());

    for b in 0..streams {
        for chunk in chunks {
            out.push(chunk.methods[b].as_byte());
        }
    }

    for b in 0..streams {
        let mut running: u64 = 0;
        for chunk in chunks {
            running += chunk.payloads[b].len() as u64;
            running.write(&mut out).map_err(Error::from)?;
        }
    }

    for b in 0..streams {
        for chunk in chunks {
            out.extend_from_slice(&chunk.payloads[b]);
        }
    }

    debug_assert_eq!(out.len(), total_len);
    Ok(out)
}

/// A fully parsed container: per-(buffer, chunk) methods, uncompressed
/// lengths, and borrowed payload slices, ready for the decompression
/// executor to dispatch.
pub struct ParsedContainer<'a> {
    pub num_chunks: usize,
    pub streams: usize,
    pub methods: Vec<Vec<StreamMethod>>,
    pub uncompressed_lens: Vec<Vec<usize>>,
    pub payloads: Vec<Vec<&'a [u8]>>,
}

pub fn parse<'a>(container: &'a [u8], bytes_mode: BytesMode, orig_chunk_size: usize, orig_size: usize) -> Result<ParsedContainer<'a>> {
    if container.len() < HEADER_LEN {
        return Err(Error::format("container shorter than the fixed header length"));
    }

    let declared_total = u64::from_le_bytes(
        container[TOTAL_LEN_OFFSET..TOTAL_LEN_OFFSET + 8]
            .try_into()
            .expect("8-byte slice"),
    ) as usize;
    if declared_total != container.len() {
        return Err(Error::format(format!(
            "header declares total length {declared_total}, container is {} bytes",
            container.len()
        )));
    }

    let streams = bytes_mode.stream_count().as_usize();
    let num_chunks = num_chunks(orig_size, orig_chunk_size);

    let method_matrix_offset = HEADER_LEN;
    let method_matrix_len = streams * num_chunks;
    let cumulative_offset = method_matrix_offset + method_matrix_len;
    let cumulative_len = streams * num_chunks * 8;
    let payload_offset = cumulative_offset + cumulative_len;

    if container.len() < payload_offset {
        return Err(Error::format("container too short for its declared method/cumulative-size tables"));
    }

    let mut methods = vec![Vec::with_capacity(num_chunks); streams];
    for (b, row) in methods.iter_mut().enumerate() {
        let base = method_matrix_offset + b * num_chunks;
        for c in 0..num_chunks {
            row.push(StreamMethod::from_byte(container[base + c])?);
        }
    }

    let mut cumulative = vec![vec![0u64; num_chunks]; streams];
    for (b, row) in cumulative.iter_mut().enumerate() {
        let base = cumulative_offset + b * num_chunks * 8;
        let mut reader = &container[base..base + num_chunks * 8];
        let mut previous = 0u64;
        for entry in row.iter_mut() {
            let value = u64::read_from_little_endian(&mut reader).map_err(Error::from)?;
            if value < previous {
                return Err(Error::format("cumulative compressed-size entries are not monotonically non-decreasing"));
            }
            previous = value;
            *entry = value;
        }
    }

    let mut uncompressed_lens = vec![Vec::with_capacity(num_chunks); streams];
    for b in 0..streams {
        for c in 0..num_chunks {
            let len = chunk_len(c, num_chunks, orig_chunk_size, orig_size);
            uncompressed_lens[b].push(transpose::stream_uncompressed_len(len, bytes_mode, b));
        }
    }

    let mut payloads = vec![Vec::with_capacity(num_chunks); streams];
    let mut buffer_base = payload_offset;
    for b in 0..streams {
        let mut previous = 0u64;
        for c in 0..num_chunks {
            let end = cumulative[b][c];
            let start = buffer_base + previous as usize;
            let slice_end = buffer_base + end as usize;
            if slice_end > container.len() {
                return Err(Error::format("payload slice extends past end of container"));
            }
            payloads[b].push(&container[start..slice_end]);
            previous = end;
        }
        buffer_base += previous as usize;
    }

    Ok(ParsedContainer { num_chunks, streams, methods, uncompressed_lens, payloads })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::StreamMethod;

    fn sample_header() -> Vec<u8> {
        vec![0xAB; HEADER_LEN]
    }

    #[test]
    fn round_trips_a_two_chunk_two_stream_container() {
        let header = sample_header();
        let bytes_mode = BytesMode::Split2;

        let chunks = vec![
            ChunkResult {
                methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Truncate],
                payloads: vec![vec![1, 2, 3], Vec::new()],
            },
            ChunkResult {
                methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Truncate],
                payloads: vec![vec![4, 5], Vec::new()],
            },
        ];

        let container = serialize(&header, bytes_mode, &chunks).unwrap();

        // orig_chunk_size/orig_size chosen so num_chunks matches the two ChunkResults above
        let parsed = parse(&container, bytes_mode, 6, 11).unwrap();
        assert_eq!(parsed.num_chunks, 2);
        assert_eq!(parsed.methods[0], vec![StreamMethod::Original, StreamMethod::Original]);
        assert_eq!(parsed.payloads[0][0], &[1, 2, 3]);
        assert_eq!(parsed.payloads[0][1], &[4, 5]);
    }

    #[test]
    fn total_length_header_field_matches_container_length() {
        let header = sample_header();
        let chunks = vec![ChunkResult { methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Original], payloads: vec![vec![9, 9], vec![8]] }];
        let container = serialize(&header, BytesMode::Split2, &chunks).unwrap();
        let total = u64::from_le_bytes(container[TOTAL_LEN_OFFSET..TOTAL_LEN_OFFSET + 8].try_into().unwrap());
        assert_eq!(total as usize, container.len());
    }

    #[test]
    fn rejects_reserved_method_byte() {
        let header = sample_header();
        let chunks = vec![ChunkResult { methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Original], payloads: vec![vec![1], vec![2]] }];
        let mut container = serialize(&header, BytesMode::Split2, &chunks).unwrap();
        container[HEADER_LEN] = 7; // corrupt the first method-matrix byte
        assert!(parse(&container, BytesMode::Split2, 2, 2).is_err());
    }

    #[test]
    fn rejects_non_monotonic_cumulative_sizes() {
        let header = sample_header();
        let chunks = vec![
            ChunkResult { methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Original], payloads: vec![vec![1, 2], vec![1]] },
            ChunkResult { methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Original], payloads: vec![vec![3, 4], vec![2]] },
        ];
        let mut container = serialize(&header, BytesMode::Split2, &chunks).unwrap();

        let cumulative_offset = HEADER_LEN + 2 /* streams */ * 2 /* chunks */;
        // zero out the second cumulative entry for buffer 0, making it smaller than the first
        for byte in &mut container[cumulative_offset + 8..cumulative_offset + 16] {
            *byte = 0;
        }

        assert!(parse(&container, BytesMode::Split2, 2, 4).is_err());
    }

    #[test]
    fn rejects_declared_length_mismatch() {
        let header = sample_header();
        let chunks = vec![ChunkResult { methods: smallvec::smallvec![StreamMethod::Original, StreamMethod::Original], payloads: vec![vec![1], vec![2]] }];
        let mut container = serialize(&header, BytesMode::Split2, &chunks).unwrap();
        container.push(0); // extra trailing byte not accounted for in header[24..32]
        assert!(parse(&container, BytesMode::Split2, 2, 2).is_err());
    }

    #[test]
    fn empty_input_produces_a_valid_empty_container() {
        let header = sample_header();
        let container = serialize(&header, BytesMode::Split2, &[]).unwrap();
        let parsed = parse(&container, BytesMode::Split2, 16, 0).unwrap();
        assert_eq!(parsed.num_chunks, 0);
    }
}
