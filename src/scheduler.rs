//! The compression chunk scheduler: splits input into fixed-size chunks,
//! runs each chunk through permute → transpose → select/encode, and
//! collects per-chunk, per-stream results for the container serializer.
//!
//! Dispatch uses rayon's work-stealing scheduler (the `rayon` feature):
//! each chunk is an independent unit of work pulled off rayon's internal
//! deque as a worker goes idle, which is the "shared, wait-free,
//! fetch-and-advance" model the design calls for, expressed through the
//! teacher's own parallelism dependency rather than a hand-rolled atomic
//! counter. Chunk index still determines total order: every chunk is
//! processed independently of every other, so the result is identical
//! regardless of which worker completes which chunk first.

use crate::bits::{self, ElementWidth};
use crate::compression::{self, StreamMethod};
use crate::config::{CompressionOptions, Method};
use crate::container::{self, ChunkResult, MethodRow};
use crate::error::Result;
use crate::selector;
use crate::transpose;

pub fn run(header: &[u8], data: &[u8], options: &CompressionOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let num_chunks = container::num_chunks(data.len(), options.orig_chunk_size);
    log::debug!("compressing {} bytes into {num_chunks} chunks of {} bytes with {} threads", data.len(), options.orig_chunk_size, options.threads);

    let chunk_results = dispatch(data, options)?;
    debug_assert_eq!(chunk_results.len(), num_chunks);

    container::serialize(header, options.streams, &chunk_results)
}

fn process_chunk(chunk: &[u8], options: &CompressionOptions, skip_streams: &[bool]) -> Result<ChunkResult> {
    let mut owned_permuted;
    let permuted: &[u8] = if options.bits_mode.is_enabled() {
        owned_permuted = chunk.to_vec();
        bits::permute_chunk(&mut owned_permuted, ElementWidth::from_bytes_mode(options.streams));
        &owned_permuted
    } else {
        chunk
    };

    let streams = transpose::transpose(permuted, options.streams);

    let mut methods: MethodRow = MethodRow::with_capacity(streams.len());
    let mut payloads = Vec::with_capacity(streams.len());

    for (stream_index, stream) in streams.iter().enumerate() {
        if skip_streams.get(stream_index).copied().unwrap_or(false) {
            methods.push(StreamMethod::Original);
            payloads.push(stream.clone());
            continue;
        }

        let requested = match options.method {
            Method::Auto => selector::select(stream),
            explicit => StreamMethod::from(explicit),
        };

        if options.method != Method::Auto {
            log::trace!("chunk stream requested explicit method {requested:?}");
        }

        let (method, payload) = compression::encode_stream(stream, requested, options.comp_threshold, options.zstd_level)?;
        methods.push(method);
        payloads.push(payload);
    }

    Ok(ChunkResult { methods, payloads })
}

/// Number of leading chunks (by ordinal) the early-abort heuristic samples
/// before it may start forcing a stream straight to ORIGINAL. Depends only
/// on `num_chunks` and the configured percentage, never on processing order
/// or timing, so the decision it produces is identical regardless of thread
/// count.
fn calibration_chunk_count(num_chunks: usize, percent: u8) -> usize {
    (num_chunks * percent as usize) / 100
}

/// Runs the early-abort calibration pass: processes the first
/// `calibration_chunk_count` chunks sequentially and, for any stream whose
/// cumulative `compressed / uncompressed` ratio across that prefix exceeds
/// `comp_threshold`, marks it to be stored directly (no entropy coding) for
/// every remaining chunk. A no-op (empty calibration results, all-`false`
/// skip list) when `check_threshold_after_percent` is `0`.
fn calibrate(data: &[u8], options: &CompressionOptions, num_chunks: usize, num_streams: usize) -> Result<(Vec<ChunkResult>, Vec<bool>)> {
    let calibration_len = calibration_chunk_count(num_chunks, options.check_threshold_after_percent);
    let mut skip_streams = vec![false; num_streams];

    if calibration_len == 0 {
        return Ok((Vec::new(), skip_streams));
    }

    let mut compressed_totals = vec![0u64; num_streams];
    let mut uncompressed_totals = vec![0u64; num_streams];
    let mut results = Vec::with_capacity(calibration_len);

    for chunk in data.chunks(options.orig_chunk_size).take(calibration_len) {
        let result = process_chunk(chunk, options, &skip_streams)?;
        for (stream_index, payload) in result.payloads.iter().enumerate() {
            compressed_totals[stream_index] += payload.len() as u64;
            uncompressed_totals[stream_index] += transpose::stream_uncompressed_len(chunk.len(), options.streams, stream_index) as u64;
        }
        results.push(result);
    }

    for stream_index in 0..num_streams {
        if uncompressed_totals[stream_index] > 0 {
            let ratio = compressed_totals[stream_index] as f32 / uncompressed_totals[stream_index] as f32;
            skip_streams[stream_index] = ratio > options.comp_threshold;
        }
    }

    log::debug!("early-abort calibration over first {calibration_len} chunks: skip_streams={skip_streams:?}");
    Ok((results, skip_streams))
}

#[cfg(feature = "rayon")]
fn dispatch(data: &[u8], options: &CompressionOptions) -> Result<Vec<ChunkResult>> {
    use rayon::prelude::*;

    let num_chunks = container::num_chunks(data.len(), options.orig_chunk_size);
    let num_streams = options.streams.stream_count().as_usize();
    let (mut results, skip_streams) = calibrate(data, options, num_chunks, num_streams)?;
    let calibration_len = results.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|error| crate::error::Error::worker(format!("failed to build compression thread pool: {error}")))?;

    let remaining: Vec<&[u8]> = data.chunks(options.orig_chunk_size).skip(calibration_len).collect();
    let remaining_results = pool.install(|| remaining.into_par_iter().map(|chunk| process_chunk(chunk, options, &skip_streams)).collect::<Result<Vec<_>>>())?;

    results.extend(remaining_results);
    Ok(results)
}

#[cfg(not(feature = "rayon"))]
fn dispatch(data: &[u8], options: &CompressionOptions) -> Result<Vec<ChunkResult>> {
    let num_chunks = container::num_chunks(data.len(), options.orig_chunk_size);
    let num_streams = options.streams.stream_count().as_usize();
    let (mut results, skip_streams) = calibrate(data, options, num_chunks, num_streams)?;
    let calibration_len = results.len();

    for chunk in data.chunks(options.orig_chunk_size).skip(calibration_len) {
        results.push(process_chunk(chunk, options, &skip_streams)?);
    }

    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::BytesMode;

    #[test]
    fn empty_input_yields_zero_chunks() {
        let options = CompressionOptions::new(BytesMode::Split2, 16);
        let results = dispatch(&[], &options).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn chunks_input_at_the_configured_boundary() {
        let options = CompressionOptions::new(BytesMode::Split4, 4);
        let data: Vec<u8> = (0u8..10).collect();
        let results = dispatch(&data, &options).unwrap();
        assert_eq!(results.len(), 3); // 4, 4, 2
    }

    #[test]
    fn zero_percent_disables_early_abort_calibration() {
        let options = CompressionOptions::new(BytesMode::Split4, 4);
        let data: Vec<u8> = (0u8..40).collect();
        let (results, skip_streams) = calibrate(&data, &options, 10, 4).unwrap();
        assert!(results.is_empty());
        assert!(skip_streams.iter().all(|&skip| !skip));
    }

    #[test]
    fn early_abort_calibration_marks_incompressible_streams_to_skip() {
        let options = CompressionOptions::new(BytesMode::Split4, 4)
            .with_method(Method::Huffman)
            .with_comp_threshold(0.01)
            .with_check_threshold_after_percent(50);
        let data: Vec<u8> = (0u8..40).collect();

        let (results, skip_streams) = calibrate(&data, &options, 10, 4).unwrap();
        assert_eq!(results.len(), 5); // 50% of 10 chunks
        assert!(skip_streams.iter().all(|&skip| skip), "every stream's ratio is 1.0, well above the 0.01 threshold");
    }

    #[test]
    fn skipped_streams_store_directly_without_running_the_selector() {
        let options = CompressionOptions::new(BytesMode::Split4, 4)
            .with_method(Method::Huffman)
            .with_comp_threshold(0.01)
            .with_check_threshold_after_percent(50);
        let data: Vec<u8> = (0u8..40).collect();

        let results = dispatch(&data, &options).unwrap();
        for result in &results[5..] {
            assert!(result.methods.iter().all(|&method| method == StreamMethod::Original));
        }
    }
}
