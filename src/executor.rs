//! The decompression executor: parses the container, then for each chunk
//! decodes every stream, inverse-transposes it directly into the output
//! buffer at its chunk offset, and inverse-permutes bits in place if
//! enabled. Mirrors `scheduler`'s rayon-based dispatch.

use crate::bits::{self, ElementWidth};
use crate::compression::{self, StreamBuffer};
use crate::config::DecompressionOptions;
use crate::container::{self, ParsedContainer};
use crate::error::Result;
use crate::transpose;

pub fn run(container: &[u8], options: &DecompressionOptions) -> Result<Vec<u8>> {
    options.validate()?;

    let parsed = container::parse(container, options.streams, options.orig_chunk_size, options.orig_size)?;
    log::debug!("decompressing {} chunks into {} bytes with {} threads", parsed.num_chunks, options.orig_size, options.threads);

    let mut output = vec![0u8; options.orig_size];
    dispatch(&mut output, &parsed, options)?;
    Ok(output)
}

fn decode_chunk(chunk_output: &mut [u8], chunk_index: usize, parsed: &ParsedContainer<'_>, options: &DecompressionOptions) -> Result<()> {
    let mut buffers: Vec<StreamBuffer<'_>> = Vec::with_capacity(parsed.streams);
    for b in 0..parsed.streams {
        let method = parsed.methods[b][chunk_index];
        let uncompressed_len = parsed.uncompressed_lens[b][chunk_index];
        let compressed = parsed.payloads[b][chunk_index];
        buffers.push(compression::decode_stream(compressed, method, uncompressed_len)?);
    }

    let slices: Vec<&[u8]> = buffers.iter().map(StreamBuffer::as_slice).collect();
    let restored = transpose::inverse_transpose(&slices, options.streams, chunk_output.len())?;
    chunk_output.copy_from_slice(&restored);

    if options.bits_mode.is_enabled() {
        bits::inverse_permute_chunk(chunk_output, ElementWidth::from_bytes_mode(options.streams));
    }

    Ok(())
}

#[cfg(feature = "rayon")]
fn dispatch(output: &mut [u8], parsed: &ParsedContainer<'_>, options: &DecompressionOptions) -> Result<()> {
    use rayon::prelude::*;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .build()
        .map_err(|error| crate::error::Error::worker(format!("failed to build decompression thread pool: {error}")))?;

    pool.install(|| {
        output
            .par_chunks_mut(options.orig_chunk_size)
            .enumerate()
            .try_for_each(|(index, chunk_output)| decode_chunk(chunk_output, index, parsed, options))
    })
}

#[cfg(not(feature = "rayon"))]
fn dispatch(output: &mut [u8], parsed: &ParsedContainer<'_>, options: &DecompressionOptions) -> Result<()> {
    output
        .chunks_mut(options.orig_chunk_size)
        .enumerate()
        .try_for_each(|(index, chunk_output)| decode_chunk(chunk_output, index, parsed, options))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{BytesMode, CompressionOptions};

    #[test]
    fn empty_container_decompresses_to_empty_output() {
        let compress_options = CompressionOptions::new(BytesMode::Split2, 16);
        let header = vec![0xCDu8; container::HEADER_LEN];
        let container_bytes = crate::scheduler::run(&header, &[], &compress_options).unwrap();

        let decompress_options = DecompressionOptions::new(BytesMode::Split2, 16, 0);
        let output = run(&container_bytes, &decompress_options).unwrap();
        assert!(output.is_empty());
    }
}
