#![warn(rust_2018_idioms, future_incompatible, unused_extern_crates, unused, missing_debug_implementations)]
#![deny(unused_variables, unused_assignments, dead_code, unused_must_use, trivial_numeric_casts, redundant_semicolon)]
#![forbid(unsafe_code)]

//! Lossless compression for arrays of IEEE-754 `f16`/`f32` values.
//!
//! The codec clusters the exponent bits of every float into a single byte
//! lane (bit permutation), transposes the result into per-byte-position
//! streams (byte grouping), and entropy-codes each stream independently —
//! exponent-lane streams in particular end up extremely repetitive and
//! compress far better than the interleaved original.
//!
//! ```
//! use floatgroup::{compress, decompress, CompressionOptions, DecompressionOptions, BytesMode};
//!
//! let header = vec![0u8; 32];
//! let data: Vec<u8> = (0u8..64).collect();
//!
//! let options = CompressionOptions::new(BytesMode::Split4, 16);
//! let container = compress(&header, &data, &options).unwrap();
//!
//! let decompress_options = DecompressionOptions::new(BytesMode::Split4, 16, data.len());
//! let restored = decompress(&container, &decompress_options).unwrap();
//! assert_eq!(restored, data);
//! ```

pub mod bits;
pub mod compression;
pub mod config;
pub mod container;
pub mod error;
pub mod executor;
pub mod scheduler;
pub mod selector;
pub mod transpose;

pub use config::{BitsMode, BytesMode, CompressionOptions, DecompressionOptions, Method, StreamCount};
pub use error::{Error, Result, UnitResult};

/// Compresses `data` into a self-describing container, embedding `header`
/// verbatim except for the 8-byte total-length field at `header[24..32]`,
/// which this function overwrites.
///
/// `header` must be exactly [`container::HEADER_LEN`] bytes; see that
/// constant's documentation for why the header length isn't itself a
/// parameter.
pub fn compress(header: &[u8], data: &[u8], options: &CompressionOptions) -> Result<Vec<u8>> {
    scheduler::run(header, data, options)
}

/// Decompresses a container produced by [`compress`] back into the
/// original bytes. `options.orig_size` must match the length originally
/// compressed.
pub fn decompress(container: &[u8], options: &DecompressionOptions) -> Result<Vec<u8>> {
    executor::run(container, options)
}

/// Re-exports of the types most callers need for a simple compress/decompress round trip.
pub mod prelude {
    pub use crate::config::{BitsMode, BytesMode, CompressionOptions, DecompressionOptions, Method, StreamCount};
    pub use crate::error::{Error, Result, UnitResult};
    pub use crate::{compress, decompress};
}
