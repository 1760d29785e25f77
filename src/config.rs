//! Caller-facing configuration for [`crate::compress`] and [`crate::decompress`].
//!
//! Validation happens eagerly, at construction time, rather than being
//! rediscovered deep inside the scheduler — a malformed `(streams, bytes_mode)`
//! combination should fail before a single thread is spawned.

use crate::error::{Error, Result};

/// Number of byte-position streams a chunk is split into.
///
/// The transposer only ever produces 2 or 4 streams; this is a closed set,
/// not an arbitrary integer, so it is represented as an enum rather than a
/// validated `usize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCount {
    Two,
    Four,
}

impl StreamCount {
    pub fn as_usize(self) -> usize {
        match self {
            StreamCount::Two => 2,
            StreamCount::Four => 4,
        }
    }
}

/// Whether the bit permuter runs before transposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitsMode {
    /// Bits are left exactly as they arrived.
    Disabled,
    /// Exponent bits are clustered into the top byte lane before transposition.
    ClusterExponent,
}

impl BitsMode {
    pub fn is_enabled(self) -> bool {
        matches!(self, BitsMode::ClusterExponent)
    }
}

/// Byte transposition layout, named after the bit-pattern values used by the
/// wire format this crate's container tables are modeled on (two bits per
/// byte lane: `00`=truncate, `01`/`10`=group, see `transpose` module docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BytesMode {
    /// N=2: split into two streams, even/odd byte positions (mode 10).
    Split2,
    /// N=2: keep only the low byte of each element (mode 1).
    TruncateLowByte,
    /// N=2: keep only the high byte of each element (mode 8).
    TruncateHighByte,
    /// N=4: split into four streams, one per byte position (mode 220).
    Split4,
}

impl BytesMode {
    pub fn stream_count(self) -> StreamCount {
        match self {
            BytesMode::Split2 | BytesMode::TruncateLowByte | BytesMode::TruncateHighByte => StreamCount::Two,
            BytesMode::Split4 => StreamCount::Four,
        }
    }
}

/// Which entropy coder to apply to every stream, or `Auto` to let the
/// heuristic selector choose per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Auto,
    Huffman,
    Zstd,
    Fse,
}

/// Configuration accepted by [`crate::compress`].
#[derive(Debug, Clone)]
pub struct CompressionOptions {
    pub streams: BytesMode,
    pub bits_mode: BitsMode,
    pub method: Method,
    pub orig_chunk_size: usize,
    /// Upper bound on `compressed / uncompressed` for a stream to be kept
    /// compressed; ratios at or above this fall back to ORIGINAL. Must lie
    /// in `(0, 1]`.
    pub comp_threshold: f32,
    /// Percentage of chunks (by ordinal) processed before the early-abort
    /// heuristic may start marking a stream `noNeedToCompress`. `0` disables
    /// the optimization.
    pub check_threshold_after_percent: u8,
    pub threads: usize,
    /// ZSTD compression level, `1..=22`. Only consulted when a stream's
    /// selected method is ZSTD.
    pub zstd_level: i32,
}

impl CompressionOptions {
    pub fn new(streams: BytesMode, orig_chunk_size: usize) -> Self {
        Self {
            streams,
            bits_mode: BitsMode::Disabled,
            method: Method::Auto,
            orig_chunk_size,
            comp_threshold: 1.0,
            check_threshold_after_percent: 0,
            threads: 1,
            zstd_level: 1,
        }
    }

    pub fn with_bits_mode(mut self, bits_mode: BitsMode) -> Self {
        self.bits_mode = bits_mode;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_comp_threshold(mut self, comp_threshold: f32) -> Self {
        self.comp_threshold = comp_threshold;
        self
    }

    pub fn with_check_threshold_after_percent(mut self, percent: u8) -> Self {
        self.check_threshold_after_percent = percent;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_zstd_level(mut self, level: i32) -> Self {
        self.zstd_level = level;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.orig_chunk_size == 0 {
            return Err(Error::config("origChunkSize must be >= 1"));
        }

        if self.threads == 0 {
            return Err(Error::config("threads must be >= 1"));
        }

        if !(self.comp_threshold > 0.0 && self.comp_threshold <= 1.0) {
            return Err(Error::config("compThreshold must lie in (0, 1]"));
        }

        Ok(())
    }
}

/// Configuration accepted by [`crate::decompress`].
#[derive(Debug, Clone)]
pub struct DecompressionOptions {
    pub streams: BytesMode,
    pub bits_mode: BitsMode,
    pub orig_chunk_size: usize,
    pub orig_size: usize,
    pub threads: usize,
}

impl DecompressionOptions {
    pub fn new(streams: BytesMode, orig_chunk_size: usize, orig_size: usize) -> Self {
        Self {
            streams,
            bits_mode: BitsMode::Disabled,
            orig_chunk_size,
            orig_size,
            threads: 1,
        }
    }

    pub fn with_bits_mode(mut self, bits_mode: BitsMode) -> Self {
        self.bits_mode = bits_mode;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.orig_chunk_size == 0 {
            return Err(Error::config("origChunkSize must be >= 1"));
        }

        if self.threads == 0 {
            return Err(Error::config("threads must be >= 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rejects_zero_chunk_size() {
        let options = CompressionOptions::new(BytesMode::Split4, 0);
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let options = CompressionOptions::new(BytesMode::Split4, 16).with_comp_threshold(1.5);
        assert!(matches!(options.validate(), Err(Error::Config(_))));

        let options = CompressionOptions::new(BytesMode::Split4, 16).with_comp_threshold(0.0);
        assert!(matches!(options.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn stream_count_matches_mode() {
        assert_eq!(BytesMode::Split2.stream_count(), StreamCount::Two);
        assert_eq!(BytesMode::Split4.stream_count(), StreamCount::Four);
    }
}
