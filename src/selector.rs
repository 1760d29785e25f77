//! The AUTO heuristic: chooses an entropy-coder method for a transposed
//! stream from its zero-byte statistics, without running any encoder.

use crate::compression::StreamMethod;

const ZERO_RATIO_THRESHOLD: f32 = 0.92;
const MAX_RUN_RATIO_THRESHOLD: f32 = 0.03;

/// Proposes a method for one already-transposed stream. `stream` holds the
/// bytes at a single byte-position lane across every element of the chunk,
/// so "element count" here is simply `stream.len()`.
pub fn select(stream: &[u8]) -> StreamMethod {
    if stream.is_empty() {
        return StreamMethod::Truncate;
    }

    let element_count = stream.len();
    let zeros = stream.iter().filter(|&&byte| byte == 0).count();

    if zeros == element_count {
        return StreamMethod::Truncate;
    }

    let max_run = longest_zero_run(stream);
    let p = zeros as f32 / element_count as f32;
    let q = max_run as f32 / element_count as f32;

    if p > ZERO_RATIO_THRESHOLD || q > MAX_RUN_RATIO_THRESHOLD {
        StreamMethod::Zstd
    } else {
        StreamMethod::Huffman
    }
}

fn longest_zero_run(stream: &[u8]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &byte in stream {
        if byte == 0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_stream_truncates() {
        assert_eq!(select(&[]), StreamMethod::Truncate);
    }

    #[test]
    fn all_zero_stream_truncates() {
        assert_eq!(select(&[0, 0, 0, 0]), StreamMethod::Truncate);
    }

    #[test]
    fn mostly_zero_stream_picks_zstd_via_p() {
        let mut stream = vec![0u8; 100];
        for i in (0..100).step_by(20) {
            stream[i] = 1; // 5 nonzero bytes out of 100: p = 0.95 > 0.92
        }
        assert_eq!(select(&stream), StreamMethod::Zstd);
    }

    #[test]
    fn long_zero_run_picks_zstd_via_q() {
        // 1000 elements, a single run of 40 zeros (q = 0.04 > 0.03), otherwise nonzero and sparse
        let mut stream = vec![1u8; 1000];
        for byte in &mut stream[0..40] {
            *byte = 0;
        }
        assert_eq!(select(&stream), StreamMethod::Zstd);
    }

    #[test]
    fn scattered_nonrepetitive_stream_picks_huffman() {
        let stream: Vec<u8> = (0..256).map(|i| (i % 7) as u8).collect();
        assert_eq!(select(&stream), StreamMethod::Huffman);
    }
}
