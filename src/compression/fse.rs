//! A static, byte-wise range Asymmetric Numeral System (rANS) coder.
//!
//! Fills the `FSE` entropy-coder adapter slot. The reference system this
//! format was modeled on defers FSE to the private `FSE_*` symbols of a
//! vendored codec build; as with `HUFFMAN` (see `compression::huffman`),
//! no standalone crate for that exists in this crate's dependency
//! neighborhood, so a from-scratch static rANS coder — the same family of
//! algorithm FSE belongs to — lives here instead.
//!
//! Format: a 256-entry table of `u16` little-endian normalized frequencies
//! (summing to `SCALE`), followed by the 4-byte little-endian rANS state at
//! the time encoding finished, followed by the renormalization byte stream.

use crate::error::{Error, Result};

const SYMBOLS: usize = 256;
const SCALE_BITS: u32 = 12;
const SCALE: u32 = 1 << SCALE_BITS;
const RANS_L: u32 = 1 << 23;

pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
    if src.is_empty() {
        return Ok(Vec::new());
    }

    let freqs = normalize_frequencies(src);
    let cumulative = cumulative_table(&freqs);

    let mut state: u32 = RANS_L;
    let mut body = Vec::with_capacity(src.len() / 2 + 8);

    for &byte in src.iter().rev() {
        let symbol = byte as usize;
        let freq = freqs[symbol];
        let start = cumulative[symbol];

        let x_max = ((RANS_L >> SCALE_BITS) << 8) * freq;
        while state >= x_max {
            body.push((state & 0xFF) as u8);
            state >>= 8;
        }

        state = ((state / freq) << SCALE_BITS) + (state % freq) + start;
    }
    body.reverse();

    let mut out = Vec::with_capacity(SYMBOLS * 2 + 4 + body.len());
    for &freq in &freqs {
        out.extend_from_slice(&(freq as u16).to_le_bytes());
    }
    out.extend_from_slice(&state.to_le_bytes());
    out.extend_from_slice(&body);

    Ok(out)
}

pub fn decompress(compressed: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if expected_len == 0 {
        return Ok(Vec::new());
    }

    let header_len = SYMBOLS * 2;
    if compressed.len() < header_len + 4 {
        return Err(Error::codec("fse stream shorter than its header"));
    }

    let mut freqs = [0u32; SYMBOLS];
    for (symbol, chunk) in compressed[..header_len].chunks_exact(2).enumerate() {
        freqs[symbol] = u16::from_le_bytes([chunk[0], chunk[1]]) as u32;
    }

    if freqs.iter().sum::<u32>() != SCALE {
        return Err(Error::codec("fse frequency table does not sum to the coder's scale"));
    }

    let cumulative = cumulative_table(&freqs);
    let slot_to_symbol = slot_table(&freqs, &cumulative);

    let mut state = u32::from_le_bytes(compressed[header_len..header_len + 4].try_into().expect("4 bytes"));
    let mut cursor = header_len + 4;
    let mask = SCALE - 1;

    let mut out = Vec::with_capacity(expected_len);
    for _ in 0..expected_len {
        let slot = state & mask;
        let symbol = slot_to_symbol[slot as usize];
        let freq = freqs[symbol as usize];
        let start = cumulative[symbol as usize];

        state = freq * (state >> SCALE_BITS) + slot - start;

        while state < RANS_L {
            let byte = *compressed
                .get(cursor)
                .ok_or_else(|| Error::codec("fse stream ended before expected_len symbols were decoded"))?;
            cursor += 1;
            state = (state << 8) | byte as u32;
        }

        out.push(symbol);
    }

    Ok(out)
}

/// Scales a raw byte histogram up to `SCALE` total, guaranteeing every
/// symbol that occurs at least once keeps a nonzero frequency.
fn normalize_frequencies(src: &[u8]) -> [u32; SYMBOLS] {
    let mut raw = [0u32; SYMBOLS];
    for &byte in src {
        raw[byte as usize] += 1;
    }

    let total = src.len() as u64;
    let mut freqs = [0u32; SYMBOLS];
    let mut sum: u32 = 0;

    for symbol in 0..SYMBOLS {
        if raw[symbol] > 0 {
            let scaled = ((raw[symbol] as u64 * SCALE as u64) / total).max(1) as u32;
            freqs[symbol] = scaled;
            sum += scaled;
        }
    }

    while sum > SCALE {
        let (index, _) = freqs.iter().enumerate().filter(|&(_, &f)| f > 1).max_by_key(|&(_, &f)| f).expect("sum > SCALE implies some freq > 1");
        freqs[index] -= 1;
        sum -= 1;
    }

    while sum < SCALE {
        let (index, _) = freqs.iter().enumerate().max_by_key(|&(_, &f)| f).expect("at least one symbol occurs");
        freqs[index] += 1;
        sum += 1;
    }

    freqs
}

fn cumulative_table(freqs: &[u32; SYMBOLS]) -> [u32; SYMBOLS] {
    let mut cumulative = [0u32; SYMBOLS];
    let mut running = 0u32;
    for symbol in 0..SYMBOLS {
        cumulative[symbol] = running;
        running += freqs[symbol];
    }
    cumulative
}

fn slot_table(freqs: &[u32; SYMBOLS], cumulative: &[u32; SYMBOLS]) -> Vec<u8> {
    let mut table = vec![0u8; SCALE as usize];
    for symbol in 0..SYMBOLS {
        let start = cumulative[symbol] as usize;
        let end = start + freqs[symbol] as usize;
        for slot in &mut table[start..end] {
            *slot = symbol as u8;
        }
    }
    table
}

#[cfg(test)]
mod test {
    use super::*;

    fn round_trip(src: &[u8]) {
        let compressed = compress(src).unwrap();
        let restored = decompress(&compressed, src.len()).unwrap();
        assert_eq!(restored, src);
    }

    #[test]
    fn round_trips_empty() {
        round_trip(&[]);
    }

    #[test]
    fn round_trips_single_symbol() {
        round_trip(&[42u8; 300]);
    }

    #[test]
    fn round_trips_two_symbols() {
        let src: Vec<u8> = (0..500).map(|i| if i % 3 == 0 { 1 } else { 0 }).collect();
        round_trip(&src);
    }

    #[test]
    fn round_trips_uniform_alphabet() {
        let src: Vec<u8> = (0..=255u16).cycle().take(4096).map(|v| v as u8).collect();
        round_trip(&src);
    }

    #[test]
    fn round_trips_skewed_distribution() {
        let mut src = Vec::with_capacity(2000);
        for i in 0..2000u32 {
            src.push(if i % 20 == 0 { 250 } else { (i % 5) as u8 });
        }
        round_trip(&src);
    }

    #[test]
    fn compresses_skewed_data_smaller_than_input() {
        let src = vec![5u8; 8192];
        let compressed = compress(&src).unwrap();
        assert!(compressed.len() < src.len());
    }

    #[test]
    fn single_byte_input_round_trips() {
        round_trip(&[200]);
    }
}
