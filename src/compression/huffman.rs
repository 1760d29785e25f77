//! A canonical, static (per-stream) Huffman byte coder.
//!
//! This is a from-scratch internal implementation of the `HUFFMAN` entropy
//! coder adapter slot: the reference system this format was modeled on
//! defers to private symbols of a vendored codec build, and no standalone
//! "encode arbitrary bytes with Huffman" crate exists in this crate's
//! dependency neighborhood, so the algorithm itself lives here rather than
//! behind an external binding (see `DESIGN.md`).
//!
//! Format: a 256-byte table of code lengths (one byte per symbol value, `0`
//! meaning the symbol never occurs), followed by the bit-packed codes for
//! every input byte, most-significant-bit first, padded to a byte boundary.
//! The number of symbols to decode is supplied by the caller (it's the
//! stream's declared uncompressed length), so no separate count is stored.

use std::collections::BinaryHeap;

use crate::error::{Error, Result};

const TABLE_LEN: usize = 256;

enum Node {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

/// Heap entry ordered solely by `(frequency, insertion order)`; the node
/// payload rides along but never participates in comparisons, so `Node`
/// itself doesn't need to implement `Ord`.
struct HeapEntry(u64, usize, Node);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        (self.0, self.1) == (other.0, other.1)
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // reversed so `BinaryHeap` (a max-heap) behaves like a min-heap
        (other.0, other.1).cmp(&(self.0, self.1))
    }
}

/// Encodes `src` using a Huffman table built from its own byte histogram.
pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
    let mut histogram = [0u64; TABLE_LEN];
    for &byte in src {
        histogram[byte as usize] += 1;
    }

    let lengths = code_lengths(&histogram)?;
    let codes = canonical_codes(&lengths);

    let mut out = Vec::with_capacity(TABLE_LEN + src.len() / 2 + 1);
    out.extend(lengths.iter().map(|&length| length as u8));

    let mut writer = BitWriter::new();
    for &byte in src {
        let (code, length) = codes[byte as usize];
        writer.write_bits(code, length);
    }
    out.extend(writer.finish());

    Ok(out)
}

/// Decodes a stream produced by [`compress`], reading exactly
/// `expected_len` symbols.
pub fn decompress(compressed: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if expected_len == 0 {
        return Ok(Vec::new());
    }

    if compressed.len() < TABLE_LEN {
        return Err(Error::codec("huffman stream shorter than its code-length table"));
    }

    let mut lengths = [0u8; TABLE_LEN];
    lengths.copy_from_slice(&compressed[..TABLE_LEN]);
    let lengths32: Vec<u32> = lengths.iter().map(|&l| l as u32).collect();
    let codes = canonical_codes(&lengths32);

    let tree = build_decode_tree(&codes)?;
    let mut reader = BitReader::new(&compressed[TABLE_LEN..]);

    let mut out = Vec::with_capacity(expected_len);
    for _ in 0..expected_len {
        out.push(decode_one(&tree, &mut reader)?);
    }

    Ok(out)
}

fn code_lengths(histogram: &[u64; TABLE_LEN]) -> Result<Vec<u32>> {
    let distinct: Vec<(u8, u64)> = histogram
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(symbol, &count)| (symbol as u8, count))
        .collect();

    let mut lengths = vec![0u32; TABLE_LEN];

    if distinct.is_empty() {
        return Ok(lengths);
    }

    if distinct.len() == 1 {
        lengths[distinct[0].0 as usize] = 1;
        return Ok(lengths);
    }

    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    for (order, &(symbol, count)) in distinct.iter().enumerate() {
        heap.push(HeapEntry(count, order, Node::Leaf(symbol)));
    }

    let mut next_order = distinct.len();
    while heap.len() > 1 {
        let HeapEntry(freq_a, _, a) = heap.pop().expect("heap has >1 element");
        let HeapEntry(freq_b, _, b) = heap.pop().expect("heap has >1 element");
        heap.push(HeapEntry(freq_a + freq_b, next_order, Node::Internal(Box::new(a), Box::new(b))));
        next_order += 1;
    }

    let HeapEntry(_, _, root) = heap.pop().expect("heap always converges to one root");
    assign_lengths(&root, 0, &mut lengths)?;
    Ok(lengths)
}

fn assign_lengths(node: &Node, depth: u32, lengths: &mut [u32]) -> Result<()> {
    match node {
        Node::Leaf(symbol) => {
            if depth > 56 {
                return Err(Error::codec("huffman code length exceeds supported bit-writer width"));
            }
            lengths[*symbol as usize] = depth.max(1);
            Ok(())
        }
        Node::Internal(left, right) => {
            assign_lengths(left, depth + 1, lengths)?;
            assign_lengths(right, depth + 1, lengths)
        }
    }
}

/// Assigns canonical codes from a set of per-symbol code lengths (DEFLATE-style):
/// symbols are ordered by `(length, symbol)`, and codes increase by one at each
/// step, left-shifted whenever the length grows.
fn canonical_codes(lengths: &[u32]) -> Vec<(u64, u32)> {
    let mut order: Vec<u8> = (0..TABLE_LEN as u32)
        .filter(|&symbol| lengths[symbol as usize] > 0)
        .map(|symbol| symbol as u8)
        .collect();
    order.sort_by_key(|&symbol| (lengths[symbol as usize], symbol));

    let mut codes = vec![(0u64, 0u32); TABLE_LEN];
    let mut code: u64 = 0;
    let mut prev_length = 0u32;

    for symbol in order {
        let length = lengths[symbol as usize];
        code <<= length - prev_length;
        codes[symbol as usize] = (code, length);
        code += 1;
        prev_length = length;
    }

    codes
}

fn build_decode_tree(codes: &[(u64, u32)]) -> Result<DecodeNode> {
    let mut root = DecodeNode::Internal(None, None);

    for (symbol, &(code, length)) in codes.iter().enumerate() {
        if length == 0 {
            continue;
        }

        let mut current = &mut root;
        for bit_index in (0..length).rev() {
            let bit = (code >> bit_index) & 1;
            let DecodeNode::Internal(left, right) = current else {
                return Err(Error::codec("huffman code table is not prefix-free"));
            };

            let slot = if bit == 0 { left } else { right };
            if slot.is_none() {
                *slot = Some(Box::new(DecodeNode::Internal(None, None)));
            }
            current = slot.as_deref_mut().expect("just inserted");
        }

        *current = DecodeNode::Leaf(symbol as u8);
    }

    Ok(root)
}

enum DecodeNode {
    Leaf(u8),
    Internal(Option<Box<DecodeNode>>, Option<Box<DecodeNode>>),
}

fn decode_one(tree: &DecodeNode, reader: &mut BitReader<'_>) -> Result<u8> {
    let mut node = tree;
    loop {
        match node {
            DecodeNode::Leaf(symbol) => return Ok(*symbol),
            DecodeNode::Internal(left, right) => {
                let bit = reader.read_bit()?;
                let next = if bit == 0 { left } else { right };
                node = next
                    .as_deref()
                    .ok_or_else(|| Error::codec("huffman bitstream does not match any code"))?;
            }
        }
    }
}

struct BitWriter {
    bytes: Vec<u8>,
    current: u8,
    filled: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self { bytes: Vec::new(), current: 0, filled: 0 }
    }

    fn write_bits(&mut self, code: u64, length: u32) {
        for bit_index in (0..length).rev() {
            let bit = ((code >> bit_index) & 1) as u8;
            self.current = (self.current << 1) | bit;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.current);
                self.current = 0;
                self.filled = 0;
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.current <<= 8 - self.filled;
            self.bytes.push(self.current);
        }
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    byte_index: usize,
    bit_index: u32, // next bit to read, 0 = MSB of bytes[byte_index]
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, byte_index: 0, bit_index: 0 }
    }

    fn read_bit(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.byte_index)
            .ok_or_else(|| Error::codec("huffman bitstream ended early"))?;

        let bit = (byte >> (7 - self.bit_index)) & 1;
        self.bit_index += 1;
        if self.bit_index == 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }

        Ok(bit)
    }
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
        round_trip(&[7, 7, 7, 7, 7]);
    }

    #[test]
    fn round_trips_two_symbols() {
        round_trip(&[0, 1, 0, 0, 1, 0, 1, 1, 1, 0]);
    }

    #[test]
    fn round_trips_skewed_distribution() {
        let mut src = vec![0u8; 1000];
        for (index, byte) in src.iter_mut().enumerate() {
            *byte = if index % 10 == 0 { 200 } else { 1 };
        }
        round_trip(&src);
    }

    #[test]
    fn round_trips_all_256_symbols_uniform() {
        let src: Vec<u8> = (0..=255).cycle().take(2048).collect();
        round_trip(&src);
    }

    #[test]
    fn compresses_skewed_data_smaller_than_input() {
        let src = vec![0u8; 4096];
        let compressed = compress(&src).unwrap();
        assert!(compressed.len() < src.len());
    }
}
