//! Run-length codewords of DVD subpicture payloads.
//!
//! The decoder preprocesses each subpicture unit into a flat array of 16-bit
//! little-endian codewords, one per run, rows concatenated top to bottom:
//!
//! ```text
//!  15                              2  1  0
//! +---------------------------------+-----+
//! |            run length           |class|
//! +---------------------------------+-----+
//! ```
//!
//! The colour class indexes the 4-entry palette and alpha tables.

use std::slice::ChunksExact;

/// Bits reserved for the colour class.
pub const CLASS_BITS: u32 = 2;

/// Mask of the colour class bits.
pub const CLASS_MASK: u16 = 0x3;

/// Longest run a single codeword can carry.
pub const MAX_RUN: u16 = u16::MAX >> CLASS_BITS;

/// A single run of `run` pixels in colour class `class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codeword(pub u16);

impl Codeword {
    /// Build a codeword. `run` is truncated to 14 bits, `class` to 2 bits.
    pub fn new(run: u16, class: u8) -> Self {
        Self(((run & MAX_RUN) << CLASS_BITS) | (class as u16 & CLASS_MASK))
    }

    /// Run length in pixels.
    pub fn run(self) -> u16 {
        self.0 >> CLASS_BITS
    }

    /// Colour class, `0..=3`.
    pub fn class(self) -> usize {
        (self.0 & CLASS_MASK) as usize
    }

    /// Encode in payload byte order.
    pub fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    /// Decode from payload byte order.
    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }
}

/// Iterator over the codewords of a payload.
///
/// A trailing odd byte is ignored.
#[derive(Debug, Clone)]
pub struct RleReader<'a> {
    chunks: ChunksExact<'a, u8>,
}

impl<'a> RleReader<'a> {
    /// Create a reader over a payload.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            chunks: data.chunks_exact(2),
        }
    }
}

impl Iterator for RleReader<'_> {
    type Item = Codeword;

    fn next(&mut self) -> Option<Codeword> {
        self.chunks
            .next()
            .map(|pair| Codeword::from_le_bytes([pair[0], pair[1]]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for RleReader<'_> {}

/// Builds a codeword payload, row by row.
#[derive(Debug, Clone, Default)]
pub struct RleWriter {
    buf: Vec<u8>,
}

impl RleWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run. Runs longer than [`MAX_RUN`] are split.
    pub fn push(&mut self, mut run: u32, class: u8) -> &mut Self {
        while run > 0 {
            let chunk = run.min(MAX_RUN as u32) as u16;
            self.buf
                .extend_from_slice(&Codeword::new(chunk, class).to_le_bytes());
            run -= chunk as u32;
        }
        self
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Get the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codeword_layout() {
        let code = Codeword::new(37, 2);
        assert_eq!(code.0, (37 << 2) | 2);
        assert_eq!(code.run(), 37);
        assert_eq!(code.class(), 2);
    }

    #[test]
    fn test_codeword_truncation() {
        let code = Codeword::new(u16::MAX, 7);
        assert_eq!(code.run(), MAX_RUN);
        assert_eq!(code.class(), 3);
    }

    #[test]
    fn test_reader_little_endian() {
        let data = [0x96, 0x00, 0x05, 0x01, 0xff];
        let codes: Vec<_> = RleReader::new(&data).collect();
        assert_eq!(codes, vec![Codeword(0x0096), Codeword(0x0105)]);
        assert_eq!(codes[0].run(), 37);
        assert_eq!(codes[0].class(), 2);
    }

    #[test]
    fn test_writer_splits_long_runs() {
        let mut writer = RleWriter::new();
        writer.push(MAX_RUN as u32 + 10, 1).push(0, 3);
        let codes: Vec<_> = RleReader::new(writer.as_bytes()).collect();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].run(), MAX_RUN);
        assert_eq!(codes[1].run(), 10);
        assert!(codes.iter().all(|c| c.class() == 1));
    }
}
