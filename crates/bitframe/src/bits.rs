//! Sequential bit-level reading and writing over byte buffers.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first byte.

use crate::errors::ReadError;

/// Number of bytes needed to hold `bits` bits.
pub fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Cursor reading MSB-first bits from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Bits consumed so far.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    pub fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    /// Whole bytes touched so far, counting a partially read byte.
    pub fn consumed_bytes(&self) -> usize {
        bytes_for_bits(self.bit_pos)
    }

    fn ensure(&self, n: usize) -> Result<(), ReadError> {
        let remaining = self.remaining_bits();
        if n > remaining {
            return Err(ReadError::BufferUnderrun {
                requested: n,
                remaining,
            });
        }

        Ok(())
    }

    fn read_bit(&mut self) -> u64 {
        let byte = self.data[self.bit_pos / 8];
        let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
        self.bit_pos += 1;

        bit as u64
    }

    /// Reads `n` bits (max 64) as an unsigned value.
    pub fn read(&mut self, n: usize) -> Result<u64, ReadError> {
        if n > 64 {
            return Err(ReadError::TooManyBitsRead(n));
        }
        self.ensure(n)?;

        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | self.read_bit();
        }

        Ok(value)
    }

    /// Reads `n` whole bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        let bits = n.checked_mul(8).ok_or(ReadError::BufferUnderrun {
            requested: usize::MAX,
            remaining: self.remaining_bits(),
        })?;

        self.read_bits_as_bytes(bits)
    }

    /// Reads `n` bits into `ceil(n / 8)` bytes. A trailing partial byte is left-aligned.
    pub fn read_bits_as_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        self.ensure(n)?;

        if self.bit_pos % 8 == 0 && n % 8 == 0 {
            let start = self.bit_pos / 8;
            self.bit_pos += n;
            return Ok(self.data[start..start + n / 8].to_vec());
        }

        let mut out = Vec::with_capacity(bytes_for_bits(n));
        for _ in 0..n / 8 {
            out.push(self.read(8)? as u8);
        }

        let rem = n % 8;
        if rem != 0 {
            out.push((self.read(rem)? << (8 - rem)) as u8);
        }

        Ok(out)
    }
}

/// Growable MSB-first bit sink. The final byte is zero-padded.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_len % 8 == 0
    }

    fn push_bit(&mut self, bit: u8) {
        if self.is_aligned() {
            self.data.push(0);
        }

        if let Some(last) = self.data.last_mut() {
            *last |= bit << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Writes the `width` low-order bits of `value` (max 64), MSB first.
    pub fn append(&mut self, value: u64, width: usize) {
        debug_assert!(width <= 64);

        for i in (0..width).rev() {
            self.push_bit(((value >> i) & 1) as u8);
        }
    }

    /// Writes whole bytes, copying directly when the cursor is byte-aligned.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        if self.is_aligned() {
            self.data.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
            return;
        }

        for &byte in bytes {
            self.append(byte as u64, 8);
        }
    }

    /// Writes the first `n` bits of `bytes`. Missing input bits are written as zero.
    pub fn append_bits_from(&mut self, bytes: &[u8], n: usize) {
        for i in 0..n {
            let byte = bytes.get(i / 8).copied().unwrap_or(0);
            self.push_bit((byte >> (7 - i % 8)) & 1);
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
