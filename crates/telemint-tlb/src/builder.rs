//! Write-side counterpart of [`CellSlice`](crate::CellSlice).

use std::sync::Arc;

use crate::cell::{var_uint_len_bits, Cell, GRAMS_MAX_BYTES, MAX_CELL_BITS, MAX_CELL_REFS, MAX_VAR_UINT_BYTES};
use crate::error::{BuildError, Result};

/// Accumulates bits and references for a new [`Cell`].
///
/// ```
/// use telemint_tlb::CellBuilder;
///
/// let mut b = CellBuilder::new();
/// b.store_uint(0b101, 3).unwrap();
/// b.store_grams(100).unwrap();
/// let cell = b.build().unwrap();
///
/// let mut s = cell.parser();
/// assert_eq!(s.read_bits(3).unwrap(), 0b101);
/// assert_eq!(s.read_grams().unwrap(), 100);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_used(&self) -> usize {
        self.bit_len
    }

    pub fn bits_available(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    fn ensure_bits(&self, n: usize) -> Result<(), BuildError> {
        let remaining = self.bits_available();
        if n > remaining {
            return Err(BuildError::BitOverflow {
                requested: n,
                remaining,
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let last = self.data.len() - 1;
            self.data[last] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, BuildError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Append `value` as an `n`-bit big-endian unsigned integer.
    pub fn store_uint(&mut self, value: u128, n: usize) -> Result<&mut Self, BuildError> {
        if n > 128 {
            return Err(BuildError::IntegerTooWide(n));
        }
        if n < 128 && value >> n != 0 {
            return Err(BuildError::ValueTooWide(n));
        }
        self.ensure_bits(n)?;
        for i in (0..n).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Append `value` as an `n`-bit two's complement integer.
    pub fn store_int(&mut self, value: i128, n: usize) -> Result<&mut Self, BuildError> {
        if n == 0 || n > 128 {
            return Err(BuildError::IntegerTooWide(n));
        }
        if n < 128 {
            let min = -(1i128 << (n - 1));
            let max = (1i128 << (n - 1)) - 1;
            if value < min || value > max {
                return Err(BuildError::ValueTooWide(n));
            }
        }
        let raw = if n == 128 {
            value as u128
        } else {
            (value as u128) & ((1u128 << n) - 1)
        };
        self.store_uint(raw, n)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, BuildError> {
        self.store_raw_bits(bytes, bytes.len() * 8)
    }

    /// Append the first `n` bits of left-aligned `bytes`.
    pub fn store_raw_bits(&mut self, bytes: &[u8], n: usize) -> Result<&mut Self, BuildError> {
        if bytes.len() * 8 < n {
            return Err(BuildError::ShortData {
                bytes: bytes.len(),
                bits: n,
            });
        }
        self.ensure_bits(n)?;
        for i in 0..n {
            self.push_bit((bytes[i / 8] >> (7 - i % 8)) & 1 == 1);
        }
        Ok(self)
    }

    /// Append a length-prefixed integer using the minimal byte length.
    pub fn store_var_uint(&mut self, value: u128, max_bytes: usize) -> Result<&mut Self, BuildError> {
        if max_bytes > MAX_VAR_UINT_BYTES {
            return Err(BuildError::IntegerTooWide(max_bytes * 8));
        }
        let len = byte_width(value);
        if len > max_bytes {
            return Err(BuildError::VarUintTooLong {
                len,
                max: max_bytes,
            });
        }
        let len_bits = var_uint_len_bits(max_bytes);
        self.ensure_bits(len_bits + len * 8)?;
        self.store_uint(len as u128, len_bits)?;
        self.store_uint(value, len * 8)
    }

    pub fn store_grams(&mut self, value: u128) -> Result<&mut Self, BuildError> {
        self.store_var_uint(value, GRAMS_MAX_BYTES)
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, BuildError> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(BuildError::RefOverflow);
        }
        self.refs.push(cell);
        Ok(self)
    }

    pub fn build(self) -> Result<Cell, BuildError> {
        Cell::new(self.data, self.bit_len, self.refs)
    }
}

/// Minimal number of bytes needed to hold `value` (0 for zero).
pub fn byte_width(value: u128) -> usize {
    ((u128::BITS - value.leading_zeros()) as usize).div_ceil(8)
}
