//! Cells and the bit cursor that reads them.

use std::fmt;
use std::sync::Arc;

use crate::error::{BuildError, DecodeError, Result};

/// Maximum number of data bits in a single cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references held by a single cell.
pub const MAX_CELL_REFS: usize = 4;

/// Widest variable integer accepted by [`CellSlice::read_var_uint`], in bytes.
pub const MAX_VAR_UINT_BYTES: usize = 16;

/// Largest byte length a `Grams` amount may declare (`VarUInteger 16`).
pub const GRAMS_MAX_BYTES: usize = 15;

/// A bounded bit sequence plus up to four child cells.
///
/// Bits are stored big-endian and left-aligned in `data`; any bits after
/// `bit_len` in the final byte are ignored.
#[derive(Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl Cell {
    /// Create a cell from raw parts, validating the ledger's size limits.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> Result<Self, BuildError> {
        if bit_len > MAX_CELL_BITS {
            return Err(BuildError::BitOverflow {
                requested: bit_len,
                remaining: MAX_CELL_BITS,
            });
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(BuildError::RefOverflow);
        }
        let byte_len = bit_len.div_ceil(8);
        if data.len() < byte_len {
            return Err(BuildError::ShortData {
                bytes: data.len(),
                bits: bit_len,
            });
        }
        data.truncate(byte_len);
        if bit_len % 8 != 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xFF << (8 - bit_len % 8);
            }
        }
        Ok(Self { data, bit_len, refs })
    }

    /// An empty cell with no data and no references.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            bit_len: 0,
            refs: Vec::new(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Start reading this cell from its first bit and first reference.
    pub fn parser(&self) -> CellSlice<'_> {
        CellSlice {
            cell: self,
            bit_offset: 0,
            ref_offset: 0,
        }
    }

    fn bit_at(&self, index: usize) -> bool {
        (self.data[index / 8] >> (7 - index % 8)) & 1 == 1
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.bit_len)
            .field("data", &hex::encode(&self.data))
            .field("refs", &self.refs)
            .finish()
    }
}

/// Forward-only cursor over one cell's bits and references.
///
/// The bit offset and the reference index advance independently. A failed
/// read leaves the cursor where it was.
#[derive(Debug, Clone, Copy)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_offset: usize,
    ref_offset: usize,
}

impl<'a> CellSlice<'a> {
    /// Unread bits in this cell, not counting referenced cells.
    pub fn bits_remaining(&self) -> usize {
        self.cell.bit_len - self.bit_offset
    }

    pub fn refs_remaining(&self) -> usize {
        self.cell.refs.len() - self.ref_offset
    }

    pub fn bit_offset(&self) -> usize {
        self.bit_offset
    }

    pub fn ref_offset(&self) -> usize {
        self.ref_offset
    }

    fn ensure_bits(&self, n: usize) -> Result<()> {
        let remaining = self.bits_remaining();
        if n > remaining {
            return Err(DecodeError::OutOfBounds {
                requested: n,
                remaining,
            });
        }
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;
        let bit = self.cell.bit_at(self.bit_offset);
        self.bit_offset += 1;
        Ok(bit)
    }

    /// Read the next `n` bits as a big-endian unsigned value.
    pub fn read_bits(&mut self, n: usize) -> Result<u128> {
        if n > 128 {
            return Err(DecodeError::IntegerTooWide(n));
        }
        self.ensure_bits(n)?;
        let mut value = 0u128;
        for i in 0..n {
            value = (value << 1) | self.cell.bit_at(self.bit_offset + i) as u128;
        }
        self.bit_offset += n;
        Ok(value)
    }

    pub fn read_uint(&mut self, n: usize) -> Result<u128> {
        self.read_bits(n)
    }

    /// Read an `n`-bit two's complement integer.
    pub fn read_int(&mut self, n: usize) -> Result<i128> {
        let raw = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        let shift = 128 - n as u32;
        Ok(((raw << shift) as i128) >> shift)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Read `n` bits into left-aligned bytes; trailing pad bits are zero.
    pub fn read_raw_bits(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure_bits(n)?;
        let mut out = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.cell.bit_at(self.bit_offset + i) {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        self.bit_offset += n;
        Ok(out)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.read_raw_bits(count * 8)
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.ensure_bits(n)?;
        self.bit_offset += n;
        Ok(())
    }

    /// Descend into the next referenced cell.
    pub fn read_reference(&mut self) -> Result<CellSlice<'a>> {
        let child = self
            .cell
            .refs
            .get(self.ref_offset)
            .ok_or(DecodeError::NoMoreReferences)?;
        self.ref_offset += 1;
        Ok(child.parser())
    }

    /// Read a length-prefixed big-endian integer of at most `max_bytes` bytes.
    ///
    /// The prefix is `ceil(log2(max_bytes + 1))` bits wide; a length of 0
    /// encodes the value 0 with no payload.
    pub fn read_var_uint(&mut self, max_bytes: usize) -> Result<u128> {
        if max_bytes > MAX_VAR_UINT_BYTES {
            return Err(DecodeError::UnsupportedVarUintWidth(max_bytes));
        }
        let mut probe = *self;
        let len = probe.read_bits(var_uint_len_bits(max_bytes))? as usize;
        if len > max_bytes {
            return Err(DecodeError::VarUintTooLong {
                len,
                max: max_bytes,
            });
        }
        let value = probe.read_bits(len * 8)?;
        *self = probe;
        Ok(value)
    }

    /// Read a `Grams` (`VarUInteger 16`) amount.
    pub fn read_grams(&mut self) -> Result<u128> {
        self.read_var_uint(GRAMS_MAX_BYTES)
    }

    /// Fail unless every data bit has been consumed.
    pub fn ensure_empty(&self) -> Result<()> {
        match self.bits_remaining() {
            0 => Ok(()),
            n => Err(DecodeError::TrailingData(n)),
        }
    }
}

/// Width of the length prefix for a variable integer of up to `max_bytes`.
pub fn var_uint_len_bits(max_bytes: usize) -> usize {
    (usize::BITS - max_bytes.leading_zeros()) as usize
}
