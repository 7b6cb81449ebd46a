//! Bag-of-cells (BOC) serialization.
//!
//! Get-method replies carry cells as base64 text of a serialized bag of
//! cells. Only the generic `b5ee9c72` layout with ordinary cells is handled.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cell::{Cell, MAX_CELL_REFS};
use crate::error::BocError;

const BOC_GENERIC_MAGIC: u32 = 0xb5ee_9c72;

const FLAG_HAS_IDX: u8 = 0x80;
const FLAG_HAS_CRC32C: u8 = 0x40;
const FLAG_HAS_CACHE_BITS: u8 = 0x20;
const REF_SIZE_MASK: u8 = 0x07;

const D1_EXOTIC: u8 = 0x08;
const D1_WITH_HASHES: u8 = 0x10;

type Result<T> = std::result::Result<T, BocError>;

/// Parse a bag of cells and return its root cells.
pub fn deserialize(bytes: &[u8]) -> Result<Vec<Arc<Cell>>> {
    let mut r = ByteReader::new(bytes);

    let magic = r.uint(4)? as u32;
    if magic != BOC_GENERIC_MAGIC {
        return Err(BocError::BadMagic(magic));
    }

    let flags = r.u8()?;
    let has_idx = flags & FLAG_HAS_IDX != 0;
    let has_crc = flags & FLAG_HAS_CRC32C != 0;
    let ref_size = (flags & REF_SIZE_MASK) as usize;
    if ref_size == 0 || ref_size > 4 {
        return Err(BocError::Unsupported("reference size must be 1..=4 bytes"));
    }
    if flags & FLAG_HAS_CACHE_BITS != 0 && !has_idx {
        return Err(BocError::Unsupported("cache bits without index"));
    }

    if has_crc {
        // magic and flags must stay in front of the 4-byte trailer
        if bytes.len() < 9 {
            return Err(BocError::Truncated);
        }
        let (payload, tail) = bytes.split_at(bytes.len() - 4);
        let stored = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        let computed = crc32c(payload);
        if stored != computed {
            return Err(BocError::CrcMismatch { stored, computed });
        }
        r = ByteReader::new(payload);
        r.pos = 5;
    }

    let offset_size = r.u8()? as usize;
    if offset_size == 0 || offset_size > 8 {
        return Err(BocError::Unsupported("offset size must be 1..=8 bytes"));
    }

    let cell_count = r.uint(ref_size)? as usize;
    let root_count = r.uint(ref_size)? as usize;
    let absent = r.uint(ref_size)?;
    let total_size = r.uint(offset_size)? as usize;

    if absent != 0 {
        return Err(BocError::Unsupported("absent cells"));
    }
    if root_count == 0 {
        return Err(BocError::NoRoot);
    }

    // Counts come from untrusted input: check them against what is left
    // before sizing anything. Each cell takes at least its two descriptor bytes.
    let index_size = if has_idx { cell_count.checked_mul(offset_size) } else { Some(0) };
    let min_size = root_count
        .checked_mul(ref_size)
        .zip(index_size)
        .and_then(|(roots, index)| roots.checked_add(index))
        .and_then(|size| size.checked_add(total_size));
    match min_size {
        Some(size) if size <= r.remaining() => {}
        _ => return Err(BocError::Truncated),
    }
    if cell_count.checked_mul(2).map_or(true, |min| min > total_size) {
        return Err(BocError::Truncated);
    }
    if root_count > cell_count {
        return Err(BocError::Unsupported("more roots than cells"));
    }

    let mut roots = Vec::with_capacity(root_count);
    for _ in 0..root_count {
        let index = r.uint(ref_size)? as usize;
        if index >= cell_count {
            return Err(BocError::BadRoot(index));
        }
        roots.push(index);
    }

    if has_idx {
        r.skip(cell_count * offset_size)?;
    }

    let data_start = r.pos;
    let mut raw = Vec::with_capacity(cell_count);
    for index in 0..cell_count {
        raw.push(read_raw_cell(&mut r, index, cell_count, ref_size)?);
    }
    if r.pos - data_start != total_size {
        return Err(BocError::InvalidCell {
            cell: cell_count.saturating_sub(1),
            reason: "cell data size does not match header",
        });
    }
    if r.remaining() != 0 {
        return Err(BocError::TrailingBytes(r.remaining()));
    }

    // References only point forward, so children are built before parents.
    let mut built: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for index in (0..cell_count).rev() {
        let RawCell { data, bit_len, refs } = std::mem::take(&mut raw[index]);
        let children = refs
            .iter()
            .map(|&target| built[target].clone().ok_or(BocError::BadReference { cell: index, target }))
            .collect::<Result<Vec<_>>>()?;
        let cell = Cell::new(data, bit_len, children).map_err(|_| BocError::InvalidCell {
            cell: index,
            reason: "cell exceeds size limits",
        })?;
        built[index] = Some(Arc::new(cell));
    }

    roots
        .into_iter()
        .map(|index| built[index].clone().ok_or(BocError::NoRoot))
        .collect()
}

/// Parse a bag of cells and return its single root.
pub fn deserialize_single(bytes: &[u8]) -> Result<Arc<Cell>> {
    let mut roots = deserialize(bytes)?;
    match roots.len() {
        1 => Ok(roots.remove(0)),
        0 => Err(BocError::NoRoot),
        _ => Err(BocError::Unsupported("more than one root")),
    }
}

/// Decode standard base64 text and parse the single root cell it carries.
pub fn from_base64(text: &str) -> Result<Arc<Cell>> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| BocError::Base64(e.to_string()))?;
    deserialize_single(&bytes)
}

/// Serialize `root` and every cell reachable from it.
///
/// Identical `Arc` nodes are written once.
pub fn serialize(root: &Arc<Cell>, with_crc: bool) -> Vec<u8> {
    let order = topological_order(root);
    let positions: HashMap<*const Cell, usize> = order
        .iter()
        .enumerate()
        .map(|(i, c)| (Arc::as_ptr(c), i))
        .collect();

    let ref_size = min_bytes(order.len() as u64).max(1);

    let mut cells = Vec::new();
    for cell in &order {
        let bits = cell.bit_len();
        let full = bits / 8;
        let total = bits.div_ceil(8);
        cells.push(cell.refs().len() as u8);
        cells.push((full + total) as u8);
        let mut data = cell.data().to_vec();
        if bits % 8 != 0 {
            if let Some(last) = data.last_mut() {
                *last |= 0x80 >> (bits % 8);
            }
        }
        cells.extend_from_slice(&data);
        for child in cell.refs() {
            let index = positions[&Arc::as_ptr(child)];
            push_uint(&mut cells, index as u64, ref_size);
        }
    }

    let offset_size = min_bytes(cells.len() as u64).max(1);

    let mut out = Vec::with_capacity(cells.len() + 32);
    out.extend_from_slice(&BOC_GENERIC_MAGIC.to_be_bytes());
    let crc_flag = if with_crc { FLAG_HAS_CRC32C } else { 0 };
    out.push(crc_flag | ref_size as u8);
    out.push(offset_size as u8);
    push_uint(&mut out, order.len() as u64, ref_size);
    push_uint(&mut out, 1, ref_size);
    push_uint(&mut out, 0, ref_size);
    push_uint(&mut out, cells.len() as u64, offset_size);
    push_uint(&mut out, 0, ref_size);
    out.extend_from_slice(&cells);

    if with_crc {
        let crc = crc32c(&out);
        out.extend_from_slice(&crc.to_le_bytes());
    }
    out
}

/// Serialize `root` with a checksum and encode it as standard base64.
pub fn to_base64(root: &Arc<Cell>) -> String {
    STANDARD.encode(serialize(root, true))
}

#[derive(Default)]
struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

fn read_raw_cell(r: &mut ByteReader<'_>, index: usize, cell_count: usize, ref_size: usize) -> Result<RawCell> {
    let d1 = r.u8()?;
    let d2 = r.u8()?;

    if d1 & D1_EXOTIC != 0 {
        return Err(BocError::Unsupported("exotic cells"));
    }
    let ref_count = (d1 & REF_SIZE_MASK) as usize;
    if ref_count > MAX_CELL_REFS {
        return Err(BocError::InvalidCell {
            cell: index,
            reason: "more than four references",
        });
    }
    if d1 & D1_WITH_HASHES != 0 {
        let levels = (d1 >> 5).count_ones() as usize + 1;
        r.skip(levels * (32 + 2))?;
    }

    let data_len = (d2 as usize).div_ceil(2);
    let mut data = r.bytes(data_len)?.to_vec();
    let bit_len = if d2 % 2 == 0 {
        data_len * 8
    } else {
        let last = data.last_mut().ok_or(BocError::InvalidCell {
            cell: index,
            reason: "missing completion tag",
        })?;
        if *last == 0 {
            return Err(BocError::InvalidCell {
                cell: index,
                reason: "missing completion tag",
            });
        }
        let pad = last.trailing_zeros() as usize;
        *last &= !(1u8 << pad);
        data_len * 8 - pad - 1
    };

    let mut refs = Vec::with_capacity(ref_count);
    for _ in 0..ref_count {
        let target = r.uint(ref_size)? as usize;
        if target <= index || target >= cell_count {
            return Err(BocError::BadReference { cell: index, target });
        }
        refs.push(target);
    }

    Ok(RawCell { data, bit_len, refs })
}

fn topological_order(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    // Post-order DFS reversed puts every parent before its children.
    fn visit(cell: &Arc<Cell>, seen: &mut HashSet<*const Cell>, out: &mut Vec<Arc<Cell>>) {
        if !seen.insert(Arc::as_ptr(cell)) {
            return;
        }
        for child in cell.refs() {
            visit(child, seen, out);
        }
        out.push(cell.clone());
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    visit(root, &mut seen, &mut out);
    out.reverse();
    out
}

fn min_bytes(value: u64) -> usize {
    ((u64::BITS - value.leading_zeros()) as usize).div_ceil(8)
}

fn push_uint(out: &mut Vec<u8>, value: u64, size: usize) {
    out.extend_from_slice(&value.to_be_bytes()[8 - size..]);
}

/// CRC-32C (Castagnoli), reflected, as used by the bag-of-cells trailer.
pub fn crc32c(data: &[u8]) -> u32 {
    let mut crc = !0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ 0x82F6_3B78
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(BocError::Truncated);
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.bytes(n).map(|_| ())
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn uint(&mut self, size: usize) -> Result<u64> {
        Ok(self
            .bytes(size)?
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }
}
