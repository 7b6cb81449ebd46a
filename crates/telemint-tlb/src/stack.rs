//! Typed entries of a get-method reply stack.

use std::sync::Arc;

use crate::boc;
use crate::cell::Cell;
use crate::error::{DecodeError, Result};

/// One entry of a get-method stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    Number(i128),
    Cell(Arc<Cell>),
}

impl StackEntry {
    /// Parse a hex number as sent by the node, e.g. `"0x5F5E100"` or `"-0x1"`.
    pub fn number_from_hex(text: &str) -> Result<Self> {
        parse_hex_number(text).map(StackEntry::Number)
    }

    /// Parse a cell sent as base64 bag-of-cells text.
    pub fn cell_from_boc_base64(text: &str) -> Result<Self> {
        Ok(StackEntry::Cell(boc::from_base64(text)?))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            StackEntry::Number(_) => "num",
            StackEntry::Cell(_) => "cell",
        }
    }
}

fn parse_hex_number(text: &str) -> Result<i128> {
    let invalid = || DecodeError::InvalidNumber(text.to_string());
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let digits = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let magnitude = u128::from_str_radix(digits, 16).map_err(|_| invalid())?;
    if negative {
        0i128.checked_sub_unsigned(magnitude).ok_or_else(invalid)
    } else {
        i128::try_from(magnitude).map_err(|_| invalid())
    }
}

/// An ordered get-method reply stack with typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    entries: Vec<StackEntry>,
}

impl Stack {
    pub fn new(entries: Vec<StackEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Result<&StackEntry> {
        self.entries.get(index).ok_or(DecodeError::MissingEntry(index))
    }

    pub fn number(&self, index: usize) -> Result<i128> {
        match self.get(index)? {
            StackEntry::Number(value) => Ok(*value),
            other => Err(DecodeError::TypeMismatch {
                index,
                expected: "num",
                found: other.type_name(),
            }),
        }
    }

    pub fn cell(&self, index: usize) -> Result<&Arc<Cell>> {
        match self.get(index)? {
            StackEntry::Cell(cell) => Ok(cell),
            other => Err(DecodeError::TypeMismatch {
                index,
                expected: "cell",
                found: other.type_name(),
            }),
        }
    }

    pub fn u128(&self, index: usize) -> Result<u128> {
        let value = self.number(index)?;
        u128::try_from(value).map_err(|_| DecodeError::NumberOutOfRange {
            index,
            value,
            target: "u128",
        })
    }

    pub fn u32(&self, index: usize) -> Result<u32> {
        let value = self.number(index)?;
        u32::try_from(value).map_err(|_| DecodeError::NumberOutOfRange {
            index,
            value,
            target: "u32",
        })
    }

    pub fn u8(&self, index: usize) -> Result<u8> {
        let value = self.number(index)?;
        u8::try_from(value).map_err(|_| DecodeError::NumberOutOfRange {
            index,
            value,
            target: "u8",
        })
    }
}

impl From<Vec<StackEntry>> for Stack {
    fn from(entries: Vec<StackEntry>) -> Self {
        Self::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_numbers() {
        assert_eq!(StackEntry::number_from_hex("0x64").unwrap(), StackEntry::Number(100));
        assert_eq!(
            StackEntry::number_from_hex("0x5F5E100").unwrap(),
            StackEntry::Number(100_000_000)
        );
        assert_eq!(StackEntry::number_from_hex("-0x1").unwrap(), StackEntry::Number(-1));
        assert_eq!(StackEntry::number_from_hex("0x0").unwrap(), StackEntry::Number(0));
    }

    #[test]
    fn test_reject_malformed_numbers() {
        for bad in ["64", "0x", "0xZZ", "", "--0x1", "0x+1"] {
            assert!(
                matches!(StackEntry::number_from_hex(bad), Err(DecodeError::InvalidNumber(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_typed_accessors() {
        let stack = Stack::new(vec![
            StackEntry::Number(7),
            StackEntry::Cell(Arc::new(Cell::empty())),
            StackEntry::Number(-5),
        ]);

        assert_eq!(stack.u32(0).unwrap(), 7);
        assert!(stack.cell(1).is_ok());
        assert_eq!(
            stack.number(1).unwrap_err(),
            DecodeError::TypeMismatch {
                index: 1,
                expected: "num",
                found: "cell"
            }
        );
        assert_eq!(
            stack.cell(0).unwrap_err(),
            DecodeError::TypeMismatch {
                index: 0,
                expected: "cell",
                found: "num"
            }
        );
        assert!(matches!(stack.u128(2), Err(DecodeError::NumberOutOfRange { .. })));
        assert_eq!(stack.u8(3).unwrap_err(), DecodeError::MissingEntry(3));
    }

    #[test]
    fn test_u32_range_check() {
        let stack = Stack::new(vec![StackEntry::Number(1 << 32)]);
        assert!(matches!(stack.u32(0), Err(DecodeError::NumberOutOfRange { .. })));
    }
}
