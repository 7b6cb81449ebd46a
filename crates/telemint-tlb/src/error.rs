//! Error types for cell decoding, building and bag-of-cells parsing.

use thiserror::Error;

/// Failure while reading a cell, a TL-B object or a get-method stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("read of {requested} bits past end of cell ({remaining} remaining)")]
    OutOfBounds { requested: usize, remaining: usize },

    #[error("no more references in cell")]
    NoMoreReferences,

    #[error("cannot read {0} bits into a single integer (max 128)")]
    IntegerTooWide(usize),

    #[error("variable integer declares {len} bytes, field allows at most {max}")]
    VarUintTooLong { len: usize, max: usize },

    #[error("unsupported variable integer width {0} (max 16 bytes)")]
    UnsupportedVarUintWidth(usize),

    #[error("text payload of {0} bits is not byte aligned")]
    UnalignedText(usize),

    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("expected internal address, found {0}")]
    UnexpectedAddress(&'static str),

    #[error("unsupported address: {0}")]
    UnsupportedAddress(String),

    #[error("{0} trailing bits left in cell")]
    TrailingData(usize),

    #[error("stack entry {index}: expected {expected}, found {found}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("stack entry {0} is missing")]
    MissingEntry(usize),

    #[error("stack entry {index}: value {value} does not fit {target}")]
    NumberOutOfRange {
        index: usize,
        value: i128,
        target: &'static str,
    },

    #[error("invalid hex number {0:?}")]
    InvalidNumber(String),

    #[error("invalid cell payload: {0}")]
    Boc(#[from] BocError),
}

/// Failure while writing bits or references into a cell.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("cell overflow: {requested} bits requested, {remaining} available")]
    BitOverflow { requested: usize, remaining: usize },

    #[error("cell already holds the maximum of 4 references")]
    RefOverflow,

    #[error("value does not fit in {0} bits")]
    ValueTooWide(usize),

    #[error("cannot store {0}-bit integer field (max 128)")]
    IntegerTooWide(usize),

    #[error("variable integer needs {len} bytes, field allows at most {max}")]
    VarUintTooLong { len: usize, max: usize },

    #[error("data of {bytes} bytes cannot hold {bits} bits")]
    ShortData { bytes: usize, bits: usize },
}

/// Failure while parsing or writing a serialized bag of cells.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BocError {
    #[error("unknown bag-of-cells magic {0:#010x}")]
    BadMagic(u32),

    #[error("bag of cells truncated")]
    Truncated,

    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("crc32c mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch { stored: u32, computed: u32 },

    #[error("cell {cell} references {target}, which is not a later cell")]
    BadReference { cell: usize, target: usize },

    #[error("invalid cell {cell}: {reason}")]
    InvalidCell { cell: usize, reason: &'static str },

    #[error("unsupported bag of cells: {0}")]
    Unsupported(&'static str),

    #[error("bag of cells has no root")]
    NoRoot,

    #[error("root index {0} is out of range")]
    BadRoot(usize),

    #[error("{0} trailing bytes after bag of cells")]
    TrailingBytes(usize),
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;
