//! Message addresses and their user-friendly text form.
//!
//! ```text
//! addr_none$00 = MsgAddressExt;
//! addr_extern$01 len:(## 9) external_address:(bits len) = MsgAddressExt;
//! anycast_info$_ depth:(#<= 30) rewrite_pfx:(bits depth) = Anycast;
//! addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256 = MsgAddressInt;
//! addr_var$11 anycast:(Maybe Anycast) addr_len:(## 9) workchain_id:int32
//!     address:(bits addr_len) = MsgAddressInt;
//! ```

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::builder::CellBuilder;
use crate::cell::CellSlice;
use crate::error::{BuildError, DecodeError, Result};

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TESTNET: u8 = 0x80;

const FRIENDLY_LEN: usize = 48;
const FRIENDLY_BYTES: usize = 36;

/// Failure while parsing an address from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid raw address: {0}")]
    InvalidRaw(String),

    #[error("invalid user-friendly address: {0}")]
    InvalidFriendly(String),

    #[error("address checksum mismatch")]
    ChecksumMismatch,

    #[error("unknown address tag {0:#04x}")]
    UnknownTag(u8),
}

/// A 256-bit address on a given workchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InternalAddress {
    pub workchain: i8,
    pub hash: [u8; 32],
}

/// Any `MsgAddress` as it appears in cell data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MsgAddress {
    None,
    External { bit_len: usize, bits: Vec<u8> },
    Internal(InternalAddress),
}

/// Flags carried by the user-friendly form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendlyFlags {
    pub bounceable: bool,
    pub testnet: bool,
}

impl InternalAddress {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// Decode a `MsgAddressInt`.
    pub fn decode(slice: &mut CellSlice<'_>) -> Result<Self> {
        match MsgAddress::decode(slice)? {
            MsgAddress::Internal(addr) => Ok(addr),
            MsgAddress::None => Err(DecodeError::UnexpectedAddress("addr_none")),
            MsgAddress::External { .. } => Err(DecodeError::UnexpectedAddress("addr_extern")),
        }
    }

    /// Encode as `addr_std` without anycast.
    pub fn store(&self, builder: &mut CellBuilder) -> Result<(), BuildError> {
        builder.store_uint(0b10, 2)?;
        builder.store_bit(false)?;
        builder.store_int(self.workchain as i128, 8)?;
        builder.store_bytes(&self.hash)?;
        Ok(())
    }

    /// `wc:hex` form.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// 48-character URL-safe base64 form.
    pub fn to_friendly(&self, flags: FriendlyFlags) -> String {
        let mut tag = if flags.bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if flags.testnet {
            tag |= TAG_TESTNET;
        }
        let mut bytes = Vec::with_capacity(FRIENDLY_BYTES);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let crc = crc16(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        URL_SAFE.encode(bytes)
    }

    /// Canonical mainnet bounceable form.
    pub fn to_bounceable(&self) -> String {
        self.to_friendly(FriendlyFlags {
            bounceable: true,
            testnet: false,
        })
    }

    /// Parse the user-friendly form, returning the flags alongside.
    pub fn parse_friendly(text: &str) -> Result<(Self, FriendlyFlags), AddressError> {
        if text.len() != FRIENDLY_LEN {
            return Err(AddressError::InvalidFriendly(format!(
                "expected {FRIENDLY_LEN} characters, got {}",
                text.len()
            )));
        }
        let bytes = if text.contains(['-', '_']) {
            URL_SAFE.decode(text)
        } else {
            STANDARD.decode(text)
        }
        .map_err(|e| AddressError::InvalidFriendly(e.to_string()))?;

        let (body, crc) = bytes.split_at(FRIENDLY_BYTES - 2);
        if crc16(body).to_be_bytes().as_slice() != crc {
            return Err(AddressError::ChecksumMismatch);
        }

        let tag = body[0];
        let testnet = tag & TAG_TESTNET != 0;
        let bounceable = match tag & !TAG_TESTNET {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => return Err(AddressError::UnknownTag(tag)),
        };

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&body[2..]);
        Ok((
            Self::new(body[1] as i8, hash),
            FriendlyFlags { bounceable, testnet },
        ))
    }

    fn parse_raw(text: &str) -> Result<Self, AddressError> {
        let (wc, hash_hex) = text
            .split_once(':')
            .ok_or_else(|| AddressError::InvalidRaw(text.to_string()))?;
        let workchain: i8 = wc
            .parse()
            .map_err(|_| AddressError::InvalidRaw(format!("bad workchain {wc:?}")))?;
        let bytes = hex::decode(hash_hex).map_err(|e| AddressError::InvalidRaw(e.to_string()))?;
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidRaw("address must be 32 bytes".to_string()))?;
        Ok(Self::new(workchain, hash))
    }
}

/// Accepts both the raw `wc:hex` form and either friendly alphabet.
impl FromStr for InternalAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains(':') {
            Self::parse_raw(s)
        } else {
            Self::parse_friendly(s).map(|(addr, _)| addr)
        }
    }
}

impl fmt::Display for InternalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bounceable())
    }
}

impl MsgAddress {
    pub fn decode(slice: &mut CellSlice<'_>) -> Result<Self> {
        match slice.read_bits(2)? {
            0b00 => Ok(MsgAddress::None),
            0b01 => {
                let bit_len = slice.read_bits(9)? as usize;
                let bits = slice.read_raw_bits(bit_len)?;
                Ok(MsgAddress::External { bit_len, bits })
            }
            0b10 => {
                let anycast = read_anycast(slice)?;
                let workchain = slice.read_int(8)? as i8;
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&slice.read_bytes(32)?);
                Ok(MsgAddress::Internal(rewrite(workchain, hash, anycast)))
            }
            _ => {
                let anycast = read_anycast(slice)?;
                let addr_len = slice.read_bits(9)? as usize;
                let workchain = slice.read_int(32)?;
                let bits = slice.read_raw_bits(addr_len)?;
                if addr_len != 256 {
                    return Err(DecodeError::UnsupportedAddress(format!(
                        "addr_var of {addr_len} bits"
                    )));
                }
                let workchain = i8::try_from(workchain).map_err(|_| {
                    DecodeError::UnsupportedAddress(format!("workchain {workchain}"))
                })?;
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&bits);
                Ok(MsgAddress::Internal(rewrite(workchain, hash, anycast)))
            }
        }
    }

    pub fn store(&self, builder: &mut CellBuilder) -> Result<(), BuildError> {
        match self {
            MsgAddress::None => {
                builder.store_uint(0b00, 2)?;
            }
            MsgAddress::External { bit_len, bits } => {
                builder.store_uint(0b01, 2)?;
                builder.store_uint(*bit_len as u128, 9)?;
                builder.store_raw_bits(bits, *bit_len)?;
            }
            MsgAddress::Internal(addr) => addr.store(builder)?,
        }
        Ok(())
    }

    pub fn internal(&self) -> Option<&InternalAddress> {
        match self {
            MsgAddress::Internal(addr) => Some(addr),
            _ => None,
        }
    }
}

struct Anycast {
    depth: usize,
    prefix: Vec<u8>,
}

fn read_anycast(slice: &mut CellSlice<'_>) -> Result<Option<Anycast>> {
    if !slice.read_bit()? {
        return Ok(None);
    }
    // depth:(#<= 30) takes 5 bits
    let depth = slice.read_bits(5)? as usize;
    if depth == 0 || depth > 30 {
        return Err(DecodeError::UnsupportedAddress(format!("anycast depth {depth}")));
    }
    let prefix = slice.read_raw_bits(depth)?;
    Ok(Some(Anycast { depth, prefix }))
}

fn rewrite(workchain: i8, mut hash: [u8; 32], anycast: Option<Anycast>) -> InternalAddress {
    if let Some(Anycast { depth, prefix }) = anycast {
        for i in 0..depth {
            let mask = 0x80 >> (i % 8);
            if prefix[i / 8] & mask != 0 {
                hash[i / 8] |= mask;
            } else {
                hash[i / 8] &= !mask;
            }
        }
    }
    InternalAddress::new(workchain, hash)
}

/// Canonical bounceable text form of a `(workchain, address)` pair.
pub fn canonicalize(workchain: i8, raw_address: &[u8; 32]) -> String {
    InternalAddress::new(workchain, *raw_address).to_bounceable()
}

/// CRC-16/XMODEM over the tag, workchain and hash bytes.
fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
