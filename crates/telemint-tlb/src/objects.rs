//! Telemint TL-B records.
//!
//! ```text
//! telemint_text$_ len:(## 8) text:(bits (len * 8)) = TelemintText;
//! teleitem_last_bid bidder_address:MsgAddressInt bid:Grams bid_ts:uint32 = TeleitemLastBid;
//! teleitem_auction_state$_ last_bid:(Maybe ^TeleitemLastBid) min_bid:Grams
//!     end_time:uint32 = TeleitemAuctionState;
//! teleitem_auction_config$_ beneficiar_address:MsgAddressInt initial_min_bid:Grams
//!     max_bid:Grams min_bid_step:uint8 min_extend_time:uint32 duration:uint32
//!     = TeleitemAuctionConfig;
//! ```
//!
//! Fields are read strictly in schema order. Get-method replies flatten the
//! same records onto the stack, handled by the `from_stack` constructors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{InternalAddress, MsgAddress};
use crate::cell::CellSlice;
use crate::error::{DecodeError, Result};
use crate::stack::Stack;

/// Decoded `TelemintText`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemintText {
    pub text: String,
}

impl TelemintText {
    /// Take every remaining bit of the cell as UTF-8 text.
    pub fn decode(slice: &mut CellSlice<'_>) -> Result<Self> {
        let bits = slice.bits_remaining();
        if bits % 8 != 0 {
            return Err(DecodeError::UnalignedText(bits));
        }
        Self::from_bytes(slice.read_bytes(bits / 8)?)
    }

    /// Decode the length-prefixed form stored in item contents.
    pub fn decode_prefixed(slice: &mut CellSlice<'_>) -> Result<Self> {
        let mut probe = *slice;
        let len = probe.read_u8()? as usize;
        let text = Self::from_bytes(probe.read_bytes(len)?)?;
        *slice = probe;
        Ok(text)
    }

    /// Reply of `get_telemint_token_name`: `[cell text]`.
    pub fn from_stack(stack: &Stack) -> Result<Self> {
        Self::decode(&mut stack.cell(0)?.parser())
    }

    fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        String::from_utf8(bytes)
            .map(|text| Self { text })
            .map_err(|_| DecodeError::InvalidUtf8)
    }
}

/// Decoded `TeleitemLastBid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastBid {
    /// Canonical bounceable form.
    pub bidder_address: String,
    pub bid: u128,
    pub bid_ts: u32,
}

impl LastBid {
    pub fn decode(slice: &mut CellSlice<'_>) -> Result<Self> {
        let bidder = InternalAddress::decode(slice)?;
        let bid = slice.read_grams()?;
        let bid_ts = slice.read_u32()?;
        Ok(Self {
            bidder_address: bidder.to_bounceable(),
            bid,
            bid_ts,
        })
    }
}

/// Decoded `TeleitemAuctionState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionState {
    pub last_bid: Option<LastBid>,
    pub min_bid: u128,
    pub end_time: u32,
}

impl AuctionState {
    pub fn decode(slice: &mut CellSlice<'_>) -> Result<Self> {
        let last_bid = if slice.read_bit()? {
            Some(LastBid::decode(&mut slice.read_reference()?)?)
        } else {
            None
        };
        let min_bid = slice.read_grams()?;
        let end_time = slice.read_u32()?;
        Ok(Self {
            last_bid,
            min_bid,
            end_time,
        })
    }

    /// Reply of `get_telemint_auction_state`:
    /// `[cell bidder, num bid, num bid_ts, num min_bid, num end_time]`.
    ///
    /// A bidder of `addr_none` means nobody has bid yet.
    pub fn from_stack(stack: &Stack) -> Result<Self> {
        let bidder = MsgAddress::decode(&mut stack.cell(0)?.parser())?;
        let bid = stack.u128(1)?;
        let bid_ts = stack.u32(2)?;
        let min_bid = stack.u128(3)?;
        let end_time = stack.u32(4)?;

        let last_bid = match bidder {
            MsgAddress::None => None,
            MsgAddress::Internal(addr) => Some(LastBid {
                bidder_address: addr.to_bounceable(),
                bid,
                bid_ts,
            }),
            MsgAddress::External { .. } => {
                return Err(DecodeError::UnexpectedAddress("addr_extern"));
            }
        };

        Ok(Self {
            last_bid,
            min_bid,
            end_time,
        })
    }
}

/// Decoded `TeleitemAuctionConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionConfig {
    /// Canonical bounceable form.
    pub beneficiary_address: String,
    pub initial_min_bid: u128,
    pub max_bid: u128,
    pub min_bid_step: u8,
    pub min_extend_time: u32,
    pub duration: u32,
}

impl AuctionConfig {
    pub fn decode(slice: &mut CellSlice<'_>) -> Result<Self> {
        let beneficiary = InternalAddress::decode(slice)?;
        let initial_min_bid = slice.read_grams()?;
        let max_bid = slice.read_grams()?;
        let min_bid_step = slice.read_u8()?;
        let min_extend_time = slice.read_u32()?;
        let duration = slice.read_u32()?;
        Ok(Self {
            beneficiary_address: beneficiary.to_bounceable(),
            initial_min_bid,
            max_bid,
            min_bid_step,
            min_extend_time,
            duration,
        })
    }

    /// Reply of `get_telemint_auction_config`: `[cell beneficiary, num
    /// initial_min_bid, num max_bid, num min_bid_step, num min_extend_time,
    /// num duration]`.
    pub fn from_stack(stack: &Stack) -> Result<Self> {
        let beneficiary = InternalAddress::decode(&mut stack.cell(0)?.parser())?;
        Ok(Self {
            beneficiary_address: beneficiary.to_bounceable(),
            initial_min_bid: stack.u128(1)?,
            max_bid: stack.u128(2)?,
            min_bid_step: stack.u8(3)?,
            min_extend_time: stack.u32(4)?,
            duration: stack.u32(5)?,
        })
    }
}

impl fmt::Display for TelemintText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Display for LastBid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} at {}", self.bid, self.bidder_address, self.bid_ts)
    }
}

impl fmt::Display for AuctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_bid {
            Some(bid) => write!(f, "last bid {bid}")?,
            None => f.write_str("no bids")?,
        }
        write!(f, ", min bid {}, ends at {}", self.min_bid, self.end_time)
    }
}

impl fmt::Display for AuctionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "beneficiary {}, initial min bid {}, max bid {}, step {}%, extend {}s, duration {}s",
            self.beneficiary_address,
            self.initial_min_bid,
            self.max_bid,
            self.min_bid_step,
            self.min_extend_time,
            self.duration
        )
    }
}
