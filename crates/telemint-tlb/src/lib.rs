//! Telemint TL-B Decoding
//!
//! Bit-precise cell reading, bag-of-cells parsing, message addresses and the
//! Telemint auction records returned by NFT item get-methods.

pub mod address;
pub mod boc;
pub mod builder;
pub mod cell;
pub mod error;
pub mod objects;
pub mod stack;

pub use address::{canonicalize, AddressError, FriendlyFlags, InternalAddress, MsgAddress};
pub use builder::{byte_width, CellBuilder};
pub use cell::{Cell, CellSlice, GRAMS_MAX_BYTES, MAX_CELL_BITS, MAX_CELL_REFS};
pub use error::{BocError, BuildError, DecodeError};
pub use objects::{AuctionConfig, AuctionState, LastBid, TelemintText};
pub use stack::{Stack, StackEntry};
