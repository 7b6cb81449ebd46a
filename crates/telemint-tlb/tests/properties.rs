//! Property-based tests for the cell cursor and Telemint decoders.

use std::sync::Arc;

use proptest::prelude::*;
use telemint_tlb::cell::var_uint_len_bits;
use telemint_tlb::{
    boc, byte_width, AuctionState, Cell, CellBuilder, FriendlyFlags, InternalAddress, LastBid,
    MAX_CELL_BITS,
};

/// Random cell payload: data bytes plus a bit length that fits them.
fn cell_strategy() -> impl Strategy<Value = Cell> {
    prop::collection::vec(any::<u8>(), 0..=128).prop_flat_map(|data| {
        let max_bits = (data.len() * 8).min(MAX_CELL_BITS);
        (Just(data), 0..=max_bits)
            .prop_map(|(data, bits)| Cell::new(data, bits, Vec::new()).unwrap())
    })
}

/// A byte width and a value that fits in it.
fn var_uint_strategy() -> impl Strategy<Value = (usize, u128)> {
    (1usize..=16).prop_flat_map(|max_bytes| {
        let bits = max_bytes * 8;
        let mask = if bits == 128 { u128::MAX } else { (1u128 << bits) - 1 };
        (Just(max_bytes), any::<u128>().prop_map(move |v| v & mask))
    })
}

fn bits_of(data: &[u8], len: usize) -> Vec<bool> {
    (0..len).map(|i| (data[i / 8] >> (7 - i % 8)) & 1 == 1).collect()
}

proptest! {
    #[test]
    fn test_read_partitions_cell(cell in cell_strategy(), split in 0usize..=128) {
        let n = split.min(cell.bit_len());
        let mut s = cell.parser();

        let head = s.read_bits(n).unwrap();
        let rest_len = s.bits_remaining();
        let tail = s.read_raw_bits(rest_len).unwrap();

        prop_assert_eq!(n + rest_len, cell.bit_len());
        prop_assert_eq!(s.bits_remaining(), 0);

        let mut seen: Vec<bool> = (0..n).rev().map(|i| (head >> i) & 1 == 1).collect();
        seen.extend(bits_of(&tail, rest_len));
        prop_assert_eq!(seen, bits_of(cell.data(), cell.bit_len()));
    }

    #[test]
    fn test_read_past_end_always_fails(cell in cell_strategy(), extra in 1usize..=64) {
        let mut s = cell.parser();
        let want = cell.bit_len() + extra;
        if want <= 128 {
            prop_assert!(s.read_bits(want).is_err());
        } else {
            prop_assert!(s.read_raw_bits(want).is_err());
        }
        prop_assert_eq!(s.bit_offset(), 0);
    }

    #[test]
    fn test_var_uint_round_trips((max_bytes, value) in var_uint_strategy()) {
        let mut b = CellBuilder::new();
        b.store_var_uint(value, max_bytes).unwrap();
        let cell = b.build().unwrap();

        let mut s = cell.parser();
        prop_assert_eq!(s.read_var_uint(max_bytes).unwrap(), value);
        prop_assert_eq!(
            s.bit_offset(),
            var_uint_len_bits(max_bytes) + 8 * byte_width(value)
        );
    }

    #[test]
    fn test_truncated_var_uint_leaves_cursor(
        (max_bytes, value) in var_uint_strategy().prop_filter("non-zero", |(_, v)| *v != 0),
        cut in 1usize..=8
    ) {
        let mut b = CellBuilder::new();
        b.store_var_uint(value, max_bytes).unwrap();
        let full = b.build().unwrap();
        let short_len = full.bit_len() - cut.min(8 * byte_width(value));
        let short = Cell::new(full.data().to_vec(), short_len, Vec::new()).unwrap();

        let mut s = short.parser();
        prop_assert!(s.read_var_uint(max_bytes).is_err());
        prop_assert_eq!(s.bit_offset(), 0);
    }

    #[test]
    fn test_auction_state_consumption(
        has_bid in any::<bool>(),
        min_bid in 0u128..(1u128 << 120),
        end_time in any::<u32>(),
        bid in 0u128..(1u128 << 120),
        bid_ts in any::<u32>(),
        hash in any::<[u8; 32]>()
    ) {
        let mut b = CellBuilder::new();
        b.store_bit(has_bid).unwrap();
        if has_bid {
            let mut inner = CellBuilder::new();
            InternalAddress::new(0, hash).store(&mut inner).unwrap();
            inner.store_grams(bid).unwrap();
            inner.store_uint(bid_ts as u128, 32).unwrap();
            b.store_ref(Arc::new(inner.build().unwrap())).unwrap();
        }
        b.store_grams(min_bid).unwrap();
        b.store_uint(end_time as u128, 32).unwrap();
        let cell = b.build().unwrap();

        let mut s = cell.parser();
        let state = AuctionState::decode(&mut s).unwrap();

        prop_assert_eq!(s.bit_offset(), 1 + 4 + 8 * byte_width(min_bid) + 32);
        prop_assert_eq!(s.ref_offset(), has_bid as usize);
        prop_assert_eq!(state.min_bid, min_bid);
        prop_assert_eq!(state.end_time, end_time);
        let expected = has_bid.then(|| LastBid {
            bidder_address: InternalAddress::new(0, hash).to_bounceable(),
            bid,
            bid_ts,
        });
        prop_assert_eq!(state.last_bid, expected);
    }

    #[test]
    fn test_boc_preserves_tree(cells in prop::collection::vec(cell_strategy(), 1..=4)) {
        let mut iter = cells.into_iter();
        let root_cell = iter.next().unwrap();
        let mut b = CellBuilder::new();
        b.store_raw_bits(root_cell.data(), root_cell.bit_len()).unwrap();
        for child in iter {
            b.store_ref(Arc::new(child)).unwrap();
        }
        let root = Arc::new(b.build().unwrap());

        for with_crc in [false, true] {
            let parsed = boc::deserialize_single(&boc::serialize(&root, with_crc)).unwrap();
            prop_assert_eq!(&*parsed, &*root);
        }
    }

    #[test]
    fn test_boc_garbage_is_an_error_not_a_panic(
        flags in any::<u8>(),
        body in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        let mut bytes = vec![0xb5, 0xee, 0x9c, 0x72, flags];
        bytes.extend_from_slice(&body);
        let _ = boc::deserialize(&bytes);
    }

    #[test]
    fn test_friendly_address_parses_back(
        workchain in any::<i8>(),
        hash in any::<[u8; 32]>(),
        bounceable in any::<bool>(),
        testnet in any::<bool>()
    ) {
        let addr = InternalAddress::new(workchain, hash);
        let flags = FriendlyFlags { bounceable, testnet };
        let text = addr.to_friendly(flags);

        prop_assert_eq!(text.len(), 48);
        prop_assert_eq!(InternalAddress::parse_friendly(&text).unwrap(), (addr, flags));
    }
}
