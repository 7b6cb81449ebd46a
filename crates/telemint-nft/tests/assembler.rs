//! Assembler tests against an in-memory get-method client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use telemint_chain::{ExitCode, GetMethodClient, RunGetMethodResult};
use telemint_nft::{NftError, TelemintNft};
use telemint_tlb::{CellBuilder, DecodeError, InternalAddress, MsgAddress, Stack, StackEntry};

const ITEM: &str = "EQCA14o1-VWhS2efqoh_9M1b_A9DtKTuoqfmkn83AbJzwnPi";

enum Reply {
    Exit(i32, Vec<StackEntry>),
    Unreachable,
}

#[derive(Default)]
struct MockClient {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl MockClient {
    fn reply(mut self, method: &str, exit_code: i32, stack: Vec<StackEntry>) -> Self {
        self.replies
            .insert(method.to_string(), Reply::Exit(exit_code, stack));
        self
    }

    fn unreachable(mut self, method: &str) -> Self {
        self.replies.insert(method.to_string(), Reply::Unreachable);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GetMethodClient for MockClient {
    async fn run_get_method(
        &self,
        address: &str,
        method: &str,
        stack: &[StackEntry],
    ) -> Result<RunGetMethodResult> {
        assert_eq!(address, ITEM);
        assert!(stack.is_empty());
        self.calls.lock().unwrap().push(method.to_string());

        match self.replies.get(method) {
            Some(Reply::Exit(exit_code, entries)) => Ok(RunGetMethodResult {
                exit_code: *exit_code,
                stack: Stack::new(entries.clone()),
                gas_used: Some(2000),
            }),
            Some(Reply::Unreachable) => Err(anyhow!("connection refused")),
            None => Err(anyhow!("unexpected method {method}")),
        }
    }
}

fn text_cell(text: &str) -> StackEntry {
    let mut b = CellBuilder::new();
    b.store_bytes(text.as_bytes()).unwrap();
    StackEntry::Cell(Arc::new(b.build().unwrap()))
}

fn address_cell(address: &MsgAddress) -> StackEntry {
    let mut b = CellBuilder::new();
    address.store(&mut b).unwrap();
    StackEntry::Cell(Arc::new(b.build().unwrap()))
}

fn bidder() -> InternalAddress {
    InternalAddress::new(0, [0x11; 32])
}

fn beneficiary() -> InternalAddress {
    InternalAddress::new(0, [0x22; 32])
}

fn auction_state_stack() -> Vec<StackEntry> {
    vec![
        address_cell(&MsgAddress::Internal(bidder())),
        StackEntry::Number(1_500_000_000),
        StackEntry::Number(1_699_990_000),
        StackEntry::Number(0x64),
        StackEntry::Number(0x5F5E100),
    ]
}

fn auction_config_stack() -> Vec<StackEntry> {
    vec![
        address_cell(&MsgAddress::Internal(beneficiary())),
        StackEntry::Number(1_000_000_000),
        StackEntry::Number(0),
        StackEntry::Number(5),
        StackEntry::Number(3600),
        StackEntry::Number(604_800),
    ]
}

#[tokio::test]
async fn test_full_auction_snapshot() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .reply("get_telemint_auction_state", 0, auction_state_stack())
        .reply("get_telemint_auction_config", 0, auction_config_stack());

    let snapshot = TelemintNft::new(ITEM).load(&client).await.unwrap();

    assert_eq!(snapshot.address, ITEM);
    assert_eq!(snapshot.token_name.as_deref(), Some("durov"));

    let state = snapshot.auction_state.as_ref().unwrap();
    let bid = state.last_bid.as_ref().unwrap();
    assert_eq!(bid.bidder_address, bidder().to_bounceable());
    assert_eq!(bid.bid, 1_500_000_000);
    assert_eq!(bid.bid_ts, 1_699_990_000);
    assert_eq!(state.min_bid, 100);
    assert_eq!(state.end_time, 100_000_000);

    let config = snapshot.auction_config.as_ref().unwrap();
    assert_eq!(config.beneficiary_address, beneficiary().to_bounceable());
    assert_eq!(config.initial_min_bid, 1_000_000_000);
    assert_eq!(config.max_bid, 0);
    assert_eq!(config.min_bid_step, 5);
    assert_eq!(config.min_extend_time, 3600);
    assert_eq!(config.duration, 604_800);

    assert_eq!(
        client.calls(),
        vec![
            "get_telemint_token_name",
            "get_telemint_auction_state",
            "get_telemint_auction_config",
        ]
    );
}

#[tokio::test]
async fn test_no_auction_skips_config() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .reply("get_telemint_auction_state", 219, vec![]);

    let snapshot = TelemintNft::new(ITEM).load(&client).await.unwrap();

    assert_eq!(snapshot.token_name.as_deref(), Some("durov"));
    assert!(snapshot.auction_state.is_none());
    assert!(snapshot.auction_config.is_none());
    assert_eq!(
        client.calls(),
        vec!["get_telemint_token_name", "get_telemint_auction_state"]
    );
}

#[tokio::test]
async fn test_no_bids_yet() {
    let mut state = auction_state_stack();
    state[0] = address_cell(&MsgAddress::None);
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .reply("get_telemint_auction_state", 0, state)
        .reply("get_telemint_auction_config", 0, auction_config_stack());

    let snapshot = TelemintNft::new(ITEM).load(&client).await.unwrap();

    let state = snapshot.auction_state.unwrap();
    assert!(state.last_bid.is_none());
    assert_eq!(state.min_bid, 100);
    assert!(snapshot.auction_config.is_some());
}

#[tokio::test]
async fn test_token_name_failure_stops_loading() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 202, vec![])
        .reply("get_telemint_auction_state", 0, auction_state_stack());

    let err = TelemintNft::new(ITEM).load(&client).await.unwrap_err();

    match &err {
        NftError::Method(e) => {
            assert_eq!(e.method_name, "get_telemint_token_name");
            assert_eq!(e.exit_code, ExitCode::InvalidSignature);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(client.calls(), vec!["get_telemint_token_name"]);
}

#[tokio::test]
async fn test_unknown_exit_code_propagates() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .reply("get_telemint_auction_state", 999, vec![]);

    let err = TelemintNft::new(ITEM).load(&client).await.unwrap_err();

    assert!(matches!(
        err,
        NftError::Method(ref e) if e.exit_code == ExitCode::Unknown(999)
    ));
    assert_eq!(err.method_name(), "get_telemint_auction_state");
}

#[tokio::test]
async fn test_config_failure_is_hard_error() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .reply("get_telemint_auction_state", 0, auction_state_stack())
        .reply("get_telemint_auction_config", 219, vec![]);

    let err = TelemintNft::new(ITEM).load(&client).await.unwrap_err();
    assert!(matches!(
        err,
        NftError::Method(ref e) if e.exit_code == ExitCode::NoAuction
            && e.method_name == "get_telemint_auction_config"
    ));
}

#[tokio::test]
async fn test_decode_error_names_method() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .reply("get_telemint_auction_state", 0, auction_state_stack()[..3].to_vec());

    let err = TelemintNft::new(ITEM).load(&client).await.unwrap_err();

    match err {
        NftError::Decode { method_name, source } => {
            assert_eq!(method_name, "get_telemint_auction_state");
            assert_eq!(source, DecodeError::MissingEntry(3));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_utf8_token_name() {
    let mut b = CellBuilder::new();
    b.store_bytes(&[0xFF, 0xFE]).unwrap();
    let bad = StackEntry::Cell(Arc::new(b.build().unwrap()));
    let client = MockClient::default().reply("get_telemint_token_name", 0, vec![bad]);

    let err = TelemintNft::new(ITEM).load(&client).await.unwrap_err();
    assert!(matches!(
        err,
        NftError::Decode { source: DecodeError::InvalidUtf8, .. }
    ));
}

#[tokio::test]
async fn test_transport_error_names_method() {
    let client = MockClient::default()
        .reply("get_telemint_token_name", 0, vec![text_cell("durov")])
        .unreachable("get_telemint_auction_state");

    let err = TelemintNft::new(ITEM).load(&client).await.unwrap_err();

    match err {
        NftError::Transport { method_name, source } => {
            assert_eq!(method_name, "get_telemint_auction_state");
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_boxed_client() {
    let client: Box<dyn GetMethodClient> = Box::new(
        MockClient::default()
            .reply("get_telemint_token_name", 0, vec![text_cell("")])
            .reply("get_telemint_auction_state", 219, vec![]),
    );
    let snapshot = TelemintNft::new(ITEM).load(&client).await.unwrap();
    assert_eq!(snapshot.token_name.as_deref(), Some(""));
}
