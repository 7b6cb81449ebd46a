//! Telemint NFT Auction Inspector
//!
//! Loads the token name, auction state and auction config of a telemint
//! item through any [`GetMethodClient`] and merges them into a snapshot.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use telemint_chain::{
    run_method, ExitCode, GetMethodClient, MethodError, MethodOutcome, Stack, GET_METHOD_PREFIX,
};
use telemint_tlb::{AuctionConfig, AuctionState, DecodeError, TelemintText};

pub const TOKEN_NAME: &str = "token_name";
pub const AUCTION_STATE: &str = "auction_state";
pub const AUCTION_CONFIG: &str = "auction_config";

/// Error types
#[derive(Error, Debug)]
pub enum NftError {
    #[error(transparent)]
    Method(#[from] MethodError),

    #[error("failed to decode {method_name} reply: {source}")]
    Decode {
        method_name: String,
        #[source]
        source: DecodeError,
    },

    #[error("failed to invoke {method_name}: {source}")]
    Transport {
        method_name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl NftError {
    /// Full name of the get-method that failed.
    pub fn method_name(&self) -> &str {
        match self {
            NftError::Method(err) => &err.method_name,
            NftError::Decode { method_name, .. } | NftError::Transport { method_name, .. } => {
                method_name
            }
        }
    }
}

/// Everything known about one telemint item.
///
/// `auction_config` is only ever set together with `auction_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NftAuctionSnapshot {
    pub address: String,
    pub token_name: Option<String>,
    pub auction_state: Option<AuctionState>,
    pub auction_config: Option<AuctionConfig>,
}

impl NftAuctionSnapshot {
    pub fn has_auction(&self) -> bool {
        self.auction_state.is_some()
    }
}

impl fmt::Display for NftAuctionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TelemintNFT at {}", self.address)?;
        match &self.token_name {
            Some(name) => writeln!(f, "Token Name: {name}")?,
            None => writeln!(f, "Token Name: none")?,
        }
        match &self.auction_state {
            Some(state) => writeln!(f, "Auction State: {state}")?,
            None => writeln!(f, "Auction State: none")?,
        }
        match &self.auction_config {
            Some(config) => write!(f, "Auction Config: {config}"),
            None => write!(f, "Auction Config: none"),
        }
    }
}

/// A telemint item contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemintNft {
    address: String,
}

impl TelemintNft {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Run the three get-methods in order and assemble the snapshot.
    ///
    /// The auction config is skipped when no auction is live.
    pub async fn load<C>(&self, client: &C) -> Result<NftAuctionSnapshot, NftError>
    where
        C: GetMethodClient + ?Sized,
    {
        let token_name = self.load_token_name(client).await?;
        let auction_state = self.load_auction_state(client).await?;
        let auction_config = match auction_state {
            Some(_) => Some(self.load_auction_config(client).await?),
            None => None,
        };

        info!(
            address = %self.address,
            token_name = %token_name,
            has_auction = auction_state.is_some(),
            "loaded telemint item"
        );

        Ok(NftAuctionSnapshot {
            address: self.address.clone(),
            token_name: Some(token_name),
            auction_state,
            auction_config,
        })
    }

    pub async fn load_token_name<C>(&self, client: &C) -> Result<String, NftError>
    where
        C: GetMethodClient + ?Sized,
    {
        let stack = self.call(client, TOKEN_NAME).await?.map_err(NftError::Method)?;
        let text = TelemintText::from_stack(&stack).map_err(|e| decode_error(TOKEN_NAME, e))?;
        Ok(text.text)
    }

    /// `None` when the item reports no live auction.
    pub async fn load_auction_state<C>(&self, client: &C) -> Result<Option<AuctionState>, NftError>
    where
        C: GetMethodClient + ?Sized,
    {
        let stack = match self.call(client, AUCTION_STATE).await? {
            Ok(stack) => stack,
            Err(err) if err.exit_code == ExitCode::NoAuction => {
                debug!(address = %self.address, "no auction is live");
                return Ok(None);
            }
            Err(err) => return Err(NftError::Method(err)),
        };
        AuctionState::from_stack(&stack)
            .map(Some)
            .map_err(|e| decode_error(AUCTION_STATE, e))
    }

    pub async fn load_auction_config<C>(&self, client: &C) -> Result<AuctionConfig, NftError>
    where
        C: GetMethodClient + ?Sized,
    {
        let stack = self.call(client, AUCTION_CONFIG).await?.map_err(NftError::Method)?;
        AuctionConfig::from_stack(&stack).map_err(|e| decode_error(AUCTION_CONFIG, e))
    }

    async fn call<C>(&self, client: &C, name: &str) -> Result<Result<Stack, MethodError>, NftError>
    where
        C: GetMethodClient + ?Sized,
    {
        let outcome = run_method(client, &self.address, name)
            .await
            .map_err(|source| NftError::Transport {
                method_name: full_name(name),
                source,
            })?;
        Ok(match outcome {
            MethodOutcome::Success(stack) => Ok(stack),
            MethodOutcome::Failed(err) => Err(err),
        })
    }
}

fn full_name(name: &str) -> String {
    format!("{GET_METHOD_PREFIX}{name}")
}

fn decode_error(name: &str, source: DecodeError) -> NftError {
    NftError::Decode {
        method_name: full_name(name),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(with_auction: bool) -> NftAuctionSnapshot {
        NftAuctionSnapshot {
            address: "EQAt".to_string(),
            token_name: Some("durov".to_string()),
            auction_state: with_auction.then(|| AuctionState {
                last_bid: None,
                min_bid: 100,
                end_time: 1_700_000_000,
            }),
            auction_config: None,
        }
    }

    #[test]
    fn test_display_without_auction() {
        assert_eq!(
            snapshot(false).to_string(),
            "TelemintNFT at EQAt\nToken Name: durov\nAuction State: none\nAuction Config: none"
        );
    }

    #[test]
    fn test_display_with_auction() {
        let text = snapshot(true).to_string();
        assert!(text.contains("Auction State: no bids, min bid 100, ends at 1700000000"));
        assert!(snapshot(true).has_auction());
    }

    #[test]
    fn test_error_names_method() {
        let err = decode_error(AUCTION_CONFIG, DecodeError::MissingEntry(5));
        assert_eq!(err.method_name(), "get_telemint_auction_config");

        let err = NftError::from(MethodError::new("get_telemint_token_name", ExitCode::Uninited));
        assert_eq!(err.method_name(), "get_telemint_token_name");
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(snapshot(true)).unwrap();
        assert_eq!(json["token_name"], "durov");
        assert_eq!(json["auction_state"]["last_bid"], serde_json::Value::Null);
        assert_eq!(json["auction_config"], serde_json::Value::Null);
    }
}
