//! Telemint contract exit codes.
//!
//! Values follow `func/common.fc` of the telemint contracts. Codes outside
//! the table classify as [`ExitCode::Unknown`] with the raw value kept.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitCode {
    Success,
    SuccessAlt,
    InvalidLength,
    InvalidSignature,
    WrongSubwalletId,
    NotYetValidSignature,
    ExpiredSignature,
    NotEnoughFunds,
    WrongTopupComment,
    UnknownOp,
    Uninited,
    TooSmallStake,
    ExpectedOnchainContent,
    ForbiddenNotDeploy,
    ForbiddenNotStake,
    ForbiddenTopup,
    ForbiddenTransfer,
    ForbiddenChangeDns,
    ForbiddenTouch,
    /// No auction is live for the item.
    NoAuction,
    ForbiddenAuction,
    AlreadyHasStakes,
    AuctionAlreadyStarted,
    InvalidAuctionConfig,
    IncorrectWorkchain,
    NoFirstZeroByte,
    BadSubdomainLength,
    Unknown(i32),
}

const TABLE: &[(i32, ExitCode)] = &[
    (0, ExitCode::Success),
    (1, ExitCode::SuccessAlt),
    (201, ExitCode::InvalidLength),
    (202, ExitCode::InvalidSignature),
    (203, ExitCode::WrongSubwalletId),
    (204, ExitCode::NotYetValidSignature),
    (205, ExitCode::ExpiredSignature),
    (206, ExitCode::NotEnoughFunds),
    (207, ExitCode::WrongTopupComment),
    (208, ExitCode::UnknownOp),
    (210, ExitCode::Uninited),
    (211, ExitCode::TooSmallStake),
    (212, ExitCode::ExpectedOnchainContent),
    (213, ExitCode::ForbiddenNotDeploy),
    (214, ExitCode::ForbiddenNotStake),
    (215, ExitCode::ForbiddenTopup),
    (216, ExitCode::ForbiddenTransfer),
    (217, ExitCode::ForbiddenChangeDns),
    (218, ExitCode::ForbiddenTouch),
    (219, ExitCode::NoAuction),
    (220, ExitCode::ForbiddenAuction),
    (221, ExitCode::AlreadyHasStakes),
    (222, ExitCode::AuctionAlreadyStarted),
    (223, ExitCode::InvalidAuctionConfig),
    (333, ExitCode::IncorrectWorkchain),
    (413, ExitCode::NoFirstZeroByte),
    (70, ExitCode::BadSubdomainLength),
];

impl ExitCode {
    /// Classify a raw exit code. Never fails.
    pub fn classify(code: i32) -> Self {
        TABLE
            .iter()
            .find(|(value, _)| *value == code)
            .map(|(_, exit)| *exit)
            .unwrap_or(ExitCode::Unknown(code))
    }

    /// The raw integer this code was classified from.
    pub fn code(&self) -> i32 {
        match self {
            ExitCode::Unknown(code) => *code,
            known => TABLE
                .iter()
                .find(|(_, exit)| exit == known)
                .map(|(value, _)| *value)
                .unwrap_or_default(),
        }
    }

    /// Only an exit code of 0 lets a reply be decoded.
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "success",
            ExitCode::SuccessAlt => "alternative success",
            ExitCode::InvalidLength => "invalid length",
            ExitCode::InvalidSignature => "invalid signature",
            ExitCode::WrongSubwalletId => "wrong subwallet id",
            ExitCode::NotYetValidSignature => "signature not yet valid",
            ExitCode::ExpiredSignature => "signature expired",
            ExitCode::NotEnoughFunds => "not enough funds",
            ExitCode::WrongTopupComment => "wrong top-up comment",
            ExitCode::UnknownOp => "unknown op",
            ExitCode::Uninited => "item not initialized",
            ExitCode::TooSmallStake => "stake too small",
            ExitCode::ExpectedOnchainContent => "expected on-chain content",
            ExitCode::ForbiddenNotDeploy => "forbidden: not a deploy",
            ExitCode::ForbiddenNotStake => "forbidden: not a stake",
            ExitCode::ForbiddenTopup => "forbidden top-up",
            ExitCode::ForbiddenTransfer => "forbidden transfer",
            ExitCode::ForbiddenChangeDns => "forbidden DNS change",
            ExitCode::ForbiddenTouch => "forbidden touch",
            ExitCode::NoAuction => "no auction",
            ExitCode::ForbiddenAuction => "forbidden auction",
            ExitCode::AlreadyHasStakes => "already has stakes",
            ExitCode::AuctionAlreadyStarted => "auction already started",
            ExitCode::InvalidAuctionConfig => "invalid auction config",
            ExitCode::IncorrectWorkchain => "incorrect workchain",
            ExitCode::NoFirstZeroByte => "no leading zero byte",
            ExitCode::BadSubdomainLength => "bad subdomain length",
            ExitCode::Unknown(_) => "unknown error",
        }
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        Self::classify(code)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}
