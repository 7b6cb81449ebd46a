use thiserror::Error;

use telemint_tlb::DecodeError;

use crate::exit_code::ExitCode;

/// A get-method finished with a non-success exit code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("method {method_name:?} exited with {exit_code}")]
pub struct MethodError {
    pub method_name: String,
    pub exit_code: ExitCode,
}

impl MethodError {
    pub fn new(method_name: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            method_name: method_name.into(),
            exit_code,
        }
    }
}

/// Error types
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("API error {code:?}: {message}")]
    Api { code: Option<i64>, message: String },

    #[error("Unsupported stack entry type {0:?}")]
    UnsupportedStackEntry(String),

    #[error("Malformed stack entry: {0}")]
    MalformedStackEntry(String),

    #[error("Stack decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
