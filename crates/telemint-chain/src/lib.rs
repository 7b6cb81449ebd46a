//! Telemint Get-Method Client Abstraction
//!
//! Runs read-only get-methods against NFT item contracts and classifies
//! their exit codes. Stack entries are handed back already typed.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use telemint_tlb::{Stack, StackEntry};

pub mod error;
pub mod exit_code;

#[cfg(feature = "toncenter")]
pub mod toncenter;

pub use error::{ChainError, MethodError};
pub use exit_code::ExitCode;

#[cfg(feature = "toncenter")]
pub use toncenter::ToncenterClient;

/// Prefix shared by every telemint item get-method.
pub const GET_METHOD_PREFIX: &str = "get_telemint_";

/// Raw outcome of one get-method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunGetMethodResult {
    pub exit_code: i32,
    pub stack: Stack,
    pub gas_used: Option<u64>,
}

/// Unified get-method client trait
#[async_trait::async_trait]
pub trait GetMethodClient: Send + Sync {
    /// Run `method` on the contract at `address` with the given arguments.
    ///
    /// Errors are transport failures only; a non-zero exit code is a
    /// successful invocation.
    async fn run_get_method(
        &self,
        address: &str,
        method: &str,
        stack: &[StackEntry],
    ) -> Result<RunGetMethodResult>;
}

#[async_trait::async_trait]
impl<T: GetMethodClient + ?Sized> GetMethodClient for Box<T> {
    async fn run_get_method(
        &self,
        address: &str,
        method: &str,
        stack: &[StackEntry],
    ) -> Result<RunGetMethodResult> {
        (**self).run_get_method(address, method, stack).await
    }
}

/// Outcome of [`run_method`].
#[derive(Debug)]
pub enum MethodOutcome {
    Success(Stack),
    Failed(MethodError),
}

/// Run `get_telemint_{name}` with no arguments and classify the exit code.
///
/// The outer `Result` carries transport failures; the inner outcome carries
/// the classified exit code.
pub async fn run_method<C>(client: &C, address: &str, name: &str) -> Result<MethodOutcome>
where
    C: GetMethodClient + ?Sized,
{
    let method = format!("{GET_METHOD_PREFIX}{name}");
    let result = client.run_get_method(address, &method, &[]).await?;
    let exit_code = ExitCode::classify(result.exit_code);

    debug!(
        address,
        method = %method,
        exit_code = result.exit_code,
        gas_used = ?result.gas_used,
        entries = result.stack.len(),
        "get-method finished"
    );

    if exit_code.is_success() {
        Ok(MethodOutcome::Success(result.stack))
    } else {
        Ok(MethodOutcome::Failed(MethodError::new(method, exit_code)))
    }
}

/// Client backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    Toncenter,
}

/// Configuration for get-method clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_type: ClientType,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

pub const DEFAULT_ENDPOINT: &str = "https://toncenter.com/api/v2";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_type: ClientType::Toncenter,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Read `TONCENTER_ENDPOINT`, `TONCENTER_API_KEY` and
    /// `TONCENTER_TIMEOUT_MS`, keeping defaults for unset variables.
    pub fn from_env() -> std::result::Result<Self, ChainError> {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("TONCENTER_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(api_key) = std::env::var("TONCENTER_API_KEY") {
            if !api_key.is_empty() {
                config.api_key = Some(api_key);
            }
        }
        if let Ok(timeout) = std::env::var("TONCENTER_TIMEOUT_MS") {
            config.timeout_ms = timeout
                .parse()
                .map_err(|_| ChainError::Config(format!("invalid TONCENTER_TIMEOUT_MS {timeout:?}")))?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ChainError> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| ChainError::Config(format!("invalid endpoint {:?}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChainError::Config(format!(
                "endpoint must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ChainError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Client factory
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_client(config: ClientConfig) -> Result<Box<dyn GetMethodClient>> {
        config.validate()?;
        match config.client_type {
            ClientType::Toncenter => {
                #[cfg(feature = "toncenter")]
                {
                    let client = ToncenterClient::new(config)?;
                    Ok(Box::new(client))
                }
                #[cfg(not(feature = "toncenter"))]
                {
                    Err(anyhow::anyhow!("Toncenter support not compiled in"))
                }
            }
        }
    }
}
