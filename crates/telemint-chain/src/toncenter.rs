//! Toncenter HTTP API client (`/runGetMethod`).

use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use telemint_tlb::boc;

use crate::error::ChainError;
use crate::{ClientConfig, GetMethodClient, RunGetMethodResult, Stack, StackEntry};

pub struct ToncenterClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl ToncenterClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn method_url(&self) -> String {
        format!("{}/runGetMethod", self.endpoint)
    }
}

#[async_trait::async_trait]
impl GetMethodClient for ToncenterClient {
    async fn run_get_method(
        &self,
        address: &str,
        method: &str,
        stack: &[StackEntry],
    ) -> Result<RunGetMethodResult> {
        let body = json!({
            "address": address,
            "method": method,
            "stack": encode_stack(stack),
        });

        let mut request = self.http.post(self.method_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-Key", key);
        }

        debug!(address, method, "calling toncenter runGetMethod");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let result = parse_response(&text).map_err(|e| {
            warn!(address, method, %status, "toncenter request failed: {e}");
            e
        })?;
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    result: Option<RunGetMethodBody>,
    error: Option<String>,
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RunGetMethodBody {
    gas_used: Option<u64>,
    exit_code: i32,
    #[serde(default)]
    stack: Vec<Value>,
}

/// Parse a `/runGetMethod` response body.
pub fn parse_response(text: &str) -> std::result::Result<RunGetMethodResult, ChainError> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| ChainError::Rpc(format!("unexpected response ({e}): {text}")))?;

    if !envelope.ok {
        return Err(ChainError::Api {
            code: envelope.code,
            message: envelope.error.unwrap_or_else(|| "unknown error".to_string()),
        });
    }
    let body = envelope
        .result
        .ok_or_else(|| ChainError::Rpc("response has no result".to_string()))?;

    let entries = body
        .stack
        .iter()
        .map(parse_stack_entry)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RunGetMethodResult {
        exit_code: body.exit_code,
        stack: Stack::new(entries),
        gas_used: body.gas_used,
    })
}

/// Parse one `[tag, payload]` stack entry.
pub fn parse_stack_entry(value: &Value) -> std::result::Result<StackEntry, ChainError> {
    let pair = value
        .as_array()
        .filter(|items| items.len() == 2)
        .ok_or_else(|| ChainError::MalformedStackEntry(value.to_string()))?;
    let tag = pair[0]
        .as_str()
        .ok_or_else(|| ChainError::MalformedStackEntry(value.to_string()))?;

    match tag {
        "num" => {
            let hex = pair[1]
                .as_str()
                .ok_or_else(|| ChainError::MalformedStackEntry(value.to_string()))?;
            Ok(StackEntry::number_from_hex(hex)?)
        }
        "cell" => {
            let bytes = pair[1]
                .get("bytes")
                .and_then(Value::as_str)
                .ok_or_else(|| ChainError::MalformedStackEntry(value.to_string()))?;
            Ok(StackEntry::cell_from_boc_base64(bytes)?)
        }
        other => Err(ChainError::UnsupportedStackEntry(other.to_string())),
    }
}

/// Encode call arguments the way `/runGetMethod` expects them.
pub fn encode_stack(stack: &[StackEntry]) -> Vec<Value> {
    stack
        .iter()
        .map(|entry| match entry {
            StackEntry::Number(n) if *n < 0 => json!(["num", format!("-0x{:x}", n.unsigned_abs())]),
            StackEntry::Number(n) => json!(["num", format!("0x{n:x}")]),
            StackEntry::Cell(cell) => json!(["tvm.Cell", boc::to_base64(cell)]),
        })
        .collect()
}
