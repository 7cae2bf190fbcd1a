use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::Error;

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

/// Minimal JSON-RPC 2.0 client shared by the HTTP adapters.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
}

impl JsonRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Calls `method`; a `null` result deserializes into `T` as-is so that
    /// callers can ask for an `Option`.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, Error> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let raw = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("{} response body: {}", method, e)))?;
        let body: RpcResponse = serde_json::from_slice(&raw).map_err(|e| {
            Error::InvalidResponse(format!(
                "{} returned a non JSON-RPC body ({}): {}",
                method,
                e,
                String::from_utf8_lossy(&raw[..raw.len().min(64)])
            ))
        })?;

        if let Some(err) = body.error {
            return Err(Error::Chain(format!(
                "{} failed with code {}: {}",
                method, err.code, err.message
            )));
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null))
            .map_err(|e| Error::InvalidResponse(format!("{} result: {}", method, e)))
    }
}

pub(crate) fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, Error> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| Error::InvalidResponse(format!("invalid hex in {}: {}", field, e)))
}
