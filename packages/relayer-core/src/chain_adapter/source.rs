use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

use super::rpc::{decode_hex, JsonRpcClient};
use super::SourceChain;
use crate::{types::CrossChainEvent, Error};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 200;

#[derive(Debug, Deserialize)]
struct RawEvent {
    data: String,
    tx_hash: String,
}

/// Source chain client speaking JSON-RPC to the chain's event gateway.
pub struct HttpSourceClient {
    rpc: JsonRpcClient,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpSourceClient {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc: JsonRpcClient::new(rpc_url),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    async fn retry_with_backoff<F, Fut, T>(&self, operation: F) -> Result<T, Error>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, Error>>,
    {
        let mut retries = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                // Only transport failures are worth repeating.
                Err(e @ Error::Network(_)) => {
                    retries += 1;
                    if retries >= self.max_retries {
                        return Err(e);
                    }
                    sleep(self.retry_delay * 2u32.pow(retries - 1)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SourceChain for HttpSourceClient {
    async fn latest_height(&self) -> Result<u64, Error> {
        self.retry_with_backoff(move || async move {
            self.rpc
                .call::<u64>("getLatestHeight", serde_json::json!([]))
                .await
        })
        .await
    }

    async fn fetch_events(&self, height: u64) -> Result<Vec<CrossChainEvent>, Error> {
        let raw: Vec<RawEvent> = self
            .retry_with_backoff(move || async move {
                self.rpc
                    .call::<Option<Vec<RawEvent>>>("getCrossChainEvents", serde_json::json!([height]))
                    .await
                    .map(Option::unwrap_or_default)
            })
            .await?;

        raw.into_iter()
            .map(|e| {
                Ok(CrossChainEvent {
                    source_height: height,
                    payload: decode_hex("data", &e.data)?,
                    source_tx_id: decode_hex("tx_hash", &e.tx_hash)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_latest_height() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({"method": "getLatestHeight"})))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":110}"#)
            .create_async()
            .await;

        let client = HttpSourceClient::new(&server.url());
        assert_eq!(client.latest_height().await.unwrap(), 110);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_events_keeps_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "method": "getCrossChainEvents",
                "params": [42]
            })))
            .with_status(200)
            .with_body(
                r#"{"jsonrpc":"2.0","id":1,"result":[
                    {"data":"0a0b","tx_hash":"01"},
                    {"data":"0x0c","tx_hash":"02"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = HttpSourceClient::new(&server.url());
        let events = client.fetch_events(42).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload, vec![0x0a, 0x0b]);
        assert_eq!(events[1].payload, vec![0x0c]);
        assert_eq!(events[1].source_tx_id, vec![0x02]);
        assert!(events.iter().all(|e| e.source_height == 42));
    }

    #[tokio::test]
    async fn test_null_result_is_empty_block() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .create_async()
            .await;

        let client = HttpSourceClient::new(&server.url());
        assert!(client.fetch_events(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rpc_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"pruned"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpSourceClient::new(&server.url());
        assert!(matches!(client.fetch_events(1).await, Err(Error::Chain(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_failure_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = HttpSourceClient::new(&server.url()).with_max_retries(2);
        assert!(matches!(client.latest_height().await, Err(Error::Network(_))));
        mock.assert_async().await;
    }
}
