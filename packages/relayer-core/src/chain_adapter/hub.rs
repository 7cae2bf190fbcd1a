use async_trait::async_trait;

use super::rpc::{decode_hex, JsonRpcClient};
use super::{HubAccount, HubChain, OuterTransfer};
use crate::codec::encode_signature_array;
use crate::Error;

/// Hub chain client speaking JSON-RPC to a hub node.
///
/// Transaction signing happens on the node side with the wallet account
/// named by `signer`; this client only ships the call fields.
pub struct HttpHubClient {
    rpc: JsonRpcClient,
}

impl HttpHubClient {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc: JsonRpcClient::new(rpc_url),
        }
    }
}

#[async_trait]
impl HubChain for HttpHubClient {
    async fn get_storage(&self, contract: &str, key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        let value: Option<String> = self
            .rpc
            .call("getstorage", serde_json::json!([contract, hex::encode(key)]))
            .await?;
        match value {
            Some(v) if !v.is_empty() => decode_hex("storage value", &v).map(Some),
            _ => Ok(None),
        }
    }

    async fn import_outer_transfer(
        &self,
        transfer: &OuterTransfer,
        signer: &HubAccount,
    ) -> Result<String, Error> {
        self.rpc
            .call(
                "importOuterTransfer",
                serde_json::json!([{
                    "source_chain_id": transfer.source_chain_id,
                    "payload": hex::encode(&transfer.payload),
                    "height": transfer.source_height,
                    "proof": hex::encode(encode_signature_array(&transfer.signatures)),
                    "relayer_address": hex::encode(&transfer.relayer_address),
                    "extra": hex::encode(&transfer.trust_chain_bytes),
                    "signer": signer.to_hex(),
                }]),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_get_storage_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":""}"#)
            .create_async()
            .await;

        let client = HttpHubClient::new(&server.url());
        assert_eq!(client.get_storage("01", b"key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_storage_sends_hex_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "method": "getstorage",
                "params": ["0001", "6b6579"]
            })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"6400000000000000"}"#)
            .create_async()
            .await;

        let client = HttpHubClient::new(&server.url());
        let value = client.get_storage("0001", b"key").await.unwrap();

        assert_eq!(value, Some(100u64.to_le_bytes().to_vec()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_import_outer_transfer_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "method": "importOuterTransfer",
                "params": [{
                    "source_chain_id": 5,
                    "payload": "abcd",
                    "height": 101,
                    "proof": "0201aa01bb",
                    "relayer_address": "0102",
                    "extra": "00",
                    "signer": "0102"
                }]
            })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"deadbeef"}"#)
            .create_async()
            .await;

        let client = HttpHubClient::new(&server.url());
        let transfer = OuterTransfer {
            source_chain_id: 5,
            payload: vec![0xab, 0xcd],
            source_height: 101,
            signatures: vec![vec![0xaa], vec![0xbb]],
            relayer_address: vec![1, 2],
            trust_chain_bytes: vec![0],
        };
        let signer = HubAccount { address: vec![1, 2] };

        let tx = client.import_outer_transfer(&transfer, &signer).await.unwrap();

        assert_eq!(tx, "deadbeef");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_import_outer_transfer_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-1,"message":"verify sig failed"}}"#)
            .create_async()
            .await;

        let client = HttpHubClient::new(&server.url());
        let transfer = OuterTransfer {
            source_chain_id: 1,
            payload: vec![],
            source_height: 1,
            signatures: vec![],
            relayer_address: vec![],
            trust_chain_bytes: vec![],
        };
        let result = client
            .import_outer_transfer(&transfer, &HubAccount { address: vec![9] })
            .await;
        assert!(matches!(result, Err(Error::Chain(_))));
    }

    #[tokio::test]
    async fn test_proxy_html_body_is_retryable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html>502 upstream reset</html>")
            .create_async()
            .await;

        let client = HttpHubClient::new(&server.url());
        let transfer = OuterTransfer {
            source_chain_id: 1,
            payload: vec![1],
            source_height: 1,
            signatures: vec![],
            relayer_address: vec![],
            trust_chain_bytes: vec![],
        };
        let err = client
            .import_outer_transfer(&transfer, &HubAccount { address: vec![9] })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
        assert!(err.is_retryable());
    }
}
