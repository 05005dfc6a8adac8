// RPC client for making JSON-RPC requests against a lodestone node
use reqwest::Client;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct RpcClient {
    url: String,
    client: Client,
    request_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            request_id: AtomicU64::new(1),
        }
    }

    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("RPC request failed: {}", e))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse response: {}", e))?;

        if let Some(error) = json.get("error") {
            return Err(error["message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string());
        }

        Ok(json["result"].clone())
    }

    // --- Point reads ---

    pub async fn get_account(&self) -> Result<serde_json::Value, String> {
        self.call("getAccount", json!({})).await
    }

    pub async fn get_owner(&self) -> Result<Option<String>, String> {
        let result = self.call("getOwner", json!({})).await?;
        Ok(result.as_str().map(|s| s.to_string()))
    }

    pub async fn get_oracle(&self) -> Result<Option<String>, String> {
        let result = self.call("getOracle", json!({})).await?;
        Ok(result.as_str().map(|s| s.to_string()))
    }

    pub async fn get_controller(&self) -> Result<Option<String>, String> {
        let result = self.call("getController", json!({})).await?;
        Ok(result.as_str().map(|s| s.to_string()))
    }

    pub async fn get_attribute(&self) -> Result<Option<u64>, String> {
        let result = self.call("getAttribute", json!({})).await?;
        Ok(result.as_u64())
    }

    pub async fn get_nonce(&self) -> Result<u64, String> {
        let result = self.call("getNonce", json!({})).await?;
        result.as_u64().ok_or("Malformed nonce in response".to_string())
    }

    pub async fn get_node_info(&self) -> Result<serde_json::Value, String> {
        self.call("getNodeInfo", json!({})).await
    }

    // --- Transitions ---

    pub async fn claim_owner(&self, new_owner: &str) -> Result<serde_json::Value, String> {
        self.call("claimOwner", json!({ "new_owner": new_owner }))
            .await
    }

    pub async fn bind_oracle(
        &self,
        new_oracle: &str,
        owner_signature: &str,
    ) -> Result<serde_json::Value, String> {
        self.call(
            "bindOracle",
            json!({
                "new_oracle": new_oracle,
                "owner_signature": owner_signature,
            }),
        )
        .await
    }

    pub async fn set_controller(
        &self,
        controller: &str,
        owner_signature: &str,
    ) -> Result<serde_json::Value, String> {
        self.call(
            "setController",
            json!({
                "controller": controller,
                "owner_signature": owner_signature,
            }),
        )
        .await
    }

    pub async fn update_controller(
        &self,
        controller: &str,
        prior_controller: Option<&str>,
        oracle_signature: &str,
    ) -> Result<serde_json::Value, String> {
        self.call(
            "updateController",
            json!({
                "controller": controller,
                "prior_controller": prior_controller,
                "oracle_signature": oracle_signature,
            }),
        )
        .await
    }

    pub async fn set_attribute(
        &self,
        value: u64,
        oracle_signature: &str,
    ) -> Result<serde_json::Value, String> {
        self.call(
            "setAttribute",
            json!({
                "value": value,
                "oracle_signature": oracle_signature,
            }),
        )
        .await
    }
}
