// RPC types for JSON-RPC 2.0 protocol
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: u64,
}

#[derive(Serialize, Debug)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: u64,
}

#[derive(Serialize, Debug, Clone)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

// Method-specific parameter types

#[derive(Deserialize, Debug)]
pub struct ClaimOwnerParams {
    pub new_owner: String,
}

#[derive(Deserialize, Debug)]
pub struct BindOracleParams {
    pub new_oracle: String,
    pub owner_signature: String,
}

#[derive(Deserialize, Debug)]
pub struct SetControllerParams {
    pub controller: String,
    pub owner_signature: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateControllerParams {
    pub controller: String,
    /// The controller value the oracle read before signing; absent if it
    /// read an unset field
    pub prior_controller: Option<String>,
    pub oracle_signature: String,
}

#[derive(Deserialize, Debug)]
pub struct SetAttributeParams {
    pub value: u64,
    pub oracle_signature: String,
}

#[derive(Serialize, Debug)]
pub struct NodeInfo {
    pub account: String,
    pub phase: String,
    pub nonce: u64,
    pub record_version: u64,
    pub version: String,
}
