use super::types::*;
use crate::account::types::Transition;
use crate::encoding::ControllerId;
use crate::error::LodestoneError;
use crate::rpc::RpcState;
use axum::{debug_handler, extract::State, Json};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Main dispatcher: routes incoming JSON-RPC requests to the correct handler.
#[debug_handler]
pub async fn handle_rpc_request(
    State(state): State<RpcState>,
    Json(req): Json<RpcRequest>,
) -> Json<RpcResponse> {
    debug!("RPC Request: method={}, id={}", req.method, req.id);

    let result = match req.method.as_str() {
        "getAccount" => handle_get_account(&state).await,
        "getOwner" => handle_get_owner(&state).await,
        "getOracle" => handle_get_oracle(&state).await,
        "getController" => handle_get_controller(&state).await,
        "getAttribute" => handle_get_attribute(&state).await,
        "getNonce" => handle_get_nonce(&state).await,
        "claimOwner" => handle_claim_owner(&state, req.params).await,
        "bindOracle" => handle_bind_oracle(&state, req.params).await,
        "setController" => handle_set_controller(&state, req.params).await,
        "updateController" => handle_update_controller(&state, req.params).await,
        "setAttribute" => handle_set_attribute(&state, req.params).await,
        "getNodeInfo" => handle_get_node_info(&state).await,
        "getVersion" => handle_get_version().await,
        _ => Err(RpcError {
            code: -32601,
            message: format!("Method not found: {}", req.method),
        }),
    };

    match result {
        Ok(val) => Json(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(val),
            error: None,
            id: req.id,
        }),
        Err(err) => Json(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(err),
            id: req.id,
        }),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: -32603,
        message: format!("Serialization failed: {}", e),
    })
}

fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError {
        code: -32602,
        message: format!("Invalid params: {}", e),
    })
}

fn domain_error(err: LodestoneError) -> RpcError {
    RpcError {
        code: -32000,
        message: err.to_string(),
    }
}

// --- Point reads ---

async fn handle_get_account(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let snapshot = store.snapshot(&state.account_id).map_err(domain_error)?;
    to_json(&snapshot)
}

async fn handle_get_owner(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let owner = store.owner(&state.account_id).map_err(domain_error)?;
    to_json(&owner)
}

async fn handle_get_oracle(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let oracle = store.oracle(&state.account_id).map_err(domain_error)?;
    to_json(&oracle)
}

async fn handle_get_controller(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let controller = store.controller(&state.account_id).map_err(domain_error)?;
    to_json(&controller.map(|c| c.as_str().to_string()))
}

async fn handle_get_attribute(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let attribute = store.attribute(&state.account_id).map_err(domain_error)?;
    to_json(&attribute)
}

async fn handle_get_nonce(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let nonce = store.nonce(&state.account_id).map_err(domain_error)?;
    to_json(&nonce)
}

async fn handle_get_node_info(state: &RpcState) -> Result<serde_json::Value, RpcError> {
    let store = state.store.lock().unwrap();
    let snapshot = store.snapshot(&state.account_id).map_err(domain_error)?;
    to_json(&NodeInfo {
        account: state.account_id.clone(),
        phase: snapshot.record.phase().to_string(),
        nonce: snapshot.record.nonce,
        record_version: snapshot.version,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn handle_get_version() -> Result<serde_json::Value, RpcError> {
    to_json(&env!("CARGO_PKG_VERSION").to_string())
}

// --- Transitions ---

fn submit(state: &RpcState, transition: Transition) -> Result<serde_json::Value, RpcError> {
    let outcome = {
        let mut store = state.store.lock().unwrap();
        store.submit(&state.account_id, &transition)
    };

    match outcome {
        Ok((committed, event)) => {
            if let Some(event) = event {
                // Best-effort: nobody listening is fine
                let _ = state.events.send(event);
            }
            to_json(&committed)
        }
        Err(err) => {
            warn!(
                "{} rejected on '{}': {}",
                transition.name(),
                state.account_id,
                err
            );
            Err(domain_error(err))
        }
    }
}

async fn handle_claim_owner(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: ClaimOwnerParams = parse_params(params)?;
    info!("claimOwner requested for '{}'", state.account_id);
    submit(
        state,
        Transition::ClaimOwner {
            new_owner: p.new_owner,
        },
    )
}

async fn handle_bind_oracle(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: BindOracleParams = parse_params(params)?;
    info!("bindOracle requested for '{}'", state.account_id);
    submit(
        state,
        Transition::BindOracle {
            new_oracle: p.new_oracle,
            owner_signature: p.owner_signature,
        },
    )
}

async fn handle_set_controller(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: SetControllerParams = parse_params(params)?;
    let controller = ControllerId::new(p.controller).map_err(domain_error)?;
    submit(
        state,
        Transition::SetController {
            controller,
            owner_signature: p.owner_signature,
        },
    )
}

async fn handle_update_controller(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: UpdateControllerParams = parse_params(params)?;
    let controller = ControllerId::new(p.controller).map_err(domain_error)?;
    let prior_controller = match p.prior_controller {
        Some(text) => Some(ControllerId::new(text).map_err(domain_error)?),
        None => None,
    };
    submit(
        state,
        Transition::UpdateController {
            controller,
            prior_controller,
            oracle_signature: p.oracle_signature,
        },
    )
}

async fn handle_set_attribute(
    state: &RpcState,
    params: serde_json::Value,
) -> Result<serde_json::Value, RpcError> {
    let p: SetAttributeParams = parse_params(params)?;
    submit(
        state,
        Transition::SetAttribute {
            value: p.value,
            oracle_signature: p.oracle_signature,
        },
    )
}
