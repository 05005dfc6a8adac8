//! The five account operations, driven end to end: read the committed state
//! the signature must bind to, sign off-line with a local identity, submit.

use crate::account::engine;
use crate::client::RpcClient;
use crate::encoding::ControllerId;

use super::keys::unlock;

pub async fn handle_claim_owner(rpc_url: &str, key_file: &str) {
    let identity = match unlock(key_file) {
        Ok(id) => id,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let client = RpcClient::new(rpc_url.to_string());
    match client.claim_owner(&identity.public_key).await {
        Ok(snapshot) => {
            println!("Owner claimed: {}", identity.public_key);
            print_snapshot(&snapshot);
        }
        Err(e) => println!("Rejected: {}", e),
    }
}

pub async fn handle_bind_oracle(rpc_url: &str, key_file: &str, oracle_pubkey: &str) {
    let identity = match unlock(key_file) {
        Ok(id) => id,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let client = RpcClient::new(rpc_url.to_string());
    // The signature binds to the nonce read here; if another transition
    // settles first, the node rejects and we must re-read
    let nonce = match client.get_nonce().await {
        Ok(n) => n,
        Err(e) => {
            println!("Error reading nonce: {}", e);
            return;
        }
    };

    let message = match engine::bind_oracle_message(oracle_pubkey, nonce) {
        Ok(m) => m,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    let signature = match identity.sign_hex(&message) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    match client.bind_oracle(oracle_pubkey, &signature).await {
        Ok(snapshot) => {
            println!("Oracle bound: {}", oracle_pubkey);
            print_snapshot(&snapshot);
        }
        Err(e) => println!("Rejected: {}", e),
    }
}

pub async fn handle_set_controller(rpc_url: &str, key_file: &str, controller: &str) {
    let ctrl = match ControllerId::new(controller) {
        Ok(c) => c,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    let identity = match unlock(key_file) {
        Ok(id) => id,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let message = engine::set_controller_message(&ctrl);
    let signature = match identity.sign_hex(&message) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let client = RpcClient::new(rpc_url.to_string());
    match client.set_controller(ctrl.as_str(), &signature).await {
        Ok(snapshot) => {
            println!("Controller set to '{}'", ctrl);
            print_snapshot(&snapshot);
        }
        Err(e) => println!("Rejected: {}", e),
    }
}

pub async fn handle_update_controller(rpc_url: &str, key_file: &str, controller: &str) {
    let ctrl = match ControllerId::new(controller) {
        Ok(c) => c,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };
    let identity = match unlock(key_file) {
        Ok(id) => id,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let client = RpcClient::new(rpc_url.to_string());
    // Read the state this attestation binds to: the committed controller and
    // the nonce. A racing transition invalidates the signature, on purpose.
    let nonce = match client.get_nonce().await {
        Ok(n) => n,
        Err(e) => {
            println!("Error reading nonce: {}", e);
            return;
        }
    };
    let prior_text = match client.get_controller().await {
        Ok(c) => c,
        Err(e) => {
            println!("Error reading controller: {}", e);
            return;
        }
    };
    let prior = match &prior_text {
        Some(text) => match ControllerId::new(text.clone()) {
            Ok(c) => Some(c),
            Err(e) => {
                println!("Error: node returned bad controller: {}", e);
                return;
            }
        },
        None => None,
    };

    let message = engine::update_controller_message(&ctrl, prior.as_ref(), nonce);
    let signature = match identity.sign_hex(&message) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    match client
        .update_controller(ctrl.as_str(), prior_text.as_deref(), &signature)
        .await
    {
        Ok(snapshot) => {
            println!("Controller updated to '{}'", ctrl);
            print_snapshot(&snapshot);
        }
        Err(e) => println!("Rejected: {}", e),
    }
}

pub async fn handle_set_attribute(rpc_url: &str, key_file: &str, value: u64) {
    let identity = match unlock(key_file) {
        Ok(id) => id,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    let client = RpcClient::new(rpc_url.to_string());
    let info = match client.get_node_info().await {
        Ok(i) => i,
        Err(e) => {
            println!("Error reading node info: {}", e);
            return;
        }
    };
    let Some(account_id) = info["account"].as_str() else {
        println!("Error: node info is missing the account id");
        return;
    };

    let message = engine::set_attribute_message(value, account_id);
    let signature = match identity.sign_hex(&message) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: {}", e);
            return;
        }
    };

    match client.set_attribute(value, &signature).await {
        Ok(snapshot) => {
            println!("Attribute attested: {}", value);
            print_snapshot(&snapshot);
        }
        Err(e) => println!("Rejected: {}", e),
    }
}

pub async fn handle_show(rpc_url: &str) {
    let client = RpcClient::new(rpc_url.to_string());
    match client.get_account().await {
        Ok(snapshot) => print_snapshot(&snapshot),
        Err(e) => println!("Error: {}", e),
    }
}

fn print_snapshot(snapshot: &serde_json::Value) {
    let record = &snapshot["record"];
    println!("Account:    {}", record["id"].as_str().unwrap_or("?"));
    println!(
        "Owner:      {}",
        record["owner"].as_str().unwrap_or("<absent>")
    );
    println!(
        "Oracle:     {}",
        record["oracle"].as_str().unwrap_or("<absent>")
    );
    println!(
        "Controller: {}",
        record["controller"].as_str().unwrap_or("<absent>")
    );
    match record["attribute"].as_u64() {
        Some(v) => println!("Attribute:  {}", v),
        None => println!("Attribute:  <absent>"),
    }
    println!(
        "Nonce:      {}  (version {})",
        record["nonce"].as_u64().unwrap_or(0),
        snapshot["version"].as_u64().unwrap_or(0)
    );
}
