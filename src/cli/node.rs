use clap::Subcommand;

use crate::client::RpcClient;

#[derive(Subcommand, Debug, Clone)]
pub enum NodeCommands {
    /// Start the node (storage + RPC server)
    Start {
        #[arg(long, default_value = "lodestone.toml")]
        config: String,
        /// Override the configured RPC port
        #[arg(long)]
        rpc_port: Option<u16>,
    },
    /// Query a running node for its status
    Status,
}

pub async fn handle_status(rpc_url: &str) {
    let client = RpcClient::new(rpc_url.to_string());
    match client.get_node_info().await {
        Ok(info) => {
            println!("Account:        {}", info["account"].as_str().unwrap_or("?"));
            println!("Phase:          {}", info["phase"].as_str().unwrap_or("?"));
            println!("Nonce:          {}", info["nonce"].as_u64().unwrap_or(0));
            println!(
                "Record version: {}",
                info["record_version"].as_u64().unwrap_or(0)
            );
            println!("Node version:   {}", info["version"].as_str().unwrap_or("?"));
        }
        Err(e) => println!("Error: {}", e),
    }
}
