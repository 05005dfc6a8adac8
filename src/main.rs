use clap::Parser;
use tracing_subscriber::EnvFilter;

use lodestone::cli::{self, Cli, Commands};
use lodestone::config::LodestoneConfig;
use lodestone::node::Node;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Some(Commands::Keys { cmd }) => {
            cli::keys::handle_keys_command(cmd);
        }
        Some(Commands::ClaimOwner { key }) => {
            cli::ops::handle_claim_owner(&cli.rpc_url, &key).await;
        }
        Some(Commands::BindOracle { key, oracle_pubkey }) => {
            cli::ops::handle_bind_oracle(&cli.rpc_url, &key, &oracle_pubkey).await;
        }
        Some(Commands::SetController { key, controller }) => {
            cli::ops::handle_set_controller(&cli.rpc_url, &key, &controller).await;
        }
        Some(Commands::UpdateController { key, controller }) => {
            cli::ops::handle_update_controller(&cli.rpc_url, &key, &controller).await;
        }
        Some(Commands::SetAttribute { key, value }) => {
            cli::ops::handle_set_attribute(&cli.rpc_url, &key, value).await;
        }
        Some(Commands::Show) => {
            cli::ops::handle_show(&cli.rpc_url).await;
        }
        Some(Commands::Node { cmd }) => match cmd {
            cli::node::NodeCommands::Start { config, rpc_port } => {
                run_node(&config, rpc_port).await;
            }
            cli::node::NodeCommands::Status => {
                cli::node::handle_status(&cli.rpc_url).await;
            }
        },
        None => {
            // No subcommand starts a node with the default config
            run_node("lodestone.toml", None).await;
        }
    }
}

async fn run_node(config_path: &str, rpc_port: Option<u16>) {
    let config = LodestoneConfig::load_or_default(config_path);
    let port = rpc_port.unwrap_or(config.node.rpc_port);

    let node = match Node::new(config) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Failed to start node: {}", e);
            return;
        }
    };

    node.start_rpc(port).await;
}
