pub mod keys;
pub mod node;
pub mod ops;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lodestone")]
#[command(about = "Lodestone identity-anchor CLI", long_about = None)]
pub struct Cli {
    /// RPC endpoint of the node
    #[arg(long, global = true, default_value = "http://127.0.0.1:9000")]
    pub rpc_url: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Key management
    Keys {
        #[command(subcommand)]
        cmd: keys::KeysCommands,
    },
    /// Claim the account owner slot (first come, only once)
    ClaimOwner {
        /// Identity file of the claiming owner
        #[arg(long)]
        key: String,
    },
    /// Bind the trusted oracle (owner-signed, one-shot)
    BindOracle {
        /// Identity file of the current owner
        #[arg(long)]
        key: String,
        /// Hex public key of the oracle to bind
        #[arg(long)]
        oracle_pubkey: String,
    },
    /// Set the controller as the owner (unconditional overwrite)
    SetController {
        /// Identity file of the current owner
        #[arg(long)]
        key: String,
        #[arg(long)]
        controller: String,
    },
    /// Update the controller as the oracle (bound to the committed value)
    UpdateController {
        /// Identity file of the bound oracle
        #[arg(long)]
        key: String,
        #[arg(long)]
        controller: String,
    },
    /// Attest the numeric attribute as the oracle
    SetAttribute {
        /// Identity file of the bound oracle
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: u64,
    },
    /// Show the committed account record
    Show,
    /// Node operations
    Node {
        #[command(subcommand)]
        cmd: node::NodeCommands,
    },
}
