use crate::identity::{Identity, KeyRole};
use clap::Subcommand;
use std::io::{self, Write};
use std::path::Path;

#[derive(Subcommand, Debug, Clone)]
pub enum KeysCommands {
    /// Generate a new secure identity
    Generate {
        /// Role of the identity (owner, oracle, observer)
        #[clap(long)]
        role: String,

        /// Name of the key file (e.g. "owner_key")
        #[clap(long)]
        name: String,
    },
    /// Print the public key of a key file
    ExportPub {
        #[clap(long)]
        name: String,
    },
    /// Inspect a key file (verify password and integrity)
    Inspect {
        #[clap(long)]
        name: String,
    },
}

pub fn handle_keys_command(cmd: KeysCommands) {
    match cmd {
        KeysCommands::Generate { role, name } => {
            let role_enum = match role.parse::<KeyRole>() {
                Ok(r) => r,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            };

            let filename = format!("{}.json", name);
            if Path::new(&filename).exists() {
                println!(
                    "Error: File '{}' already exists. Aborting to prevent overwrite.",
                    filename
                );
                return;
            }

            println!("Creating new {} identity: '{}'", role_enum, name);
            let password = match prompt_password("Enter encryption password: ") {
                Ok(p) => p,
                Err(e) => {
                    println!("Error: {}", e);
                    return;
                }
            };

            match Identity::new(&name, role_enum, &password) {
                Ok((identity, mnemonic)) => {
                    if let Err(e) = identity.save(Path::new(&filename)) {
                        println!("Error saving identity: {}", e);
                        return;
                    }
                    println!("Identity saved to '{}'", filename);
                    println!("Public key: {}", identity.public_key);
                    println!();
                    println!("Recovery mnemonic (write this down, shown once):");
                    println!("  {}", mnemonic);
                }
                Err(e) => println!("Error creating identity: {}", e),
            }
        }
        KeysCommands::ExportPub { name } => match unlock(&name) {
            Ok(identity) => println!("{}", identity.public_key),
            Err(e) => println!("Error: {}", e),
        },
        KeysCommands::Inspect { name } => match unlock(&name) {
            Ok(identity) => {
                println!("Name:       {}", identity.name);
                println!("Role:       {}", identity.role);
                println!("Public key: {}", identity.public_key);
                println!("Integrity:  OK");
            }
            Err(e) => println!("Error: {}", e),
        },
    }
}

/// Prompt for the password and decrypt a key file
pub fn unlock(name: &str) -> Result<Identity, String> {
    let filename = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{}.json", name)
    };
    let path = Path::new(&filename);
    if !path.exists() {
        return Err(format!("Key file '{}' not found", filename));
    }

    let password = prompt_password("Enter password: ")?;
    Identity::load_and_decrypt(path, password.trim())
}

fn prompt_password(prompt: &str) -> Result<String, String> {
    print!("{}", prompt);
    io::stdout().flush().map_err(|e| e.to_string())?;
    let mut password = String::new();
    io::stdin()
        .read_line(&mut password)
        .map_err(|e| e.to_string())?;
    Ok(password.trim().to_string())
}
