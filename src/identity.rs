use crate::crypto::KeyPair;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use ed25519_dalek::{Signature, Signer, SigningKey};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Copy)]
pub enum KeyRole {
    Owner,
    Oracle,
    Observer,
}

impl std::fmt::Display for KeyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyRole::Owner => write!(f, "owner"),
            KeyRole::Oracle => write!(f, "oracle"),
            KeyRole::Observer => write!(f, "observer"),
        }
    }
}

impl std::str::FromStr for KeyRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(KeyRole::Owner),
            "oracle" => Ok(KeyRole::Oracle),
            "observer" => Ok(KeyRole::Observer),
            _ => Err(format!(
                "Invalid role: {}. Allowed: owner, oracle, observer",
                s
            )),
        }
    }
}

/// A signer identity kept outside the core: the engine only ever sees the
/// public key and signatures produced from one of these.
#[derive(Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub role: KeyRole,
    pub public_key: String, // Hex encoded
    #[serde(skip_serializing, skip_deserializing)]
    inner_key: Option<SigningKey>, // Loaded in memory only
    encrypted_mnemonic: Vec<u8>,
    encryption_salt: Vec<u8>,
}

impl Identity {
    /// Create a new Identity (generates fresh keys)
    pub fn new(name: &str, role: KeyRole, password: &str) -> Result<(Self, String), String> {
        let mnemonic = KeyPair::generate_mnemonic();
        Self::from_mnemonic(name, role, &mnemonic, password)
    }

    /// Create Identity from an existing mnemonic (recovery or import)
    pub fn from_mnemonic(
        name: &str,
        role: KeyRole,
        mnemonic: &str,
        password: &str,
    ) -> Result<(Self, String), String> {
        let keypair = KeyPair::from_mnemonic(mnemonic)?;
        let pubkey_hex = keypair.public_key_hex();

        let (encrypted, salt) = Self::encrypt_mnemonic(mnemonic, password)?;

        let identity = Identity {
            name: name.to_string(),
            role,
            public_key: pubkey_hex,
            inner_key: Some(keypair.signing_key),
            encrypted_mnemonic: encrypted,
            encryption_salt: salt,
        };

        Ok((identity, mnemonic.to_string()))
    }

    fn encrypt_mnemonic(mnemonic: &str, password: &str) -> Result<(Vec<u8>, Vec<u8>), String> {
        let mut salt = [0u8; 16];
        use rand::RngCore;
        OsRng.fill_bytes(&mut salt);

        let mut key = [0u8; 32];
        pbkdf2::<Hmac<Sha256>>(password.as_bytes(), &salt, 100_000, &mut key);

        let cipher = Aes256Gcm::new(&key.into());
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, mnemonic.as_bytes())
            .map_err(|e| format!("Encryption error: {:?}", e))?;

        let mut blob = Vec::new();
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok((blob, salt.to_vec()))
    }

    pub fn load_and_decrypt(path: &Path, password: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        let mut identity: Identity = serde_json::from_str(&content).map_err(|e| e.to_string())?;

        if identity.encrypted_mnemonic.len() < 12 {
            return Err("Invalid encrypted data file".to_string());
        }

        let nonce_bytes = &identity.encrypted_mnemonic[0..12];
        let ciphertext = &identity.encrypted_mnemonic[12..];

        let mut key = [0u8; 32];
        pbkdf2::<Hmac<Sha256>>(password.as_bytes(), &identity.encryption_salt, 100_000, &mut key);

        let cipher = Aes256Gcm::new(&key.into());
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| "Wrong password or corrupted file".to_string())?;

        let mnemonic = String::from_utf8(plaintext).map_err(|_| "Invalid UTF8".to_string())?;

        let keypair = KeyPair::from_mnemonic(&mnemonic)?;

        // The decrypted key must reproduce the stored public key
        if keypair.public_key_hex() != identity.public_key {
            return Err("Decrypted key does not match stored public key".to_string());
        }

        identity.inner_key = Some(keypair.signing_key);
        Ok(identity)
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        // Only the serializable parts are written (encrypted blob, no inner key)
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Sign a message (identity must be unlocked)
    pub fn sign(&self, message: &[u8]) -> Result<Signature, String> {
        let k = self.inner_key.as_ref().ok_or("Identity is locked")?;
        Ok(k.sign(message))
    }

    pub fn sign_hex(&self, message: &[u8]) -> Result<String, String> {
        let sig = self.sign(message)?;
        Ok(hex::encode(sig.to_bytes()))
    }

    /// Convert to Crypto KeyPair (consumed)
    pub fn into_keypair(self) -> Result<KeyPair, String> {
        let sk = self.inner_key.ok_or("Identity locked")?;
        Ok(KeyPair { signing_key: sk })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_with_pubkey_hex;

    #[test]
    fn new_identity_signs_verifiably() {
        let (identity, _mnemonic) = Identity::new("owner-1", KeyRole::Owner, "pw").unwrap();
        let sig = identity.sign_hex(b"msg").unwrap();
        assert!(verify_with_pubkey_hex(b"msg", &sig, &identity.public_key));
    }

    #[test]
    fn mnemonic_round_trip_preserves_key() {
        let (identity, mnemonic) = Identity::new("oracle-1", KeyRole::Oracle, "pw").unwrap();
        let (restored, _) =
            Identity::from_mnemonic("oracle-1", KeyRole::Oracle, &mnemonic, "other-pw").unwrap();
        assert_eq!(identity.public_key, restored.public_key);
    }

    #[test]
    fn role_parses_from_string() {
        assert_eq!("owner".parse::<KeyRole>().unwrap(), KeyRole::Owner);
        assert!("admin".parse::<KeyRole>().is_err());
    }
}
