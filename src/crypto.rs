use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;

pub struct KeyPair {
    pub signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new Ed25519 keypair
    pub fn new() -> Self {
        let mut csprng = OsRng;
        KeyPair {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Generate a new 12-word mnemonic
    pub fn generate_mnemonic() -> String {
        let mut entropy = [0u8; 16]; // 128 bits = 12 words
        let mut csprng = OsRng;
        csprng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy).expect("Failed to create mnemonic");
        mnemonic.to_string()
    }

    /// Restore keypair from mnemonic
    pub fn from_mnemonic(phrase: &str) -> Result<Self, String> {
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
            .map_err(|e| format!("Invalid mnemonic: {}", e))?;
        let seed = mnemonic.to_seed("");

        // Use first 32 bytes for the Ed25519 secret
        let secret: [u8; 32] = seed[0..32].try_into().expect("seed is 64 bytes");
        Ok(KeyPair {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify a signature against a message using this keypair's public key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key
            .verifying_key()
            .verify(message, signature)
            .is_ok()
    }

    /// Get the public key
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a message and return hex string
    pub fn sign_hex(&self, message: &[u8]) -> String {
        let signature = self.sign(message);
        hex::encode(signature.to_bytes())
    }

    /// Get public key as hex string
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().to_bytes())
    }
}

/// Parse a hex-encoded Ed25519 public key, rejecting malformed input
pub fn parse_pubkey_hex(pubkey_hex: &str) -> Option<VerifyingKey> {
    let bytes = hex::decode(pubkey_hex).ok()?;
    let arr: [u8; 32] = bytes.try_into().ok()?;
    VerifyingKey::from_bytes(&arr).ok()
}

/// Verify a signature against a message with a provided public key (hex)
pub fn verify_with_pubkey_hex(message: &[u8], signature_hex: &str, pubkey_hex: &str) -> bool {
    let Some(pubkey) = parse_pubkey_hex(pubkey_hex) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&sig_bytes) else {
        return false;
    };
    pubkey.verify(message, &signature).is_ok()
}
