//! Controller limb codec and canonical message bytes.
//!
//! A controller address travels on the wire as two 256-bit limbs. Each limb
//! carries up to 31 payload bytes; its last byte is a length marker of
//! `payload_len + 1`. The marker is nonzero for every accepted input, so the
//! all-zero limb pair can never collide with a real value and is reserved to
//! mean "absent".

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::LodestoneError;

pub const LIMB_BYTES: usize = 32;
pub const LIMB_PAYLOAD: usize = 31;
pub const CONTROLLER_MAX_BYTES: usize = 2 * LIMB_PAYLOAD;

pub type Limb = [u8; LIMB_BYTES];
pub const ZERO_LIMB: Limb = [0u8; LIMB_BYTES];

/// Trait for objects that have a canonical binary representation for Signing.
/// careful: This must be deterministic across platforms/versions.
pub trait CanonicalSerialize {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.canonical_serialize(&mut buf).expect("memory write failed");
        buf
    }
}

// --- Primitives ---

impl CanonicalSerialize for u8 {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[*self])
    }
}

impl CanonicalSerialize for u64 {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl CanonicalSerialize for String {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let bytes = self.as_bytes();
        let len = bytes.len() as u32;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(bytes)
    }
}

impl CanonicalSerialize for Limb {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self)
    }
}

impl<T: CanonicalSerialize> CanonicalSerialize for Vec<T> {
    fn canonical_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let len = self.len() as u32;
        writer.write_all(&len.to_le_bytes())?;
        for item in self {
            item.canonical_serialize(writer)?;
        }
        Ok(())
    }
}

/// A short textual controller address with a fixed two-limb wire form.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ControllerId(String);

impl ControllerId {
    pub fn new(text: impl Into<String>) -> Result<Self, LodestoneError> {
        let text = text.into();
        if text.is_empty() {
            return Err(LodestoneError::EncodingError(
                "controller must not be empty".to_string(),
            ));
        }
        if text.len() > CONTROLLER_MAX_BYTES {
            return Err(LodestoneError::EncodingError(format!(
                "controller is {} bytes, max {}",
                text.len(),
                CONTROLLER_MAX_BYTES
            )));
        }
        Ok(ControllerId(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Injective: distinct accepted inputs produce distinct limb pairs, and
    /// no accepted input ever produces a zero limb.
    pub fn to_limbs(&self) -> (Limb, Limb) {
        let bytes = self.0.as_bytes();
        let split = bytes.len().min(LIMB_PAYLOAD);
        (pack_limb(&bytes[..split]), pack_limb(&bytes[split..]))
    }

    /// The all-zero pair decodes to `None` (field never set). Anything else
    /// must be a canonical encoding or the input is rejected.
    pub fn from_limbs(first: Limb, second: Limb) -> Result<Option<Self>, LodestoneError> {
        if first == ZERO_LIMB && second == ZERO_LIMB {
            return Ok(None);
        }

        let head = unpack_limb(&first)?;
        let tail = unpack_limb(&second)?;
        if !tail.is_empty() && head.len() != LIMB_PAYLOAD {
            return Err(LodestoneError::EncodingError(
                "non-canonical limb split".to_string(),
            ));
        }

        let mut bytes = head;
        bytes.extend(tail);
        let text = String::from_utf8(bytes).map_err(|_| {
            LodestoneError::EncodingError("controller is not valid UTF-8".to_string())
        })?;
        ControllerId::new(text).map(Some)
    }
}

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn pack_limb(payload: &[u8]) -> Limb {
    debug_assert!(payload.len() <= LIMB_PAYLOAD);
    let mut limb = ZERO_LIMB;
    limb[..payload.len()].copy_from_slice(payload);
    limb[LIMB_BYTES - 1] = payload.len() as u8 + 1;
    limb
}

fn unpack_limb(limb: &Limb) -> Result<Vec<u8>, LodestoneError> {
    let marker = limb[LIMB_BYTES - 1] as usize;
    if marker == 0 || marker > LIMB_PAYLOAD + 1 {
        return Err(LodestoneError::EncodingError(
            "bad limb length marker".to_string(),
        ));
    }
    let len = marker - 1;
    if limb[len..LIMB_BYTES - 1].iter().any(|b| *b != 0) {
        return Err(LodestoneError::EncodingError(
            "nonzero limb padding".to_string(),
        ));
    }
    Ok(limb[..len].to_vec())
}
