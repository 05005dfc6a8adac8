//! Authorization engine: the signature-gated transition logic.
//!
//! `apply` is the pure build phase: it takes a committed snapshot and a
//! transition, checks encoding, preconditions and the required signature in
//! that order, and produces the next record without touching storage.
//! Settlement (the version-checked commit) lives in `store`.

use ed25519_dalek::VerifyingKey;

use crate::account::types::{AccountEvent, AccountRecord, Transition};
use crate::crypto;
use crate::encoding::{CanonicalSerialize, ControllerId, Limb, ZERO_LIMB};
use crate::error::LodestoneError;

/// Outcome of a validated transition: the next record plus an optional
/// observer event.
#[derive(Clone, Debug)]
pub struct Applied {
    pub record: AccountRecord,
    pub event: Option<AccountEvent>,
}

/// Validate `transition` against the committed `record` and produce the next
/// record. Any failure discards the whole transition; the input is never
/// mutated.
pub fn apply(record: &AccountRecord, transition: &Transition) -> Result<Applied, LodestoneError> {
    let mut next = record.clone();
    let mut event = None;

    match transition {
        Transition::ClaimOwner { new_owner } => {
            require_pubkey(new_owner)?;
            if record.owner.is_some() {
                return Err(LodestoneError::AlreadyBound("owner"));
            }
            next.owner = Some(new_owner.clone());
        }

        Transition::BindOracle {
            new_oracle,
            owner_signature,
        } => {
            require_pubkey(new_oracle)?;
            let owner = record
                .owner
                .as_deref()
                .ok_or_else(|| precondition("owner is not set"))?;
            if record.oracle.is_some() {
                return Err(LodestoneError::AlreadyBound("oracle"));
            }
            let message = bind_oracle_message(new_oracle, record.nonce)?;
            verify(owner, &message, owner_signature)?;

            next.oracle = Some(new_oracle.clone());
            // Anything recorded before an oracle existed was unattested
            next.attribute = None;
            event = Some(AccountEvent::OracleBound {
                account: record.id.clone(),
                oracle: new_oracle.clone(),
            });
        }

        Transition::SetController {
            controller,
            owner_signature,
        } => {
            let owner = record
                .owner
                .as_deref()
                .ok_or_else(|| precondition("owner is not set"))?;
            let message = set_controller_message(controller);
            verify(owner, &message, owner_signature)?;

            next.controller = Some(controller.clone());
        }

        Transition::UpdateController {
            controller,
            prior_controller,
            oracle_signature,
        } => {
            let oracle = record
                .oracle
                .as_deref()
                .ok_or_else(|| precondition("oracle is not set"))?;
            if prior_controller != &record.controller {
                return Err(precondition(&format!(
                    "controller moved: asserted {}, committed {}",
                    display_controller(prior_controller.as_ref()),
                    display_controller(record.controller.as_ref()),
                )));
            }
            let message =
                update_controller_message(controller, prior_controller.as_ref(), record.nonce);
            verify(oracle, &message, oracle_signature)?;

            next.controller = Some(controller.clone());
        }

        Transition::SetAttribute {
            value,
            oracle_signature,
        } => {
            let oracle = record
                .oracle
                .as_deref()
                .ok_or_else(|| precondition("oracle is not set"))?;
            let message = set_attribute_message(*value, &record.id);
            verify(oracle, &message, oracle_signature)?;

            next.attribute = Some(*value);
        }
    }

    // The ledger advances the account nonce for every applied transaction
    next.nonce += 1;
    Ok(Applied {
        record: next,
        event,
    })
}

// --- Canonical signed messages ---
//
// Builders are public so off-line signers compose byte-identical messages.

/// `new_oracle || nonce`, signed by the current owner.
pub fn bind_oracle_message(new_oracle_hex: &str, nonce: u64) -> Result<Vec<u8>, LodestoneError> {
    let key = require_pubkey(new_oracle_hex)?;
    let mut buf = Vec::new();
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(&nonce.to_bytes());
    Ok(buf)
}

/// The new controller limbs, signed by the current owner.
pub fn set_controller_message(controller: &ControllerId) -> Vec<u8> {
    let (l1, l2) = controller.to_limbs();
    let mut buf = Vec::new();
    buf.extend_from_slice(&l1.to_bytes());
    buf.extend_from_slice(&l2.to_bytes());
    buf
}

/// `new || prior || nonce`, signed by the current oracle. Binding the prior
/// value and the nonce makes a stale attestation fail closed instead of
/// clobbering a newer controller.
pub fn update_controller_message(
    controller: &ControllerId,
    prior: Option<&ControllerId>,
    nonce: u64,
) -> Vec<u8> {
    let (n1, n2) = controller.to_limbs();
    let (p1, p2) = controller_limbs(prior);
    let mut buf = Vec::new();
    buf.extend_from_slice(&n1.to_bytes());
    buf.extend_from_slice(&n2.to_bytes());
    buf.extend_from_slice(&p1.to_bytes());
    buf.extend_from_slice(&p2.to_bytes());
    buf.extend_from_slice(&nonce.to_bytes());
    buf
}

/// `value || account id`, signed by the current oracle. The account identity
/// keeps an attestation for one account unusable on another.
pub fn set_attribute_message(value: u64, account_id: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&value.to_bytes());
    buf.extend_from_slice(&account_id.to_string().to_bytes());
    buf
}

fn controller_limbs(controller: Option<&ControllerId>) -> (Limb, Limb) {
    match controller {
        Some(c) => c.to_limbs(),
        None => (ZERO_LIMB, ZERO_LIMB),
    }
}

fn display_controller(controller: Option<&ControllerId>) -> String {
    match controller {
        Some(c) => c.as_str().to_string(),
        None => "<absent>".to_string(),
    }
}

fn require_pubkey(pubkey_hex: &str) -> Result<VerifyingKey, LodestoneError> {
    crypto::parse_pubkey_hex(pubkey_hex).ok_or_else(|| {
        LodestoneError::EncodingError(format!("malformed public key: {:?}", pubkey_hex))
    })
}

fn verify(
    pubkey_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), LodestoneError> {
    if crypto::verify_with_pubkey_hex(message, signature_hex, pubkey_hex) {
        Ok(())
    } else {
        Err(LodestoneError::InvalidSignature)
    }
}

fn precondition(msg: &str) -> LodestoneError {
    LodestoneError::PreconditionViolation(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::types::Phase;
    use crate::crypto::KeyPair;

    fn fresh() -> AccountRecord {
        AccountRecord::new("anchor-1")
    }

    fn claim(record: &AccountRecord, keys: &KeyPair) -> AccountRecord {
        apply(
            record,
            &Transition::ClaimOwner {
                new_owner: keys.public_key_hex(),
            },
        )
        .unwrap()
        .record
    }

    fn bind(record: &AccountRecord, owner: &KeyPair, oracle: &KeyPair) -> AccountRecord {
        let message = bind_oracle_message(&oracle.public_key_hex(), record.nonce).unwrap();
        apply(
            record,
            &Transition::BindOracle {
                new_oracle: oracle.public_key_hex(),
                owner_signature: owner.sign_hex(&message),
            },
        )
        .unwrap()
        .record
    }

    fn set_controller(record: &AccountRecord, owner: &KeyPair, text: &str) -> AccountRecord {
        let ctrl = ControllerId::new(text).unwrap();
        let message = set_controller_message(&ctrl);
        apply(
            record,
            &Transition::SetController {
                controller: ctrl,
                owner_signature: owner.sign_hex(&message),
            },
        )
        .unwrap()
        .record
    }

    #[test]
    fn owner_claim_is_one_shot() {
        let a = KeyPair::new();
        let b = KeyPair::new();
        let record = claim(&fresh(), &a);
        assert_eq!(record.owner, Some(a.public_key_hex()));
        assert_eq!(record.nonce, 1);

        let second = apply(
            &record,
            &Transition::ClaimOwner {
                new_owner: b.public_key_hex(),
            },
        );
        assert!(matches!(second, Err(LodestoneError::AlreadyBound("owner"))));
        assert_eq!(record.owner, Some(a.public_key_hex()));
    }

    #[test]
    fn claim_rejects_malformed_key() {
        let result = apply(
            &fresh(),
            &Transition::ClaimOwner {
                new_owner: "not-a-key".to_string(),
            },
        );
        assert!(matches!(result, Err(LodestoneError::EncodingError(_))));
    }

    #[test]
    fn bind_oracle_requires_owner_signature() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let intruder = KeyPair::new();
        let record = claim(&fresh(), &owner);

        let message = bind_oracle_message(&oracle.public_key_hex(), record.nonce).unwrap();
        let result = apply(
            &record,
            &Transition::BindOracle {
                new_oracle: oracle.public_key_hex(),
                owner_signature: intruder.sign_hex(&message),
            },
        );
        assert!(matches!(result, Err(LodestoneError::InvalidSignature)));
    }

    #[test]
    fn oracle_binding_is_one_shot() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let replacement = KeyPair::new();
        let record = bind(&claim(&fresh(), &owner), &owner, &oracle);
        assert_eq!(record.phase(), Phase::OracleBound);

        // A valid owner signature does not reopen the slot
        let message = bind_oracle_message(&replacement.public_key_hex(), record.nonce).unwrap();
        let result = apply(
            &record,
            &Transition::BindOracle {
                new_oracle: replacement.public_key_hex(),
                owner_signature: owner.sign_hex(&message),
            },
        );
        assert!(matches!(result, Err(LodestoneError::AlreadyBound("oracle"))));
    }

    #[test]
    fn binding_resets_attribute() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let mut record = claim(&fresh(), &owner);
        record.attribute = Some(7);

        let bound = bind(&record, &owner, &oracle);
        assert_eq!(bound.attribute, None);
    }

    #[test]
    fn set_controller_requires_owner() {
        let oracle = KeyPair::new();
        let ctrl = ControllerId::new("abc").unwrap();
        let message = set_controller_message(&ctrl);
        let result = apply(
            &fresh(),
            &Transition::SetController {
                controller: ctrl,
                owner_signature: oracle.sign_hex(&message),
            },
        );
        assert!(matches!(
            result,
            Err(LodestoneError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn owner_overwrites_controller_unconditionally() {
        let owner = KeyPair::new();
        let record = set_controller(&claim(&fresh(), &owner), &owner, "abc");
        assert_eq!(record.controller, Some(ControllerId::new("abc").unwrap()));

        let record = set_controller(&record, &owner, "def");
        assert_eq!(record.controller, Some(ControllerId::new("def").unwrap()));
    }

    #[test]
    fn stale_controller_assertion_is_rejected() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let record = bind(
            &set_controller(&claim(&fresh(), &owner), &owner, "X"),
            &owner,
            &oracle,
        );

        // The oracle believes the controller is "W"; committed is "X". The
        // signature is cryptographically valid for its own message.
        let new_ctrl = ControllerId::new("Y").unwrap();
        let stale = ControllerId::new("W").unwrap();
        let message = update_controller_message(&new_ctrl, Some(&stale), record.nonce);
        let result = apply(
            &record,
            &Transition::UpdateController {
                controller: new_ctrl,
                prior_controller: Some(stale),
                oracle_signature: oracle.sign_hex(&message),
            },
        );
        assert!(matches!(
            result,
            Err(LodestoneError::PreconditionViolation(_))
        ));
        assert_eq!(record.controller, Some(ControllerId::new("X").unwrap()));
    }

    #[test]
    fn nonce_replay_is_rejected() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let record = bind(
            &set_controller(&claim(&fresh(), &owner), &owner, "abc"),
            &owner,
            &oracle,
        );

        // Signed at nonce N, but an attribute attestation settles first
        let new_ctrl = ControllerId::new("xyz").unwrap();
        let prior = ControllerId::new("abc").unwrap();
        let message = update_controller_message(&new_ctrl, Some(&prior), record.nonce);
        let signature = oracle.sign_hex(&message);

        let attr_message = set_attribute_message(42, &record.id);
        let record = apply(
            &record,
            &Transition::SetAttribute {
                value: 42,
                oracle_signature: oracle.sign_hex(&attr_message),
            },
        )
        .unwrap()
        .record;

        let result = apply(
            &record,
            &Transition::UpdateController {
                controller: new_ctrl,
                prior_controller: Some(prior),
                oracle_signature: signature,
            },
        );
        assert!(matches!(result, Err(LodestoneError::InvalidSignature)));
    }

    #[test]
    fn attribute_attestation_is_bound_to_the_account() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let record = bind(&claim(&fresh(), &owner), &owner, &oracle);

        let mut foreign = record.clone();
        foreign.id = "anchor-2".to_string();

        let message = set_attribute_message(9, &record.id);
        let transition = Transition::SetAttribute {
            value: 9,
            oracle_signature: oracle.sign_hex(&message),
        };
        assert!(apply(&record, &transition).is_ok());
        assert!(matches!(
            apply(&foreign, &transition),
            Err(LodestoneError::InvalidSignature)
        ));
    }

    #[test]
    fn attribute_zero_is_a_real_value() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let record = bind(&claim(&fresh(), &owner), &owner, &oracle);
        assert_eq!(record.attribute, None);

        let message = set_attribute_message(0, &record.id);
        let record = apply(
            &record,
            &Transition::SetAttribute {
                value: 0,
                oracle_signature: oracle.sign_hex(&message),
            },
        )
        .unwrap()
        .record;
        assert_eq!(record.attribute, Some(0));
    }

    #[test]
    fn end_to_end_scenario() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();

        // deploy
        let record = fresh();
        assert_eq!(record.phase(), Phase::Uninitialized);

        // claim owner
        let record = claim(&record, &owner);
        assert_eq!(record.phase(), Phase::OwnerOnly);

        // owner sets controller "abc"
        let record = set_controller(&record, &owner, "abc");
        assert_eq!(record.controller, Some(ControllerId::new("abc").unwrap()));

        // owner binds the oracle; attribute reads absent; event fires
        let message = bind_oracle_message(&oracle.public_key_hex(), record.nonce).unwrap();
        let applied = apply(
            &record,
            &Transition::BindOracle {
                new_oracle: oracle.public_key_hex(),
                owner_signature: owner.sign_hex(&message),
            },
        )
        .unwrap();
        assert_eq!(
            applied.event,
            Some(AccountEvent::OracleBound {
                account: "anchor-1".to_string(),
                oracle: oracle.public_key_hex(),
            })
        );
        let record = applied.record;
        assert_eq!(record.attribute, None);
        assert_eq!(record.phase(), Phase::OracleBound);

        // oracle moves the controller from "abc" to "xyz"
        let new_ctrl = ControllerId::new("xyz").unwrap();
        let prior = ControllerId::new("abc").unwrap();
        let message = update_controller_message(&new_ctrl, Some(&prior), record.nonce);
        let transition = Transition::UpdateController {
            controller: new_ctrl.clone(),
            prior_controller: Some(prior),
            oracle_signature: oracle.sign_hex(&message),
        };
        let record = apply(&record, &transition).unwrap().record;
        assert_eq!(record.controller, Some(new_ctrl));

        // replaying the identical transition is now stale twice over
        assert!(apply(&record, &transition).is_err());
    }
}
