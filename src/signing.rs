//! Agent card signing — canonical serialization plus an HMAC-SHA-256 MAC.
//!
//! Grounded on `other_examples`' svix-webhooks `sign_msg`/`generate_msg_headers`
//! (compute a MAC over a canonical byte string, attach it in a fixed
//! `<version>,<digest>`-shaped string), simplified from svix's multi-key,
//! multi-version scheme down to the single `hmac-sha256:<base64>` format
//! this crate's cards use. The `hmac`/`sha2` pairing, plus `subtle` for the
//! constant-time compare, is confirmed against `sblanchard-SerialAgent`'s
//! Cargo.toml as the idiomatic combination for this job.

use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::types::AgentCard;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM_PREFIX: &str = "hmac-sha256:";

/// Recursively sorts every object's keys, producing a `Value` whose compact
/// JSON serialization is deterministic regardless of construction order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Serializes `card` with the `signature` field omitted, keys sorted
/// recursively, as compact JSON.
fn canonical_bytes(card: &AgentCard) -> serde_json::Result<Vec<u8>> {
    let mut value = serde_json::to_value(card)?;
    if let Value::Object(ref mut map) = value {
        map.remove("signature");
    }
    let canonical = canonicalize(&value);
    serde_json::to_vec(&canonical)
}

fn mac(secret: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Signs `card` in place with `secret`, overwriting any existing signature.
pub fn sign_card(card: &mut AgentCard, secret: &[u8]) -> serde_json::Result<()> {
    let digest = mac(secret, &canonical_bytes(card)?);
    let encoded = base64::engine::general_purpose::STANDARD.encode(digest);
    card.signature = Some(format!("{ALGORITHM_PREFIX}{encoded}"));
    Ok(())
}

/// Verifies `card.signature` against a freshly computed MAC over its
/// canonical form. Any missing signature, unknown algorithm prefix, or
/// malformed base64 is a verification failure, not an error.
pub fn verify_card(card: &AgentCard, secret: &[u8]) -> bool {
    let Some(ref signature) = card.signature else {
        return false;
    };
    let Some(encoded) = signature.strip_prefix(ALGORITHM_PREFIX) else {
        return false;
    };
    let Ok(provided) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
        return false;
    };

    let mut unsigned = card.clone();
    unsigned.signature = None;
    let Ok(bytes) = canonical_bytes(&unsigned) else {
        return false;
    };
    let expected = mac(secret, &bytes);

    expected.ct_eq(&provided).into()
}
