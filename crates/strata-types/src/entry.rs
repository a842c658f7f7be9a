//! Entry specs: deterministic byte encoding and versioned digests.
//!
//! Every entry stored in the transaction log is an [`EntrySpec`]: a
//! prefix-wrapped key plus a tagged value payload. The byte layouts here
//! are part of the verifiable state — byte-identical inputs must produce
//! byte-identical encodings, and therefore byte-identical digests.

use serde::{Deserialize, Serialize};

/// Namespace prefix for user-set keys.
pub const KEY_PREFIX_SET: u8 = 0x00;
/// Namespace prefix reserved for internal keys. Never visible to clients.
pub const KEY_PREFIX_INTERNAL: u8 = 0x01;

/// Value tag for an ordinary value payload.
pub const VALUE_PLAIN: u8 = 0x00;
/// Value tag for a reference payload.
pub const VALUE_REFERENCE: u8 = 0x01;

/// Current entry-digest scheme. Stored in [`TxHeader::version`](crate::TxHeader).
pub const ENTRY_DIGEST_VERSION: u16 = 1;

/// Errors from entry decoding and digest-scheme selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A stored value payload doesn't parse under its tag.
    #[error("malformed value payload")]
    MalformedValue,

    /// A stored key is missing its namespace prefix byte.
    #[error("malformed stored key")]
    MalformedKey,

    /// The header names a digest scheme this build doesn't know.
    #[error("unknown entry digest version: {0}")]
    UnknownDigestVersion(u16),
}

/// Prefix a raw key with its namespace byte.
pub fn wrap_key(key: &[u8], prefix: u8) -> Vec<u8> {
    let mut wrapped = Vec::with_capacity(1 + key.len());
    wrapped.push(prefix);
    wrapped.extend_from_slice(key);
    wrapped
}

/// Strip the namespace byte from a stored key.
pub fn unwrap_key(stored: &[u8]) -> Result<&[u8], CodecError> {
    if stored.is_empty() {
        return Err(CodecError::MalformedKey);
    }
    Ok(&stored[1..])
}

/// One entry as it participates in a transaction: wrapped key, tagged value.
///
/// The digest of the spec is what enters the Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    /// Stored key: namespace prefix byte followed by the raw key.
    pub key: Vec<u8>,
    /// Tagged value payload (see [`decode_value`]).
    pub value: Vec<u8>,
}

/// Encode a regular key-value entry.
///
/// Key: `0x00 ‖ key`. Value: `0x00 ‖ value`.
pub fn encode_entry(key: &[u8], value: &[u8]) -> EntrySpec {
    let mut payload = Vec::with_capacity(1 + value.len());
    payload.push(VALUE_PLAIN);
    payload.extend_from_slice(value);
    EntrySpec {
        key: wrap_key(key, KEY_PREFIX_SET),
        value: payload,
    }
}

/// Encode a reference entry.
///
/// Key: `0x00 ‖ ref_key`. Value:
/// `0x01 ‖ u32_be(len(wrapped_target)) ‖ wrapped_target ‖ u64_be(at_tx)`.
///
/// `at_tx = 0` marks an unbound reference (resolved at read time);
/// `at_tx > 0` pins the reference to the target value written at that
/// transaction. No user-supplied value is stored — the value of a
/// reference is always derived from its target.
pub fn encode_reference(ref_key: &[u8], target_key: &[u8], at_tx: u64) -> EntrySpec {
    let wrapped_target = wrap_key(target_key, KEY_PREFIX_SET);
    let mut payload = Vec::with_capacity(1 + 4 + wrapped_target.len() + 8);
    payload.push(VALUE_REFERENCE);
    payload.extend_from_slice(&(wrapped_target.len() as u32).to_be_bytes());
    payload.extend_from_slice(&wrapped_target);
    payload.extend_from_slice(&at_tx.to_be_bytes());
    EntrySpec {
        key: wrap_key(ref_key, KEY_PREFIX_SET),
        value: payload,
    }
}

/// A decoded value payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePayload<'a> {
    /// An ordinary value.
    Plain(&'a [u8]),
    /// A reference to another key.
    Reference {
        /// Raw (unwrapped) target key.
        target_key: &'a [u8],
        /// Bound transaction id, 0 for unbound.
        at_tx: u64,
    },
}

/// Decode a stored value payload by its tag byte.
pub fn decode_value(payload: &[u8]) -> Result<ValuePayload<'_>, CodecError> {
    match payload.first() {
        Some(&VALUE_PLAIN) => Ok(ValuePayload::Plain(&payload[1..])),
        Some(&VALUE_REFERENCE) => {
            let rest = &payload[1..];
            if rest.len() < 4 {
                return Err(CodecError::MalformedValue);
            }
            let len = u32::from_be_bytes(rest[..4].try_into().unwrap()) as usize;
            let rest = &rest[4..];
            if rest.len() != len + 8 {
                return Err(CodecError::MalformedValue);
            }
            let target_key = unwrap_key(&rest[..len])?;
            let at_tx = u64::from_be_bytes(rest[len..].try_into().unwrap());
            Ok(ValuePayload::Reference { target_key, at_tx })
        }
        _ => Err(CodecError::MalformedValue),
    }
}

/// Entry digest function selected by a header version.
pub type EntryDigestFn = fn(&EntrySpec) -> [u8; 32];

/// Return the digest function for a header's `version` field.
///
/// Unknown versions are rejected rather than silently misinterpreted.
pub fn entry_digest_for(version: u16) -> Result<EntryDigestFn, CodecError> {
    match version {
        1 => Ok(digest_v1),
        v => Err(CodecError::UnknownDigestVersion(v)),
    }
}

/// Digest scheme 1: `blake3(u32_be(len(key)) ‖ key ‖ blake3(value))`.
fn digest_v1(spec: &EntrySpec) -> [u8; 32] {
    let value_hash = blake3::hash(&spec.value);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(spec.key.len() as u32).to_be_bytes());
    hasher.update(&spec.key);
    hasher.update(value_hash.as_bytes());
    hasher.finalize().into()
}
