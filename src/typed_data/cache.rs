//! Process-wide memo of `keccak256(encodeType)`.
//!
//! Initialised lazily on first use. A poisoned lock only disables the memo:
//! the hash is always recomputed on a miss, so cache state never affects output.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use alloy_primitives::{keccak256, B256};

static TYPE_HASHES: OnceLock<RwLock<HashMap<String, B256>>> = OnceLock::new();

pub(super) fn type_hash_of(encoded_type: &str) -> B256 {
    memoised(
        TYPE_HASHES.get_or_init(|| RwLock::new(HashMap::new())),
        encoded_type,
    )
}

fn memoised(cache: &RwLock<HashMap<String, B256>>, encoded_type: &str) -> B256 {
    if let Ok(hashes) = cache.read() {
        if let Some(hash) = hashes.get(encoded_type) {
            return *hash;
        }
    }

    let hash = keccak256(encoded_type.as_bytes());
    if let Ok(mut hashes) = cache.write() {
        hashes.insert(encoded_type.to_string(), hash);
    }
    hash
}

#[cfg(test)]
pub(super) fn is_cached(encoded_type: &str) -> bool {
    TYPE_HASHES
        .get()
        .and_then(|cache| cache.read().ok().map(|h| h.contains_key(encoded_type)))
        .unwrap_or(false)
}
