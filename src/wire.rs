//! Serde helpers for the orchestrator's wire format.
//!
//! 256-bit integers travel as decimal strings. Incoming values are also
//! accepted as `0x` hex strings or plain JSON numbers.

use alloy_primitives::U256;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

use crate::typed_data::parse_uint;

/// `U256` as a decimal string.
pub mod u256_dec {
    use super::*;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_uint(&value).map_err(D::Error::custom)
    }
}

/// `u128` as a decimal string.
pub mod u128_dec {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let parsed = parse_uint(&value).map_err(D::Error::custom)?;
        u128::try_from(parsed).map_err(|_| D::Error::custom(format!("{parsed} overflows uint128")))
    }
}

/// `(U256, U256)` pairs as `[["id", "amount"], ...]`.
pub mod u256_pairs {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(
        pairs: &[(U256, U256)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
        for (a, b) in pairs {
            seq.serialize_element(&[a.to_string(), b.to_string()])?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(U256, U256)>, D::Error> {
        let raw = Vec::<(Value, Value)>::deserialize(deserializer)?;
        raw.iter()
            .map(|(a, b)| Ok((parse_uint(a)?, parse_uint(b)?)))
            .collect::<Result<_, crate::error::EncodeError>>()
            .map_err(D::Error::custom)
    }
}
