//! Struct encoding and hashing for the generic typed-data engine.

use std::collections::BTreeSet;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address, B256, I256, U256};
use serde_json::Value;

use super::{cache, TypeMap, DOMAIN_TYPE_NAME};
use crate::error::EncodeError;

/// Encodes `primary` with its struct dependencies: primary first, the rest
/// sorted by name.
pub fn encode_type(types: &TypeMap, primary: &str) -> Result<String, EncodeError> {
    let mut deps = BTreeSet::new();
    collect_dependencies(types, primary, &mut deps)?;
    deps.remove(primary);

    let mut out = String::new();
    for name in std::iter::once(primary).chain(deps.iter().map(String::as_str)) {
        let fields = lookup(types, name)?;
        out.push_str(name);
        out.push('(');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&field.field_type);
            out.push(' ');
            out.push_str(&field.name);
        }
        out.push(')');
    }
    Ok(out)
}

/// `keccak256(encodeType(primary))`, memoised per encoded type string.
pub fn type_hash(types: &TypeMap, primary: &str) -> Result<B256, EncodeError> {
    Ok(cache::type_hash_of(&encode_type(types, primary)?))
}

/// `keccak256(typeHash ‖ encodeData(value))`.
pub fn hash_struct(types: &TypeMap, primary: &str, value: &Value) -> Result<B256, EncodeError> {
    let fields = lookup(types, primary)?;
    let object = value.as_object().ok_or_else(|| {
        EncodeError::TypedData(format!("expected an object for struct {primary}"))
    })?;

    let mut buf = Vec::with_capacity(32 * (fields.len() + 1));
    buf.extend_from_slice(type_hash(types, primary)?.as_slice());
    for field in fields {
        let member = object.get(&field.name).ok_or_else(|| {
            EncodeError::TypedData(format!("missing field {}.{}", primary, field.name))
        })?;
        let word = encode_field(types, &field.field_type, member)
            .map_err(|e| prefix_error(e, primary, &field.name))?;
        buf.extend_from_slice(word.as_slice());
    }
    Ok(keccak256(buf))
}

fn lookup<'a>(
    types: &'a TypeMap,
    name: &str,
) -> Result<&'a Vec<super::TypedDataField>, EncodeError> {
    types
        .get(name)
        .ok_or_else(|| EncodeError::TypedData(format!("unknown struct type {name}")))
}

fn collect_dependencies(
    types: &TypeMap,
    name: &str,
    found: &mut BTreeSet<String>,
) -> Result<(), EncodeError> {
    if found.contains(name) {
        return Ok(());
    }
    found.insert(name.to_string());
    for field in lookup(types, name)? {
        let base = base_type(&field.field_type);
        if base != DOMAIN_TYPE_NAME && types.contains_key(base) {
            collect_dependencies(types, base, found)?;
        }
    }
    Ok(())
}

/// Strips every array suffix: `Foo[2][]` -> `Foo`.
fn base_type(ty: &str) -> &str {
    ty.find('[').map_or(ty, |i| &ty[..i])
}

fn encode_field(types: &TypeMap, ty: &str, value: &Value) -> Result<B256, EncodeError> {
    if let Some(element_ty) = ty.strip_suffix(']') {
        let open = element_ty
            .rfind('[')
            .ok_or_else(|| EncodeError::TypedData(format!("malformed array type {ty}")))?;
        let (inner, len) = (&element_ty[..open], &element_ty[open + 1..]);
        let items = value
            .as_array()
            .ok_or_else(|| EncodeError::TypedData(format!("expected an array for {ty}")))?;
        if !len.is_empty() {
            let expected: usize = len
                .parse()
                .map_err(|_| EncodeError::TypedData(format!("malformed array type {ty}")))?;
            if items.len() != expected {
                return Err(EncodeError::TypedData(format!(
                    "expected {expected} elements for {ty}, got {}",
                    items.len()
                )));
            }
        }
        let mut buf = Vec::with_capacity(32 * items.len());
        for item in items {
            buf.extend_from_slice(encode_field(types, inner, item)?.as_slice());
        }
        return Ok(keccak256(buf));
    }

    if types.contains_key(ty) {
        return hash_struct(types, ty, value);
    }

    match ty {
        "address" => Ok(parse_address(value)?.into_word()),
        "bool" => Ok(B256::from(U256::from(parse_bool(value)? as u8))),
        "string" => {
            let s = value
                .as_str()
                .ok_or_else(|| EncodeError::TypedData("expected a string".into()))?;
            Ok(keccak256(s.as_bytes()))
        }
        "bytes" => Ok(keccak256(parse_hex(value)?)),
        _ => {
            if let Some(size) = ty.strip_prefix("bytes") {
                let size = parse_size(ty, size, 32)?;
                let raw = parse_hex(value)?;
                if raw.len() > size {
                    return Err(EncodeError::TypedData(format!(
                        "{} bytes do not fit {ty}",
                        raw.len()
                    )));
                }
                let mut word = B256::ZERO;
                word[..raw.len()].copy_from_slice(&raw);
                Ok(word)
            } else if let Some(bits) = ty.strip_prefix("uint") {
                let bits = parse_size(ty, bits, 256)?;
                let n = parse_uint(value)?;
                if bits < 256 && (n >> bits) != U256::ZERO {
                    return Err(EncodeError::TypedData(format!("{n} overflows {ty}")));
                }
                Ok(B256::from(n))
            } else if let Some(bits) = ty.strip_prefix("int") {
                parse_size(ty, bits, 256)?;
                Ok(B256::from(parse_int(value)?.into_raw()))
            } else {
                Err(EncodeError::TypedData(format!("unsupported type {ty}")))
            }
        }
    }
}

fn parse_size(ty: &str, digits: &str, max: usize) -> Result<usize, EncodeError> {
    let size = if digits.is_empty() && max == 256 {
        256
    } else {
        digits
            .parse::<usize>()
            .map_err(|_| EncodeError::TypedData(format!("unsupported type {ty}")))?
    };
    if size == 0 || size > max {
        return Err(EncodeError::TypedData(format!("unsupported type {ty}")));
    }
    Ok(size)
}

fn parse_address(value: &Value) -> Result<Address, EncodeError> {
    let s = value
        .as_str()
        .ok_or_else(|| EncodeError::TypedData("expected an address string".into()))?;
    Address::from_str(s).map_err(|e| EncodeError::TypedData(format!("invalid address {s}: {e}")))
}

fn parse_bool(value: &Value) -> Result<bool, EncodeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        other => Err(EncodeError::TypedData(format!("expected a bool, got {other}"))),
    }
}

fn parse_hex(value: &Value) -> Result<Vec<u8>, EncodeError> {
    let s = value
        .as_str()
        .ok_or_else(|| EncodeError::TypedData("expected a hex string".into()))?;
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| EncodeError::TypedData(format!("invalid hex {s}: {e}")))
}

/// Accepts JSON numbers, decimal strings and `0x` hex strings.
pub(crate) fn parse_uint(value: &Value) -> Result<U256, EncodeError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| EncodeError::TypedData(format!("{n} is not an unsigned integer"))),
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|e| EncodeError::TypedData(format!("invalid integer {s}: {e}")))
        }
        other => Err(EncodeError::TypedData(format!(
            "expected an integer, got {other}"
        ))),
    }
}

fn parse_int(value: &Value) -> Result<I256, EncodeError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|v| I256::try_from(v).ok())
            .ok_or_else(|| EncodeError::TypedData(format!("{n} is not an integer"))),
        Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(_) => I256::from_hex_str(s),
                None => I256::from_dec_str(s),
            };
            parsed.map_err(|e| EncodeError::TypedData(format!("invalid integer {s}: {e}")))
        }
        other => Err(EncodeError::TypedData(format!(
            "expected an integer, got {other}"
        ))),
    }
}

fn prefix_error(err: EncodeError, owner: &str, field: &str) -> EncodeError {
    match err {
        EncodeError::TypedData(msg) if !msg.starts_with("missing field") => {
            EncodeError::TypedData(format!("{owner}.{field}: {msg}"))
        }
        other => other,
    }
}
