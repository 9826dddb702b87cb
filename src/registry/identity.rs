use serde_json::Value;

use super::error::IdentityError;

pub type UserId = i64;

/// Resolves the `id` field of a heartbeat into a registry key.
///
/// Numbers are used as-is (fractions truncate toward zero). Strings are parsed
/// as base-10 integers, and anything that does not parse is hashed with
/// [`djb2`], so the same string always maps to the same id.
pub fn resolve_user_id(raw: Option<&Value>) -> Result<UserId, IdentityError> {
    match raw {
        None => Err(IdentityError::Missing),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or(IdentityError::Unsupported("number")),
        Some(Value::String(s)) => Ok(s
            .parse::<i64>()
            .unwrap_or_else(|_| UserId::from(djb2(s.as_bytes())))),
        Some(other) => Err(IdentityError::Unsupported(kind_of(other))),
    }
}

/// 32-bit DJB2: `hash = hash * 33 + byte`, seeded with 5381.
pub fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(5381u32, |hash, &b| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(b))
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
