//! Wire objects, one module per provider. Only the fields the storefront reads are modelled.
pub mod coinbase;
pub mod mailerlite;
pub mod paypal;
pub mod shippo;
pub mod stripe;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts `"123"`, `123` or `null`. Some providers send identifiers as bare numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
