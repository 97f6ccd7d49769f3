//! Record codec - JSON serialization with optional encryption.
//!
//! A record is an ordered mapping of field names to JSON values (or, for the
//! key/value store, any bare JSON value). On the wire and on disk a record
//! is UTF-8 JSON, optionally wrapped in an AES-256-GCM blob.
//!
//! Policy: local backups are ALWAYS encrypted regardless of the caller's
//! flag - local-at-rest data is always protected. Remote copies honor the
//! flag as given. The store enforces this by calling `encode` with
//! `encrypt = true` on every backup write.

use crate::crypto::Encryptor;
use crate::error::{Result, StoreError};
use serde::Serialize;
use serde_json::Value;

/// Ordered field map of a record. serde_json is built with `preserve_order`,
/// so field order survives a save/load round-trip.
pub type Fields = serde_json::Map<String, Value>;

/// Serialize a value to bytes, optionally through the encryptor.
pub fn encode(value: &Value, encryptor: &Encryptor, encrypt: bool) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    if encrypt {
        encryptor.encrypt(&json)
    } else {
        Ok(json)
    }
}

/// Inverse of [`encode`]. Malformed JSON, a wrong key or corrupted
/// ciphertext all fail with `StoreError::Decode` - never partial data.
pub fn decode(bytes: &[u8], encryptor: &Encryptor, encrypt: bool) -> Result<Value> {
    let json = if encrypt {
        encryptor.decrypt(bytes)?
    } else {
        bytes.to_vec()
    };
    Ok(serde_json::from_slice(&json)?)
}

/// Turn any serializable value into its field map ("save all fields").
///
/// Fails with `Decode` when the value does not serialize to a JSON object;
/// scalars belong in the key/value store, not in an account record.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!(
            "expected a JSON object of fields, got {}",
            type_name(&other)
        ))),
    }
}

/// Keep only the named fields ("save named subset"). Names that do not
/// exist on the record are skipped, matching save-what-is-there semantics.
pub fn select_fields(fields: &Fields, names: &[&str]) -> Fields {
    let mut selected = Fields::new();
    for name in names {
        if let Some(value) = fields.get(*name) {
            selected.insert((*name).to_string(), value.clone());
        }
    }
    selected
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_LEN;
    use serde_json::json;

    fn encryptor() -> Encryptor {
        Encryptor::new(&[7u8; KEY_LEN])
    }

    #[test]
    fn test_plain_roundtrip() -> Result<()> {
        let value = json!({"username": "john_doe", "score": 100});

        let bytes = encode(&value, &encryptor(), false)?;
        assert_eq!(bytes, serde_json::to_vec(&value).unwrap());

        let decoded = decode(&bytes, &encryptor(), false)?;
        assert_eq!(decoded, value);
        Ok(())
    }

    #[test]
    fn test_encrypted_roundtrip() -> Result<()> {
        let value = json!({"username": "john_doe", "score": 100});

        let bytes = encode(&value, &encryptor(), true)?;
        // Ciphertext must not leak the plaintext JSON.
        assert_ne!(bytes, serde_json::to_vec(&value).unwrap());

        let decoded = decode(&bytes, &encryptor(), true)?;
        assert_eq!(decoded, value);
        Ok(())
    }

    #[test]
    fn test_scalar_value_roundtrip() -> Result<()> {
        let value = json!(69);

        let bytes = encode(&value, &encryptor(), false)?;
        assert_eq!(bytes, b"69");

        assert_eq!(decode(&bytes, &encryptor(), false)?, value);
        Ok(())
    }

    #[test]
    fn test_wrong_key_is_decode_failure() -> Result<()> {
        let value = json!({"secret": true});
        let bytes = encode(&value, &encryptor(), true)?;

        let other = Encryptor::new(&[8u8; KEY_LEN]);
        let result = decode(&bytes, &other, true);
        assert!(matches!(result, Err(StoreError::Decode(_))));
        Ok(())
    }

    #[test]
    fn test_malformed_json_is_decode_failure() {
        let result = decode(b"{not json", &encryptor(), false);
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_field_order_preserved() -> Result<()> {
        let value = json!({"z": 1, "a": 2, "m": 3});

        let decoded = decode(&encode(&value, &encryptor(), false)?, &encryptor(), false)?;
        let keys: Vec<&String> = decoded.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        Ok(())
    }

    #[test]
    fn test_to_fields_and_select() -> Result<()> {
        #[derive(Serialize)]
        struct Player {
            username: String,
            score: u32,
            password: String,
        }

        let player = Player {
            username: "john_doe".to_string(),
            score: 100,
            password: "123".to_string(),
        };

        let all = to_fields(&player)?;
        assert_eq!(all.len(), 3);

        let subset = select_fields(&all, &["username", "score", "missing"]);
        assert_eq!(subset.len(), 2);
        assert_eq!(subset["score"], json!(100));
        assert!(!subset.contains_key("password"));
        Ok(())
    }

    #[test]
    fn test_to_fields_rejects_scalars() {
        let result = to_fields(&42);
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
