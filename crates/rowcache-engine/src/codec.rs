//! Key codec: canonical, type-checked encoding of primary-key tuples.
//!
//! Encoding fails fast with `type mismatch` before any backend round-trip.
//! This guards the cache from poisoning by coerced values: the backend would
//! silently accept `'3'` for an integer column, but the coerced value hashes
//! differently from the literal `3`, and the two must never become distinct
//! cache entries for the same row.
//!
//! ## Wire shape
//!
//! Each component is a tag byte followed by a fixed-width or
//! length-prefixed body:
//!
//! ```text
//! int:   0x01 + 8-byte big-endian two's complement
//! float: 0x02 + 8-byte big-endian IEEE-754 bits
//! text:  0x03 + u32 big-endian length + UTF-8 bytes
//! bytes: 0x04 + u32 big-endian length + raw bytes
//! ```
//!
//! Length prefixes keep multi-column text keys collision-free; a delimiter
//! scheme would conflate `("a:b", "c")` with `("a", "b:c")`. Table identity
//! is not part of the encoding (the row store scopes keys per table).

use rowcache_commons::{CacheError, Result, RowKey, Value};
use rowcache_schema::TableDescriptor;

const TAG_INT: u8 = 0x01;
const TAG_FLOAT: u8 = 0x02;
const TAG_TEXT: u8 = 0x03;
const TAG_BYTES: u8 = 0x04;

/// Validates a row-limiting clause. Runs before any key derivation.
pub fn check_limit(limit: Option<i64>) -> Result<()> {
    match limit {
        Some(n) if n < 0 => Err(CacheError::NegativeLimit(n)),
        _ => Ok(()),
    }
}

/// Encodes one primary-key value tuple against the table's declared key
/// columns, enforcing exact type agreement per component.
pub fn encode_key(descriptor: &TableDescriptor, values: &[Value]) -> Result<RowKey> {
    let pk_types = descriptor.pk_types();
    let pk_names = descriptor.pk_names();
    if values.len() != pk_types.len() {
        return Err(CacheError::invalid_argument(format!(
            "table '{}' has {} primary-key columns, got {} values",
            descriptor.name,
            pk_types.len(),
            values.len()
        )));
    }

    let mut bytes = Vec::with_capacity(values.len() * 9);
    for ((value, column_type), column) in values.iter().zip(&pk_types).zip(&pk_names) {
        if !value.matches_type(*column_type) {
            return Err(CacheError::TypeMismatch {
                column: (*column).to_string(),
                expected: column_type.name(),
                actual: value.kind(),
            });
        }
        encode_component(&mut bytes, value);
    }
    Ok(RowKey::from_bytes(bytes))
}

/// Encodes every element of an IN-list predicate independently.
///
/// Zero elements fail with `empty list supplied`: zero cache keys is
/// ambiguous with "not yet resolved", so the query is rejected rather than
/// silently matching zero rows.
pub fn encode_key_list(
    descriptor: &TableDescriptor,
    tuples: &[Vec<Value>],
) -> Result<Vec<RowKey>> {
    if tuples.is_empty() {
        return Err(CacheError::EmptyList(descriptor.name.clone()));
    }
    tuples
        .iter()
        .map(|tuple| encode_key(descriptor, tuple))
        .collect()
}

fn encode_component(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Int(n) => {
            out.push(TAG_INT);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::Float(f) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Value::Text(s) => {
            out.push(TAG_TEXT);
            out.extend_from_slice(&(s.len() as u32).to_be_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            out.push(TAG_BYTES);
            out.extend_from_slice(&(b.len() as u32).to_be_bytes());
            out.extend_from_slice(b);
        }
        // matches_type rejects nulls before encoding is reached.
        Value::Null => unreachable!("null cannot appear in a validated key tuple"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowcache_commons::ColumnType;
    use rowcache_schema::{ColumnDefinition, TableInfo};

    fn descriptor() -> TableDescriptor {
        TableDescriptor::from_info(
            TableInfo::new(
                "accounts",
                vec![
                    ColumnDefinition::new("eid", ColumnType::Int),
                    ColumnDefinition::new("bid", ColumnType::Text),
                    ColumnDefinition::new("name", ColumnType::Text),
                ],
                vec!["eid", "bid"],
                None,
            ),
            None,
        )
    }

    #[test]
    fn test_encode_matches_declared_types() {
        let desc = descriptor();
        let key = encode_key(&desc, &[Value::Int(2), Value::Text("foo".into())]).unwrap();
        let same = encode_key(&desc, &[Value::Int(2), Value::Text("foo".into())]).unwrap();
        let other = encode_key(&desc, &[Value::Int(2), Value::Text("bar".into())]).unwrap();
        assert_eq!(key, same);
        assert_ne!(key, other);
    }

    #[test]
    fn test_type_mismatch_every_direction() {
        let desc = descriptor();
        let cases: Vec<Vec<Value>> = vec![
            vec![Value::Text("str".into()), Value::Text("str".into())],
            vec![Value::Int(1), Value::Int(1)],
            vec![Value::Float(1.2), Value::Float(1.2)],
            vec![Value::Null, Value::Text("foo".into())],
        ];
        for values in cases {
            let err = encode_key(&desc, &values).unwrap_err();
            assert!(
                err.to_string().starts_with("type mismatch"),
                "unexpected error for {:?}: {}",
                values,
                err
            );
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let desc = descriptor();
        let err = encode_key(&desc, &[Value::Int(1)]).unwrap_err();
        assert!(err.to_string().starts_with("invalid argument"));
    }

    #[test]
    fn test_length_prefix_prevents_collisions() {
        let desc = TableDescriptor::from_info(
            TableInfo::new(
                "pairs",
                vec![
                    ColumnDefinition::new("a", ColumnType::Text),
                    ColumnDefinition::new("b", ColumnType::Text),
                ],
                vec!["a", "b"],
                None,
            ),
            None,
        );
        let k1 = encode_key(&desc, &[Value::Text("a:b".into()), Value::Text("c".into())]).unwrap();
        let k2 = encode_key(&desc, &[Value::Text("a".into()), Value::Text("b:c".into())]).unwrap();
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_empty_list_rejected() {
        let desc = descriptor();
        let err = encode_key_list(&desc, &[]).unwrap_err();
        assert!(err.to_string().starts_with("empty list supplied"));
    }

    #[test]
    fn test_list_elements_encoded_independently() {
        let desc = descriptor();
        let keys = encode_key_list(
            &desc,
            &[
                vec![Value::Int(1), Value::Text("a".into())],
                vec![Value::Int(2), Value::Text("b".into())],
            ],
        )
        .unwrap();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);

        // One bad element fails the whole derivation.
        let err = encode_key_list(
            &desc,
            &[
                vec![Value::Int(1), Value::Text("a".into())],
                vec![Value::Float(2.0), Value::Text("b".into())],
            ],
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("type mismatch"));
    }

    #[test]
    fn test_check_limit() {
        assert!(check_limit(None).is_ok());
        assert!(check_limit(Some(0)).is_ok());
        assert!(check_limit(Some(10)).is_ok());
        let err = check_limit(Some(-1)).unwrap_err();
        assert_eq!(err.to_string(), "negative limit: -1");
    }
}
