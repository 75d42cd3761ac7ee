//! Conversion of host data into values.
//!
//! JSON is the interchange shape: anything `Serialize` goes through
//! [`serde_json::Value`]. Closures and custom objects have no serialized form
//! and are built with the [`Value`] constructors instead.

use serde::Serialize;

use crate::value::Value;

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::empty(),
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Value::from(i),
                (None, Some(f)) => Value::from(f),
                (None, None) => Value::empty(),
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::sequence(items),
            serde_json::Value::Object(map) => Value::map(map),
        }
    }
}

impl Value {
    /// Converts any serializable host value.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Value> {
        serde_json::to_value(value).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert!(Value::from(json!(null)).is_empty());
        assert_eq!(Value::from(json!(true)).as_bool(), Some(true));
        assert_eq!(Value::from(json!(42)).as_i64(), Some(42));
        assert_eq!(Value::from(json!(1.5)).as_f64(), Some(1.5));
        assert_eq!(Value::from(json!(u64::MAX)).kind(), ValueKind::Float);
        assert_eq!(Value::from(json!("x")).as_str(), Some("x"));
    }

    #[test]
    fn test_collections_keep_order() {
        let value = Value::from(json!({"b": [1, 2], "a": {"c": "d"}}));
        let keys: Vec<&str> = value.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(value.lookup("b").unwrap().as_sequence().unwrap().len(), 2);
        assert_eq!(
            value.lookup("a").and_then(|a| a.lookup("c")).unwrap().as_str(),
            Some("d")
        );
    }

    #[test]
    fn test_from_serialize() {
        #[derive(Serialize)]
        struct Person {
            name: String,
            age: u32,
        }

        let value = Value::from_serialize(&Person {
            name: "Arthur".to_string(),
            age: 42,
        })
        .unwrap();
        assert_eq!(value.lookup("name").unwrap().as_str(), Some("Arthur"));
        assert_eq!(value.lookup("age").unwrap().as_i64(), Some(42));
    }
}
