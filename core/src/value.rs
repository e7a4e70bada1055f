//! Scalar cell values exchanged with the store adapters.

use serde::{Deserialize, Serialize};

/// One scalar value in a row, tagged by shape rather than by column type.
///
/// The declared [`DataType`](crate::schema::DataType) of the column, not the
/// variant, decides how a value is quoted when it is rendered into a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL / absent value.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// Text of any length.
    Text(String),
}

impl Value {
    /// Returns the integer payload, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text payload, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Integer(7).as_integer(), Some(7));
        assert_eq!(Value::from("abc").as_text(), Some("abc"));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.as_integer(), None);
    }

    #[test]
    fn test_untagged_yaml_round_trip() {
        let values = vec![Value::Null, Value::Integer(42), Value::from("latte")];
        let yaml = serde_yaml::to_string(&values).unwrap();
        let parsed: Vec<Value> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, values);
    }
}
