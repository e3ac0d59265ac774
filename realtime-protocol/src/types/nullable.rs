//! Tri-state optional field

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field that can be left out, sent as an explicit `null`, or set.
///
/// The server treats these differently: `"turn_detection": null` disables
/// voice activity detection while omitting the key keeps the current setting.
/// Declare such fields as
///
/// ```
/// use realtime_protocol::Nullable;
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Example {
///     #[serde(default, skip_serializing_if = "Nullable::is_absent")]
///     idle_timeout_ms: Nullable<u32>,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    /// Key omitted
    Absent,
    /// Key present with value `null`
    Null,
    /// Key present with a value
    Value(T),
}

impl<T> Nullable<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// The value, if one is set
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` maps to an explicit null, never to an absent key
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Null,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Only reached when the field forgot `skip_serializing_if`
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Value(v) => serializer.serialize_some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A missing key never gets here; `#[serde(default)]` yields Absent.
        Option::<T>::deserialize(deserializer).map(Self::from_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(default, skip_serializing_if = "Nullable::is_absent")]
        field: Nullable<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        list: Option<Vec<u32>>,
    }

    #[test]
    fn test_absent_omits_key() {
        let holder = Holder {
            field: Nullable::Absent,
            list: None,
        };
        assert_eq!(serde_json::to_value(&holder).unwrap(), json!({}));
    }

    #[test]
    fn test_null_emits_null() {
        let holder = Holder {
            field: Nullable::Null,
            list: None,
        };
        assert_eq!(serde_json::to_value(&holder).unwrap(), json!({"field": null}));
    }

    #[test]
    fn test_value_emits_value() {
        let holder = Holder {
            field: Nullable::Value(7),
            list: Some(vec![]),
        };
        assert_eq!(
            serde_json::to_value(&holder).unwrap(),
            json!({"field": 7, "list": []})
        );
    }

    #[test]
    fn test_decode_distinguishes_three_states() {
        let absent: Holder = serde_json::from_str("{}").unwrap();
        let null: Holder = serde_json::from_str(r#"{"field":null}"#).unwrap();
        let value: Holder = serde_json::from_str(r#"{"field":3}"#).unwrap();

        assert_eq!(absent.field, Nullable::Absent);
        assert_eq!(null.field, Nullable::Null);
        assert_eq!(value.field, Nullable::Value(3));
    }

    #[test]
    fn test_empty_list_is_not_absent() {
        let empty: Holder = serde_json::from_str(r#"{"list":[]}"#).unwrap();
        let absent: Holder = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.list, Some(vec![]));
        assert_eq!(absent.list, None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Nullable::from_option(Some(1)), Nullable::Value(1));
        assert_eq!(Nullable::<u32>::from_option(None), Nullable::Null);
        assert_eq!(Nullable::from(5u8), Nullable::Value(5));
    }

    #[test]
    fn test_accessors() {
        let value = Nullable::Value("x");
        assert!(value.is_value());
        assert_eq!(value.value(), Some(&"x"));
        assert!(Nullable::<u8>::Null.is_null());
        assert!(Nullable::<u8>::default().is_absent());
        assert_eq!(Nullable::<u8>::Null.into_value(), None);
    }
}
