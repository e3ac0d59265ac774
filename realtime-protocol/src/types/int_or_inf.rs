//! Token limits that accept `"inf"`

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An integer limit or the literal string `"inf"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntOrInf {
    Int(i64),
    Inf,
}

impl IntOrInf {
    pub fn is_inf(&self) -> bool {
        matches!(self, Self::Inf)
    }

    /// The finite value, `None` for `"inf"`
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Inf => None,
        }
    }
}

impl From<i64> for IntOrInf {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl fmt::Display for IntOrInf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Inf => f.write_str("inf"),
        }
    }
}

impl Serialize for IntOrInf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Inf => serializer.serialize_str("inf"),
        }
    }
}

struct IntOrInfVisitor;

impl<'de> Visitor<'de> for IntOrInfVisitor {
    type Value = IntOrInf;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or \"inf\"")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<IntOrInf, E> {
        Ok(IntOrInf::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<IntOrInf, E> {
        i64::try_from(v)
            .map(IntOrInf::Int)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<IntOrInf, E> {
        if v == "inf" {
            Ok(IntOrInf::Inf)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for IntOrInf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IntOrInfVisitor)
    }
}
