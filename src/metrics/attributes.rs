//! Attribute sets identifying a time series.
//!
//! An [`AttributeSet`] is stored in canonical form: pairs sorted by key,
//! later duplicates replacing earlier ones. Equality and hashing operate on
//! that canonical form, so two sets built from the same pairs in any order
//! address the same series.

use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Scalar or homogeneous-array attribute value
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Bool(bool),
    I64(i64),
    F64(f64),
    StringArray(Vec<String>),
    BoolArray(Vec<bool>),
    I64Array(Vec<i64>),
    F64Array(Vec<f64>),
}

// Floats compare by bit pattern so that the type can be a map key.
impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        use AttributeValue::*;
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (F64(a), F64(b)) => a.to_bits() == b.to_bits(),
            (StringArray(a), StringArray(b)) => a == b,
            (BoolArray(a), BoolArray(b)) => a == b,
            (I64Array(a), I64Array(b)) => a == b,
            (F64Array(a), F64Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            },
            _ => false,
        }
    }
}

impl Eq for AttributeValue {}

impl Hash for AttributeValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttributeValue::String(v) => v.hash(state),
            AttributeValue::Bool(v) => v.hash(state),
            AttributeValue::I64(v) => v.hash(state),
            AttributeValue::F64(v) => v.to_bits().hash(state),
            AttributeValue::StringArray(v) => v.hash(state),
            AttributeValue::BoolArray(v) => v.hash(state),
            AttributeValue::I64Array(v) => v.hash(state),
            AttributeValue::F64Array(v) => {
                v.len().hash(state);
                for x in v {
                    x.to_bits().hash(state);
                }
            },
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(v) => write!(f, "{}", v),
            AttributeValue::Bool(v) => write!(f, "{}", v),
            AttributeValue::I64(v) => write!(f, "{}", v),
            AttributeValue::F64(v) => write!(f, "{}", v),
            AttributeValue::StringArray(v) => write!(f, "{:?}", v),
            AttributeValue::BoolArray(v) => write!(f, "{:?}", v),
            AttributeValue::I64Array(v) => write!(f, "{:?}", v),
            AttributeValue::F64Array(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::String(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::I64(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::F64(v)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::StringArray(v)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(v: Vec<i64>) -> Self {
        AttributeValue::I64Array(v)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(v: Vec<f64>) -> Self {
        AttributeValue::F64Array(v)
    }
}

impl From<Vec<bool>> for AttributeValue {
    fn from(v: Vec<bool>) -> Self {
        AttributeValue::BoolArray(v)
    }
}

/// Immutable, order-independent set of key/value pairs
///
/// Most series carry a handful of attributes, so up to four pairs are kept
/// inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributeSet {
    pairs: SmallVec<[(String, AttributeValue); 4]>,
}

impl AttributeSet {
    /// The empty attribute set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary pairs. Duplicate keys keep the last value.
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        let mut collected: SmallVec<[(String, AttributeValue); 4]> =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

        // Stable sort keeps insertion order among equal keys, so the last
        // occurrence is the one retained below.
        collected.sort_by(|a, b| a.0.cmp(&b.0));
        let mut canonical: SmallVec<[(String, AttributeValue); 4]> =
            SmallVec::with_capacity(collected.len());
        for (key, value) in collected {
            match canonical.last_mut() {
                Some(last) if last.0 == key => last.1 = value,
                _ => canonical.push((key, value)),
            }
        }

        Self { pairs: canonical }
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.pairs
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| &self.pairs[idx].1)
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if the set has no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in canonical (key-sorted) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeSet
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AttributeSet::new(iter)
    }
}

impl Serialize for AttributeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in &self.pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        write!(f, "}}")
    }
}
