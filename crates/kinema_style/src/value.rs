//! Raw property values as supplied in tween descriptors

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A raw descriptor value: a number, a string, a flag or a list of values
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
    Text(String),
    List(Vec<PropertyValue>),
}

/// Property name to raw value, in insertion order
pub type PropertyMap = IndexMap<String, PropertyValue>;

impl PropertyValue {
    /// Items of a list value, or the value itself
    pub fn items(&self) -> Vec<PropertyValue> {
        match self {
            PropertyValue::List(items) => items.clone(),
            other => vec![other.clone()],
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            PropertyValue::Number(n) => *n != 0.0,
            PropertyValue::Bool(b) => *b,
            PropertyValue::Text(s) => !s.is_empty() && s != "false",
            PropertyValue::List(items) => !items.is_empty(),
        }
    }
}

/// CSS text of the value; lists are space separated
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build a [`PropertyMap`] from `(name, value)` pairs
pub fn property_map<K, V, I>(entries: I) -> PropertyMap
where
    K: Into<String>,
    V: Into<PropertyValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
